use rusqlite::{Connection, Row};

use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{CreatePromotion, PriceQuote, Promotion, SuccessResponse};
use crate::pricing::{discounted_price, price_for_duration};

fn promotion_from_row(row: &Row) -> rusqlite::Result<Promotion> {
    Ok(Promotion {
        id: row.get(0)?,
        code: row.get(1)?,
        discount_percentage: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn find_active(conn: &Connection, code: &str) -> AppResult<Promotion> {
    conn.query_row(
        "SELECT id, code, discount_percentage, is_active FROM promotions
         WHERE code = ?1 AND is_active = 1",
        [normalize_code(code)],
        promotion_from_row,
    )
    .or_not_found(|| "Invalid or inactive promo code".to_string())
}

/// Newest first.
pub fn get_promotions(db: &Database) -> AppResult<Vec<Promotion>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT id, code, discount_percentage, is_active FROM promotions ORDER BY id DESC",
    )?;
    let promotions = stmt
        .query_map([], promotion_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(promotions)
}

pub fn create_promotion(db: &Database, promotion: CreatePromotion) -> AppResult<Promotion> {
    let code = normalize_code(&promotion.code);
    if code.is_empty() {
        return Err(AppError::validation("Code is required"));
    }
    if !(1..=100).contains(&promotion.discount_percentage) {
        return Err(AppError::validation("Discount must be 1-100%"));
    }

    let conn = db.lock()?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM promotions WHERE code = ?1)",
        [&code],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AppError::conflict("Promo code already exists"));
    }

    conn.execute(
        "INSERT INTO promotions (code, discount_percentage, is_active) VALUES (?1, ?2, 1)",
        rusqlite::params![code, promotion.discount_percentage],
    )?;

    tracing::info!(%code, discount = promotion.discount_percentage, "Promotion created");

    Ok(Promotion {
        id: conn.last_insert_rowid(),
        code,
        discount_percentage: promotion.discount_percentage,
        is_active: 1,
    })
}

/// Case-insensitive; only active codes match.
pub fn validate_promotion(db: &Database, code: &str) -> AppResult<Promotion> {
    let conn = db.lock()?;
    find_active(&conn, code)
}

pub fn toggle_promotion(db: &Database, id: i64, is_active: bool) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute(
        "UPDATE promotions SET is_active = ?1 WHERE id = ?2",
        rusqlite::params![is_active as i64, id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Promotion not found"));
    }

    Ok(SuccessResponse::ok())
}

pub fn delete_promotion(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("DELETE FROM promotions WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Promotion not found"));
    }

    Ok(SuccessResponse::ok())
}

/// Prices a standard ride, applying an optional promo code.
pub fn quote(db: &Database, duration: i64, promo_code: Option<&str>) -> AppResult<PriceQuote> {
    let original_price = price_for_duration(duration)
        .ok_or_else(|| AppError::validation(format!("No price for a {duration} minute ride")))?;

    let promo = match promo_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let conn = db.lock()?;
            Some(find_active(&conn, code)?)
        }
        None => None,
    };

    let discount_percentage = promo.as_ref().map_or(0, |p| p.discount_percentage);

    Ok(PriceQuote {
        duration,
        original_price,
        discount_percentage,
        price: discounted_price(original_price, discount_percentage),
        promo_code: promo.map(|p| p.code),
    })
}
