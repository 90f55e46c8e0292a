use rusqlite::{Connection, Row};

use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{CreateQuad, Quad, QuadStatus, SuccessResponse, UpdateQuad};

const QUAD_COLUMNS: &str = "id, name, status, image_url, imei";

fn quad_from_row(row: &Row) -> rusqlite::Result<Quad> {
    Ok(Quad {
        id: row.get(0)?,
        name: row.get(1)?,
        status: row.get(2)?,
        image_url: row.get(3)?,
        imei: row.get(4)?,
    })
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    Ok(name.to_string())
}

pub(crate) fn parse_status(status: &str) -> AppResult<QuadStatus> {
    status
        .parse()
        .map_err(|_| AppError::validation("Invalid status"))
}

/// Resets quads flagged `rented` that no active booking references.
pub(crate) fn heal_fleet(conn: &Connection) -> AppResult<usize> {
    let healed = conn.execute(
        "UPDATE quads SET status = 'available'
         WHERE status = 'rented'
           AND id NOT IN (SELECT quad_id FROM bookings WHERE status = 'active')",
        [],
    )?;

    if healed > 0 {
        tracing::warn!(healed, "Reset orphaned rented quads to available");
    }
    Ok(healed)
}

pub(crate) fn load_quad(conn: &Connection, id: i64) -> AppResult<Quad> {
    conn.query_row(
        &format!("SELECT {QUAD_COLUMNS} FROM quads WHERE id = ?1"),
        [id],
        quad_from_row,
    )
    .or_not_found(|| "Quad not found".to_string())
}

pub(crate) fn set_status(conn: &Connection, id: i64, status: QuadStatus) -> AppResult<()> {
    conn.execute(
        "UPDATE quads SET status = ?1 WHERE id = ?2",
        rusqlite::params![status, id],
    )?;
    Ok(())
}

/// Every read of the fleet heals orphaned rentals first.
pub fn get_quads(db: &Database) -> AppResult<Vec<Quad>> {
    let conn = db.lock()?;
    heal_fleet(&conn)?;

    let mut stmt = conn.prepare(&format!("SELECT {QUAD_COLUMNS} FROM quads ORDER BY id"))?;
    let quads = stmt
        .query_map([], quad_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(quads)
}

pub fn get_quad(db: &Database, id: i64) -> AppResult<Quad> {
    let conn = db.lock()?;
    heal_fleet(&conn)?;
    load_quad(&conn, id)
}

pub fn create_quad(db: &Database, quad: CreateQuad) -> AppResult<Quad> {
    let name = required_name(&quad.name)?;
    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO quads (name, status, image_url, imei) VALUES (?1, 'available', ?2, ?3)",
        rusqlite::params![name, blank_to_none(quad.image_url), blank_to_none(quad.imei)],
    )?;

    let quad = load_quad(&conn, conn.last_insert_rowid())?;
    tracing::info!(quad_id = quad.id, name = %quad.name, "Quad added to fleet");
    Ok(quad)
}

pub fn update_quad(db: &Database, id: i64, quad: UpdateQuad) -> AppResult<Quad> {
    let name = required_name(&quad.name)?;
    let status = parse_status(&quad.status)?;
    let conn = db.lock()?;

    conn.execute(
        "UPDATE quads SET name = ?1, status = ?2, image_url = ?3, imei = ?4 WHERE id = ?5",
        rusqlite::params![name, status, blank_to_none(quad.image_url), blank_to_none(quad.imei), id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Quad not found"));
    }

    load_quad(&conn, id)
}

/// Manual override: no check against booking state. A forced `rented` with
/// no active booking is undone by the next heal.
pub fn update_quad_status(db: &Database, id: i64, status: &str) -> AppResult<SuccessResponse> {
    let status = parse_status(status)?;
    let conn = db.lock()?;

    set_status(&conn, id, status)?;
    if conn.changes() == 0 {
        return Err(AppError::not_found("Quad not found"));
    }

    tracing::info!(quad_id = id, %status, "Quad status overridden");
    Ok(SuccessResponse::ok())
}
