use rusqlite::Connection;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::SuccessResponse;

fn stored_pin(conn: &Connection) -> AppResult<String> {
    conn.query_row("SELECT value FROM settings WHERE key = 'admin_pin'", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Plain string comparison against the stored PIN.
pub fn verify_admin_pin(db: &Database, pin: &str) -> AppResult<bool> {
    let conn = db.lock()?;
    Ok(stored_pin(&conn)? == pin)
}

pub fn change_admin_pin(db: &Database, current_pin: &str, new_pin: &str) -> AppResult<SuccessResponse> {
    if !(4..=8).contains(&new_pin.len()) || !new_pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("PIN must be 4-8 digits"));
    }

    let conn = db.lock()?;
    if stored_pin(&conn)? != current_pin {
        return Err(AppError::unauthorized("Current PIN is incorrect"));
    }

    conn.execute(
        "UPDATE settings SET value = ?1 WHERE key = 'admin_pin'",
        [new_pin],
    )?;

    tracing::info!("Admin PIN changed");
    Ok(SuccessResponse::ok())
}
