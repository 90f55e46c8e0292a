use chrono::Utc;
use rusqlite::{Connection, Row};

use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{CreateStaff, Shift, Staff, SuccessResponse};

const SHIFT_COLUMNS: &str = "id, staff_id, staff_name, start_time, end_time, notes";

fn staff_from_row(row: &Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        pin: row.get(3)?,
        role: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn shift_from_row(row: &Row) -> rusqlite::Result<Shift> {
    Ok(Shift {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        staff_name: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        notes: row.get(5)?,
    })
}

pub(crate) fn load_staff(conn: &Connection, id: i64) -> AppResult<Staff> {
    conn.query_row(
        "SELECT id, name, phone, pin, role, is_active FROM staff WHERE id = ?1",
        [id],
        staff_from_row,
    )
    .or_not_found(|| "Staff member not found".to_string())
}

fn load_shift(conn: &Connection, id: i64) -> AppResult<Shift> {
    conn.query_row(
        &format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"),
        [id],
        shift_from_row,
    )
    .or_not_found(|| "Shift not found".to_string())
}

fn query_shifts(conn: &Connection, filter: &str) -> AppResult<Vec<Shift>> {
    let mut stmt = conn.prepare(&format!("SELECT {SHIFT_COLUMNS} FROM shifts {filter}"))?;
    let shifts = stmt
        .query_map([], shift_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(shifts)
}

pub fn get_staff(db: &Database) -> AppResult<Vec<Staff>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare("SELECT id, name, phone, pin, role, is_active FROM staff ORDER BY name")?;
    let staff = stmt
        .query_map([], staff_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(staff)
}

pub fn create_staff(db: &Database, staff: CreateStaff) -> AppResult<Staff> {
    let name = staff.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if staff.pin.len() < 4 || !staff.pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("PIN must be at least 4 digits"));
    }

    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO staff (name, phone, pin, role, is_active) VALUES (?1, ?2, ?3, ?4, 1)",
        rusqlite::params![name, staff.phone.trim(), staff.pin, staff.role],
    )?;

    load_staff(&conn, conn.last_insert_rowid())
}

pub fn set_staff_active(db: &Database, id: i64, is_active: bool) -> AppResult<Staff> {
    let conn = db.lock()?;

    conn.execute(
        "UPDATE staff SET is_active = ?1 WHERE id = ?2",
        rusqlite::params![is_active, id],
    )?;
    if conn.changes() == 0 {
        return Err(AppError::not_found("Staff member not found"));
    }

    load_staff(&conn, id)
}

pub fn delete_staff(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;

    // Shift history keeps a foreign key to the member
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM shifts WHERE staff_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Err(AppError::conflict(
            "Cannot delete staff member with recorded shifts; deactivate instead",
        ));
    }

    conn.execute("DELETE FROM staff WHERE id = ?1", [id])?;
    if conn.changes() == 0 {
        return Err(AppError::not_found("Staff member not found"));
    }

    Ok(SuccessResponse::ok())
}

pub fn verify_staff_pin(db: &Database, id: i64, pin: &str) -> AppResult<bool> {
    let conn = db.lock()?;
    let staff = load_staff(&conn, id)?;
    Ok(staff.is_active && staff.pin == pin)
}

pub fn start_shift(db: &Database, staff_id: i64, notes: Option<String>) -> AppResult<Shift> {
    let conn = db.lock()?;

    let staff = load_staff(&conn, staff_id)?;
    if !staff.is_active {
        return Err(AppError::conflict("Staff member is inactive"));
    }

    let on_shift: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM shifts WHERE staff_id = ?1 AND end_time IS NULL)",
        [staff_id],
        |row| row.get(0),
    )?;
    if on_shift {
        return Err(AppError::conflict(format!("{} is already on shift", staff.name)));
    }

    conn.execute(
        "INSERT INTO shifts (staff_id, staff_name, start_time, notes) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![staff.id, staff.name, Utc::now(), notes.unwrap_or_default()],
    )?;

    let shift = load_shift(&conn, conn.last_insert_rowid())?;
    tracing::info!(shift_id = shift.id, staff_id, "Shift started");
    Ok(shift)
}

pub fn end_shift(db: &Database, id: i64, notes: Option<String>) -> AppResult<Shift> {
    let conn = db.lock()?;

    let shift = load_shift(&conn, id)?;
    if shift.end_time.is_some() {
        return Err(AppError::conflict("Shift already ended"));
    }

    let notes = notes.unwrap_or(shift.notes);
    conn.execute(
        "UPDATE shifts SET end_time = ?1, notes = ?2 WHERE id = ?3",
        rusqlite::params![Utc::now(), notes, id],
    )?;

    tracing::info!(shift_id = id, staff_id = shift.staff_id, "Shift ended");
    load_shift(&conn, id)
}

pub fn get_shifts(db: &Database) -> AppResult<Vec<Shift>> {
    let conn = db.lock()?;
    query_shifts(&conn, "ORDER BY start_time DESC")
}

pub fn get_open_shifts(db: &Database) -> AppResult<Vec<Shift>> {
    let conn = db.lock()?;
    query_shifts(&conn, "WHERE end_time IS NULL ORDER BY start_time")
}
