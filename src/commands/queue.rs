//! Walk-in waitlist and scheduled prebookings.

use chrono::Utc;
use rusqlite::{Connection, Row};

use super::bookings::insert_booking;
use super::quads::load_quad;
use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{
    BookingCreated, CreateBooking, CreatePrebooking, CreateWaitlistEntry, Prebooking,
    PrebookingStatus, SuccessResponse, WaitlistEntry,
};
use crate::pricing::MAX_RIDE_MINUTES;

const PREBOOKING_COLUMNS: &str = "id, quad_id, quad_name, customer_name, customer_phone, \
     duration, price, scheduled_for, status, created_at";

fn waitlist_from_row(row: &Row) -> rusqlite::Result<WaitlistEntry> {
    Ok(WaitlistEntry {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        customer_phone: row.get(2)?,
        duration: row.get(3)?,
        added_at: row.get(4)?,
        notified: row.get(5)?,
    })
}

fn prebooking_from_row(row: &Row) -> rusqlite::Result<Prebooking> {
    Ok(Prebooking {
        id: row.get(0)?,
        quad_id: row.get(1)?,
        quad_name: row.get(2)?,
        customer_name: row.get(3)?,
        customer_phone: row.get(4)?,
        duration: row.get(5)?,
        price: row.get(6)?,
        scheduled_for: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn validate_customer(name: &str, phone: &str, duration: i64) -> AppResult<()> {
    if name.trim().is_empty() || phone.trim().is_empty() {
        return Err(AppError::validation("Name and phone are required"));
    }
    if !(1..=MAX_RIDE_MINUTES).contains(&duration) {
        return Err(AppError::validation(format!(
            "Duration must be between 1 and {MAX_RIDE_MINUTES} minutes"
        )));
    }
    Ok(())
}

// ===== Waitlist =====

pub fn add_to_waitlist(db: &Database, entry: CreateWaitlistEntry) -> AppResult<WaitlistEntry> {
    validate_customer(&entry.customer_name, &entry.customer_phone, entry.duration)?;
    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO waitlist (customer_name, customer_phone, duration, added_at, notified)
         VALUES (?1, ?2, ?3, ?4, 0)",
        rusqlite::params![
            entry.customer_name.trim(),
            entry.customer_phone.trim(),
            entry.duration,
            Utc::now(),
        ],
    )?;

    conn.query_row(
        "SELECT id, customer_name, customer_phone, duration, added_at, notified
         FROM waitlist WHERE id = ?1",
        [conn.last_insert_rowid()],
        waitlist_from_row,
    )
    .map_err(Into::into)
}

/// Oldest first, the order customers are served in.
pub fn get_waitlist(db: &Database) -> AppResult<Vec<WaitlistEntry>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT id, customer_name, customer_phone, duration, added_at, notified
         FROM waitlist ORDER BY added_at, id",
    )?;
    let entries = stmt
        .query_map([], waitlist_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

pub fn notify_waitlist_entry(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("UPDATE waitlist SET notified = 1 WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Waitlist entry not found"));
    }

    Ok(SuccessResponse::ok())
}

pub fn remove_from_waitlist(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("DELETE FROM waitlist WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Waitlist entry not found"));
    }

    Ok(SuccessResponse::ok())
}

// ===== Prebookings =====

fn load_prebooking(conn: &Connection, id: i64) -> AppResult<Prebooking> {
    conn.query_row(
        &format!("SELECT {PREBOOKING_COLUMNS} FROM prebookings WHERE id = ?1"),
        [id],
        prebooking_from_row,
    )
    .or_not_found(|| "Prebooking not found".to_string())
}

fn ensure_open(prebooking: &Prebooking) -> AppResult<()> {
    match prebooking.status {
        PrebookingStatus::Pending | PrebookingStatus::Confirmed => Ok(()),
        other => Err(AppError::conflict(format!("Prebooking is already {other}"))),
    }
}

fn set_prebooking_status(conn: &Connection, id: i64, status: PrebookingStatus) -> AppResult<()> {
    conn.execute(
        "UPDATE prebookings SET status = ?1 WHERE id = ?2",
        rusqlite::params![status, id],
    )?;
    Ok(())
}

pub fn create_prebooking(db: &Database, prebooking: CreatePrebooking) -> AppResult<Prebooking> {
    validate_customer(&prebooking.customer_name, &prebooking.customer_phone, prebooking.duration)?;
    if prebooking.price < 0 {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let now = Utc::now();
    if prebooking.scheduled_for <= now {
        return Err(AppError::validation("Scheduled time must be in the future"));
    }

    let conn = db.lock()?;

    let quad_name = match prebooking.quad_id {
        Some(quad_id) => Some(load_quad(&conn, quad_id)?.name),
        None => None,
    };

    conn.execute(
        "INSERT INTO prebookings (quad_id, quad_name, customer_name, customer_phone, duration,
             price, scheduled_for, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)",
        rusqlite::params![
            prebooking.quad_id,
            quad_name,
            prebooking.customer_name.trim(),
            prebooking.customer_phone.trim(),
            prebooking.duration,
            prebooking.price,
            prebooking.scheduled_for,
            now,
        ],
    )?;

    let created = load_prebooking(&conn, conn.last_insert_rowid())?;
    tracing::info!(prebooking_id = created.id, scheduled_for = %created.scheduled_for, "Prebooking created");
    Ok(created)
}

pub fn get_prebookings(db: &Database) -> AppResult<Vec<Prebooking>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {PREBOOKING_COLUMNS} FROM prebookings ORDER BY scheduled_for, id"
    ))?;
    let prebookings = stmt
        .query_map([], prebooking_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(prebookings)
}

pub fn confirm_prebooking(db: &Database, id: i64) -> AppResult<Prebooking> {
    let conn = db.lock()?;

    let prebooking = load_prebooking(&conn, id)?;
    ensure_open(&prebooking)?;
    set_prebooking_status(&conn, id, PrebookingStatus::Confirmed)?;

    load_prebooking(&conn, id)
}

pub fn cancel_prebooking(db: &Database, id: i64) -> AppResult<Prebooking> {
    let conn = db.lock()?;

    let prebooking = load_prebooking(&conn, id)?;
    ensure_open(&prebooking)?;
    set_prebooking_status(&conn, id, PrebookingStatus::Cancelled)?;

    tracing::info!(prebooking_id = id, "Prebooking cancelled");
    load_prebooking(&conn, id)
}

/// Turns a prebooking into a live ride. `quad_id` overrides the quad chosen
/// at prebooking time and is required when none was chosen.
pub fn convert_prebooking(
    db: &Database,
    id: i64,
    quad_id: Option<i64>,
) -> AppResult<BookingCreated> {
    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let prebooking = load_prebooking(&tx, id)?;
    ensure_open(&prebooking)?;

    let quad_id = quad_id
        .or(prebooking.quad_id)
        .ok_or_else(|| AppError::validation("Choose a quad for this prebooking"))?;

    let created = insert_booking(
        &tx,
        CreateBooking {
            quad_id,
            customer_name: prebooking.customer_name,
            customer_phone: prebooking.customer_phone,
            duration: prebooking.duration,
            price: prebooking.price,
            original_price: Some(prebooking.price),
            ..CreateBooking::default()
        },
        Some(prebooking.scheduled_for),
    )?;
    set_prebooking_status(&tx, id, PrebookingStatus::Converted)?;
    tx.commit()?;

    tracing::info!(prebooking_id = id, booking_id = created.id, "Prebooking converted");
    Ok(created)
}
