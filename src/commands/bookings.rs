use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{Connection, Params, Row};

use super::quads::{heal_fleet, load_quad, set_status};
use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{
    Booking, BookingCompleted, BookingCreated, BookingStatus, CreateBooking, QuadStatus,
    RideStatus, SuccessResponse,
};
use crate::pricing::{overtime_charge, ride_end, MAX_OVERTIME_MINUTES, MAX_RIDE_MINUTES};

pub(crate) const BOOKING_COLUMNS: &str = "id, quad_id, user_id, customer_name, customer_phone, \
     duration, price, original_price, promo_code, start_time, end_time, status, receipt_id, \
     rating, feedback, quad_name, quad_image_url, quad_imei, is_prebooked, prebook_time, \
     group_size, id_photo_url, waiver_signed, waiver_signed_at, deposit_amount, \
     deposit_returned, operator_id, overtime_minutes, overtime_charge";

const RECEIPT_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RECEIPT_ATTEMPTS: usize = 8;

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        quad_id: row.get(1)?,
        user_id: row.get(2)?,
        customer_name: row.get(3)?,
        customer_phone: row.get(4)?,
        duration: row.get(5)?,
        price: row.get(6)?,
        original_price: row.get(7)?,
        promo_code: row.get(8)?,
        start_time: row.get(9)?,
        end_time: row.get(10)?,
        status: row.get(11)?,
        receipt_id: row.get(12)?,
        rating: row.get(13)?,
        feedback: row.get(14)?,
        quad_name: row.get(15)?,
        quad_image_url: row.get(16)?,
        quad_imei: row.get(17)?,
        is_prebooked: row.get(18)?,
        prebook_time: row.get(19)?,
        group_size: row.get(20)?,
        id_photo_url: row.get(21)?,
        waiver_signed: row.get(22)?,
        waiver_signed_at: row.get(23)?,
        deposit_amount: row.get(24)?,
        deposit_returned: row.get(25)?,
        operator_id: row.get(26)?,
        overtime_minutes: row.get(27)?,
        overtime_charge: row.get(28)?,
    })
}

pub(crate) fn query_bookings<P: Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> AppResult<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings {filter}"))?;
    let bookings = stmt
        .query_map(params, booking_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bookings)
}

pub(crate) fn load_booking(conn: &Connection, id: i64) -> AppResult<Booking> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        [id],
        booking_from_row,
    )
    .or_not_found(|| "Booking not found".to_string())
}

/// `RQ-` followed by six random base36 characters.
pub fn generate_receipt_id() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..6)
        .map(|_| RECEIPT_ALPHABET[rng.gen_range(0..RECEIPT_ALPHABET.len())] as char)
        .collect();
    format!("RQ-{code}")
}

fn unused_receipt_id(conn: &Connection) -> AppResult<String> {
    for _ in 0..RECEIPT_ATTEMPTS {
        let candidate = generate_receipt_id();
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE receipt_id = ?1)",
            [&candidate],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal("Could not allocate a unique receipt id".into()))
}

fn validate_new_booking(booking: &CreateBooking) -> AppResult<()> {
    if booking.customer_name.trim().is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }
    if booking.customer_phone.trim().is_empty() {
        return Err(AppError::validation("Customer phone is required"));
    }
    if !(1..=MAX_RIDE_MINUTES).contains(&booking.duration) {
        return Err(AppError::validation(format!(
            "Duration must be between 1 and {MAX_RIDE_MINUTES} minutes"
        )));
    }
    if booking.price < 0 || booking.original_price.is_some_and(|p| p < 0) {
        return Err(AppError::validation("Price cannot be negative"));
    }
    if booking.group_size.is_some_and(|g| g < 1) {
        return Err(AppError::validation("Group size must be at least 1"));
    }
    if booking.deposit_amount.is_some_and(|d| d < 0) {
        return Err(AppError::validation("Deposit cannot be negative"));
    }
    Ok(())
}

/// Inserts an active booking and marks its quad rented. Callers run this
/// inside a transaction.
pub(crate) fn insert_booking(
    conn: &Connection,
    booking: CreateBooking,
    prebook_time: Option<DateTime<Utc>>,
) -> AppResult<BookingCreated> {
    validate_new_booking(&booking)?;

    heal_fleet(conn)?;
    let quad = load_quad(conn, booking.quad_id)?;
    if quad.status != QuadStatus::Available {
        return Err(AppError::conflict("Quad is not available"));
    }

    if let Some(user_id) = booking.user_id {
        conn.query_row("SELECT id FROM users WHERE id = ?1", [user_id], |row| {
            row.get::<_, i64>(0)
        })
        .or_not_found(|| "User not found".to_string())?;
    }

    let receipt_id = unused_receipt_id(conn)?;
    let start_time = Utc::now();
    let promo_code = booking
        .promo_code
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    conn.execute(
        "INSERT INTO bookings (quad_id, user_id, customer_name, customer_phone, duration, price,
             original_price, promo_code, start_time, status, receipt_id, quad_name, quad_image_url,
             quad_imei, is_prebooked, prebook_time, group_size, id_photo_url, waiver_signed,
             waiver_signed_at, deposit_amount, operator_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'active', ?10, ?11, ?12, ?13, ?14, ?15, ?16,
             ?17, ?18, ?19, ?20, ?21)",
        rusqlite::params![
            quad.id,
            booking.user_id,
            booking.customer_name.trim(),
            booking.customer_phone.trim(),
            booking.duration,
            booking.price,
            booking.original_price.unwrap_or(booking.price),
            promo_code,
            start_time,
            receipt_id,
            quad.name,
            quad.image_url,
            quad.imei,
            prebook_time.is_some(),
            prebook_time,
            booking.group_size.unwrap_or(1),
            booking.id_photo_url,
            booking.waiver_signed,
            booking.waiver_signed.then_some(start_time),
            booking.deposit_amount.unwrap_or(0),
            booking.operator_id,
        ],
    )?;

    let id = conn.last_insert_rowid();
    set_status(conn, quad.id, QuadStatus::Rented)?;

    tracing::info!(
        booking_id = id,
        quad_id = quad.id,
        %receipt_id,
        duration = booking.duration,
        price = booking.price,
        "Booking created"
    );

    Ok(BookingCreated {
        id,
        receipt_id,
        start_time,
    })
}

pub fn create_booking(db: &Database, booking: CreateBooking) -> AppResult<BookingCreated> {
    let mut conn = db.lock()?;
    let tx = conn.transaction()?;
    let created = insert_booking(&tx, booking, None)?;
    tx.commit()?;
    Ok(created)
}

/// Closes an active ride. The quad goes back to `available` even if it was
/// moved to maintenance in the meantime.
pub fn complete_booking(
    db: &Database,
    id: i64,
    overtime_minutes: i64,
) -> AppResult<BookingCompleted> {
    if !(0..=MAX_OVERTIME_MINUTES).contains(&overtime_minutes) {
        return Err(AppError::validation(format!(
            "Overtime must be between 0 and {MAX_OVERTIME_MINUTES} minutes"
        )));
    }

    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let booking = load_booking(&tx, id)?;
    if booking.status == BookingStatus::Completed {
        return Err(AppError::conflict("Booking already completed"));
    }

    let end_time = Utc::now();
    let charge = overtime_charge(overtime_minutes)?;

    tx.execute(
        "UPDATE bookings SET status = 'completed', end_time = ?1, overtime_minutes = ?2,
             overtime_charge = ?3
         WHERE id = ?4",
        rusqlite::params![end_time, overtime_minutes, charge, id],
    )?;
    set_status(&tx, booking.quad_id, QuadStatus::Available)?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        quad_id = booking.quad_id,
        overtime_minutes,
        overtime_charge = charge,
        "Booking completed"
    );

    Ok(BookingCompleted {
        success: true,
        end_time,
    })
}

pub fn submit_feedback(
    db: &Database,
    id: i64,
    rating: i64,
    feedback: Option<String>,
) -> AppResult<SuccessResponse> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::validation("Valid rating (1-5) is required"));
    }

    let conn = db.lock()?;
    conn.execute(
        "UPDATE bookings SET rating = ?1, feedback = ?2 WHERE id = ?3",
        rusqlite::params![rating, feedback.filter(|f| !f.trim().is_empty()), id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Booking not found"));
    }

    Ok(SuccessResponse::ok())
}

pub fn return_deposit(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("UPDATE bookings SET deposit_returned = 1 WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Booking not found"));
    }

    tracing::info!(booking_id = id, "Deposit returned");
    Ok(SuccessResponse::ok())
}

pub fn sign_waiver(db: &Database, id: i64) -> AppResult<Booking> {
    let conn = db.lock()?;

    let booking = load_booking(&conn, id)?;
    if booking.status == BookingStatus::Completed {
        return Err(AppError::conflict("Cannot sign a waiver for a completed ride"));
    }

    conn.execute(
        "UPDATE bookings SET waiver_signed = 1, waiver_signed_at = ?1 WHERE id = ?2",
        rusqlite::params![Utc::now(), id],
    )?;

    load_booking(&conn, id)
}

pub fn get_booking(db: &Database, id: i64) -> AppResult<Booking> {
    let conn = db.lock()?;
    load_booking(&conn, id)
}

pub fn get_booking_by_receipt(db: &Database, receipt_id: &str) -> AppResult<Booking> {
    let conn = db.lock()?;
    query_bookings(
        &conn,
        "WHERE receipt_id = ?1",
        [receipt_id.trim().to_uppercase()],
    )?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::not_found("Receipt not found"))
}

pub fn get_active_bookings(db: &Database) -> AppResult<Vec<Booking>> {
    let conn = db.lock()?;
    query_bookings(&conn, "WHERE status = 'active' ORDER BY start_time", [])
}

pub fn get_booking_history(db: &Database) -> AppResult<Vec<Booking>> {
    let conn = db.lock()?;
    query_bookings(&conn, "WHERE status = 'completed' ORDER BY end_time DESC", [])
}

pub fn get_all_bookings(db: &Database) -> AppResult<Vec<Booking>> {
    let conn = db.lock()?;
    query_bookings(&conn, "ORDER BY id", [])
}

pub fn get_user_history(db: &Database, user_id: i64) -> AppResult<Vec<Booking>> {
    let conn = db.lock()?;
    query_bookings(&conn, "WHERE user_id = ?1 ORDER BY id DESC", [user_id])
}

pub fn ride_status_at(booking: &Booking, now: DateTime<Utc>) -> AppResult<RideStatus> {
    let ends_at = ride_end(booking.start_time, booking.duration)?;
    let remaining_seconds = (ends_at - now).num_seconds().max(0);
    let overtime_seconds = (now - ends_at).num_seconds().max(0);
    let overtime_minutes = overtime_seconds / 60;

    Ok(RideStatus {
        booking_id: booking.id,
        ends_at,
        remaining_seconds,
        overtime_seconds,
        overtime_minutes,
        projected_overtime_charge: overtime_charge(overtime_minutes)?,
    })
}

pub fn get_ride_status(db: &Database, id: i64) -> AppResult<RideStatus> {
    let booking = get_booking(db, id)?;
    if booking.status == BookingStatus::Completed {
        return Err(AppError::conflict("Ride already completed"));
    }
    ride_status_at(&booking, Utc::now())
}
