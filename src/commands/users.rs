use regex::Regex;
use rusqlite::Row;
use std::sync::OnceLock;

use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{RegisterUser, User, UserRole};

/// Kenyan mobile numbers: 07xx/01xx local format or +254 prefix.
fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:0|\+?254)[17]\d{8}$").expect("valid phone regex"))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        role: row.get(3)?,
    })
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone.trim())
}

pub fn register(db: &Database, user: RegisterUser) -> AppResult<User> {
    let name = user.name.trim();
    let phone = user.phone.trim();

    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if phone.is_empty() {
        return Err(AppError::validation("Phone is required"));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::validation("Enter a valid phone number, e.g. 0712345678"));
    }
    if user.password.chars().count() < 4 {
        return Err(AppError::validation("Password must be at least 4 characters"));
    }

    let conn = db.lock()?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE phone = ?1)",
        [phone],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AppError::conflict("Phone number already registered"));
    }

    // Stored as given; compared by plain equality in `login`
    conn.execute(
        "INSERT INTO users (name, phone, password, role) VALUES (?1, ?2, ?3, 'user')",
        rusqlite::params![name, phone, user.password],
    )?;

    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, "User registered");

    Ok(User {
        id,
        name: name.to_string(),
        phone: phone.to_string(),
        role: UserRole::User,
    })
}

pub fn login(db: &Database, phone: &str, password: &str) -> AppResult<User> {
    let conn = db.lock()?;

    conn.query_row(
        "SELECT id, name, phone, role FROM users WHERE phone = ?1 AND password = ?2",
        rusqlite::params![phone.trim(), password],
        user_from_row,
    )
    .or_not_found(String::new)
    .map_err(|e| match e {
        AppError::NotFound(_) => AppError::unauthorized("Invalid phone number or password"),
        other => other,
    })
}

pub fn get_user(db: &Database, id: i64) -> AppResult<User> {
    let conn = db.lock()?;

    conn.query_row(
        "SELECT id, name, phone, role FROM users WHERE id = ?1",
        [id],
        user_from_row,
    )
    .or_not_found(|| "User not found".to_string())
}
