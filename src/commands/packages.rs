use rusqlite::Row;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{CreatePackage, Package, SuccessResponse};

fn package_from_row(row: &Row) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        rides: row.get(3)?,
        price: row.get(4)?,
        is_active: row.get(5)?,
    })
}

pub fn get_packages(db: &Database) -> AppResult<Vec<Package>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT id, name, description, rides, price, is_active FROM packages ORDER BY price",
    )?;
    let packages = stmt
        .query_map([], package_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(packages)
}

pub fn create_package(db: &Database, package: CreatePackage) -> AppResult<Package> {
    let name = package.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if package.rides < 1 {
        return Err(AppError::validation("A package must include at least one ride"));
    }
    if package.price < 0 {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO packages (name, description, rides, price, is_active) VALUES (?1, ?2, ?3, ?4, 1)",
        rusqlite::params![name, package.description.trim(), package.rides, package.price],
    )?;

    Ok(Package {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: package.description.trim().to_string(),
        rides: package.rides,
        price: package.price,
        is_active: 1,
    })
}

pub fn toggle_package(db: &Database, id: i64, is_active: bool) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute(
        "UPDATE packages SET is_active = ?1 WHERE id = ?2",
        rusqlite::params![is_active as i64, id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Package not found"));
    }

    Ok(SuccessResponse::ok())
}

pub fn delete_package(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("DELETE FROM packages WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Package not found"));
    }

    Ok(SuccessResponse::ok())
}
