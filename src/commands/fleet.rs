//! Maintenance logs and damage reports.

use chrono::Utc;
use rusqlite::{Connection, Row};

use super::bookings::load_booking;
use super::quads::load_quad;
use super::staff::load_staff;
use crate::db::Database;
use crate::error::{AppError, AppResult, OptionalRow};
use crate::models::{
    CreateDamageReport, CreateMaintenanceLog, DamageReport, FleetCost, MaintenanceLog,
    SuccessResponse,
};

const MAINTENANCE_COLUMNS: &str =
    "id, quad_id, quad_name, type, description, cost, date, operator_id, operator_name";

const DAMAGE_COLUMNS: &str = "id, quad_id, quad_name, booking_id, customer_name, description, \
     photo_url, severity, repair_cost, resolved, date";

fn maintenance_from_row(row: &Row) -> rusqlite::Result<MaintenanceLog> {
    Ok(MaintenanceLog {
        id: row.get(0)?,
        quad_id: row.get(1)?,
        quad_name: row.get(2)?,
        kind: row.get(3)?,
        description: row.get(4)?,
        cost: row.get(5)?,
        date: row.get(6)?,
        operator_id: row.get(7)?,
        operator_name: row.get(8)?,
    })
}

fn damage_from_row(row: &Row) -> rusqlite::Result<DamageReport> {
    Ok(DamageReport {
        id: row.get(0)?,
        quad_id: row.get(1)?,
        quad_name: row.get(2)?,
        booking_id: row.get(3)?,
        customer_name: row.get(4)?,
        description: row.get(5)?,
        photo_url: row.get(6)?,
        severity: row.get(7)?,
        repair_cost: row.get(8)?,
        resolved: row.get(9)?,
        date: row.get(10)?,
    })
}

fn load_damage_report(conn: &Connection, id: i64) -> AppResult<DamageReport> {
    conn.query_row(
        &format!("SELECT {DAMAGE_COLUMNS} FROM damage_reports WHERE id = ?1"),
        [id],
        damage_from_row,
    )
    .or_not_found(|| "Damage report not found".to_string())
}

fn required_description(description: &str) -> AppResult<&str> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    Ok(description)
}

// ===== Maintenance =====

pub fn create_maintenance_log(db: &Database, log: CreateMaintenanceLog) -> AppResult<MaintenanceLog> {
    let description = required_description(&log.description)?;
    if log.cost < 0 {
        return Err(AppError::validation("Cost cannot be negative"));
    }

    let conn = db.lock()?;

    let quad = load_quad(&conn, log.quad_id)?;
    let operator_name = match log.operator_id {
        Some(operator_id) => Some(load_staff(&conn, operator_id)?.name),
        None => None,
    };

    conn.execute(
        "INSERT INTO maintenance_logs (quad_id, quad_name, type, description, cost, date,
             operator_id, operator_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            quad.id,
            quad.name,
            log.kind,
            description,
            log.cost,
            Utc::now(),
            log.operator_id,
            operator_name,
        ],
    )?;

    let id = conn.last_insert_rowid();
    tracing::info!(log_id = id, quad_id = quad.id, kind = %log.kind, cost = log.cost, "Maintenance logged");

    conn.query_row(
        &format!("SELECT {MAINTENANCE_COLUMNS} FROM maintenance_logs WHERE id = ?1"),
        [id],
        maintenance_from_row,
    )
    .map_err(Into::into)
}

/// Newest first, optionally for one quad.
pub fn get_maintenance_logs(db: &Database, quad_id: Option<i64>) -> AppResult<Vec<MaintenanceLog>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {MAINTENANCE_COLUMNS} FROM maintenance_logs
         WHERE ?1 IS NULL OR quad_id = ?1
         ORDER BY date DESC, id DESC"
    ))?;
    let logs = stmt
        .query_map([quad_id], maintenance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(logs)
}

pub fn delete_maintenance_log(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("DELETE FROM maintenance_logs WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Maintenance log not found"));
    }

    Ok(SuccessResponse::ok())
}

// ===== Damage =====

pub fn create_damage_report(db: &Database, report: CreateDamageReport) -> AppResult<DamageReport> {
    let description = required_description(&report.description)?;
    if report.repair_cost < 0 {
        return Err(AppError::validation("Repair cost cannot be negative"));
    }

    let conn = db.lock()?;

    let quad = load_quad(&conn, report.quad_id)?;

    let mut customer_name = report.customer_name.filter(|n| !n.trim().is_empty());
    if let Some(booking_id) = report.booking_id {
        let booking = load_booking(&conn, booking_id)?;
        if booking.quad_id != quad.id {
            return Err(AppError::validation(format!(
                "Booking {booking_id} was not a ride on {}",
                quad.name
            )));
        }
        customer_name.get_or_insert(booking.customer_name);
    }

    conn.execute(
        "INSERT INTO damage_reports (quad_id, quad_name, booking_id, customer_name, description,
             photo_url, severity, repair_cost, resolved, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
        rusqlite::params![
            quad.id,
            quad.name,
            report.booking_id,
            customer_name,
            description,
            report.photo_url,
            report.severity,
            report.repair_cost,
            Utc::now(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    tracing::warn!(report_id = id, quad_id = quad.id, severity = %report.severity, "Damage reported");

    load_damage_report(&conn, id)
}

pub fn get_damage_reports(db: &Database) -> AppResult<Vec<DamageReport>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {DAMAGE_COLUMNS} FROM damage_reports ORDER BY resolved, date DESC, id DESC"
    ))?;
    let reports = stmt
        .query_map([], damage_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(reports)
}

pub fn resolve_damage_report(db: &Database, id: i64) -> AppResult<DamageReport> {
    let conn = db.lock()?;
    conn.execute("UPDATE damage_reports SET resolved = 1 WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Damage report not found"));
    }

    load_damage_report(&conn, id)
}

pub fn delete_damage_report(db: &Database, id: i64) -> AppResult<SuccessResponse> {
    let conn = db.lock()?;
    conn.execute("DELETE FROM damage_reports WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::not_found("Damage report not found"));
    }

    Ok(SuccessResponse::ok())
}

/// Maintenance plus repair spend per quad name, highest first.
pub fn get_fleet_costs(db: &Database) -> AppResult<Vec<FleetCost>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT quad_name, SUM(maintenance), SUM(repair) FROM (
             SELECT quad_name, cost AS maintenance, 0 AS repair FROM maintenance_logs
             UNION ALL
             SELECT quad_name, 0, repair_cost FROM damage_reports
         )
         GROUP BY quad_name
         ORDER BY SUM(maintenance) + SUM(repair) DESC, quad_name",
    )?;

    let costs = stmt
        .query_map([], |row| {
            let maintenance_cost: i64 = row.get(1)?;
            let repair_cost: i64 = row.get(2)?;
            Ok(FleetCost {
                quad_name: row.get(0)?,
                maintenance_cost,
                repair_cost,
                total_cost: maintenance_cost + repair_cost,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(costs)
}
