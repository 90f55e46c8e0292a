use chrono::{DateTime, Local, SecondsFormat, Utc};

use super::bookings::{get_all_bookings, query_bookings};
use crate::analytics;
use crate::db::Database;
use crate::error::AppResult;
use crate::models::{Booking, CustomerStats, PeakHour, RevenuePoint, SalesData, UtilEntry};

fn completed_bookings(db: &Database) -> AppResult<Vec<Booking>> {
    let conn = db.lock()?;
    query_bookings(&conn, "WHERE status = 'completed' ORDER BY id", [])
}

pub fn get_sales(db: &Database) -> AppResult<SalesData> {
    Ok(analytics::sales_summary(&completed_bookings(db)?, &Local::now()))
}

pub fn get_revenue_chart(db: &Database) -> AppResult<Vec<RevenuePoint>> {
    Ok(analytics::revenue_chart(&completed_bookings(db)?, &Local::now()))
}

pub fn get_peak_hours(db: &Database) -> AppResult<Vec<PeakHour>> {
    Ok(analytics::peak_hours(&completed_bookings(db)?, &Local))
}

pub fn get_quad_utilisation(db: &Database) -> AppResult<Vec<UtilEntry>> {
    Ok(analytics::quad_utilisation(&completed_bookings(db)?))
}

pub fn get_customer_stats(db: &Database) -> AppResult<CustomerStats> {
    Ok(analytics::customer_stats(&completed_bookings(db)?))
}

const CSV_HEADER: &[&str] = &[
    "Receipt",
    "Customer",
    "Phone",
    "Quad",
    "Duration (min)",
    "Original Price",
    "Price",
    "Promo Code",
    "Overtime (min)",
    "Overtime Charge",
    "Deposit",
    "Deposit Returned",
    "Start",
    "End",
    "Status",
    "Rating",
    "Feedback",
];

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

pub fn bookings_to_csv(bookings: &[Booking]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");

    for b in bookings {
        let row = [
            b.receipt_id.clone(),
            b.customer_name.clone(),
            b.customer_phone.clone(),
            b.quad_name.clone(),
            b.duration.to_string(),
            b.original_price.to_string(),
            b.price.to_string(),
            b.promo_code.clone().unwrap_or_default(),
            b.overtime_minutes.to_string(),
            b.overtime_charge.to_string(),
            b.deposit_amount.to_string(),
            if b.deposit_returned { "yes" } else { "no" }.to_string(),
            timestamp(Some(b.start_time)),
            timestamp(b.end_time),
            b.status.to_string(),
            b.rating.map(|r| r.to_string()).unwrap_or_default(),
            b.feedback.clone().unwrap_or_default(),
        ];

        let line: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }

    out
}

pub fn export_bookings_csv(db: &Database) -> AppResult<String> {
    let bookings = get_all_bookings(db)?;
    tracing::info!(rows = bookings.len(), "Exporting bookings");
    Ok(bookings_to_csv(&bookings))
}
