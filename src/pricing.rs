use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};

/// KES per whole minute past the booked end of a ride
pub const OVERTIME_RATE: i64 = 100;

/// Longest ride a booking or prebooking may reserve
pub const MAX_RIDE_MINUTES: i64 = 24 * 60;

/// Upper bound on overtime recorded when a ride is completed
pub const MAX_OVERTIME_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTier {
    pub duration: i64,
    pub price: i64,
    pub label: &'static str,
}

/// Standard ride prices (minutes → KES).
pub const PRICING: &[PriceTier] = &[
    PriceTier { duration: 5, price: 1000, label: "5 min" },
    PriceTier { duration: 10, price: 1800, label: "10 min" },
    PriceTier { duration: 15, price: 2200, label: "15 min" },
    PriceTier { duration: 20, price: 2500, label: "20 min" },
    PriceTier { duration: 30, price: 3500, label: "30 min" },
    PriceTier { duration: 60, price: 6000, label: "1 hour" },
];

pub fn price_for_duration(duration: i64) -> Option<i64> {
    PRICING.iter().find(|t| t.duration == duration).map(|t| t.price)
}

/// `round(original * (1 - discount / 100))`, halves rounding up.
pub fn discounted_price(original_price: i64, discount_percentage: i64) -> i64 {
    if discount_percentage == 0 {
        return original_price;
    }
    let factor = 1.0 - discount_percentage as f64 / 100.0;
    (original_price as f64 * factor + 0.5).floor() as i64
}

pub fn overtime_charge(overtime_minutes: i64) -> AppResult<i64> {
    overtime_minutes
        .checked_mul(OVERTIME_RATE)
        .ok_or_else(|| AppError::validation("Overtime minutes out of range"))
}

pub fn ride_end(start_time: DateTime<Utc>, duration: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_minutes(duration)
        .and_then(|d| start_time.checked_add_signed(d))
        .ok_or_else(|| AppError::validation("Ride duration out of range"))
}

/// Whole minutes elapsed past the booked end of a ride, never negative.
pub fn overtime_minutes(
    start_time: DateTime<Utc>,
    duration: i64,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    Ok((now - ride_end(start_time, duration)?).num_minutes().max(0))
}
