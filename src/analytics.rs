//! Derived reports over the booking collection.
//!
//! Everything here is recomputed from scratch on each call. Only completed
//! bookings are counted. Calendar-day boundaries follow the timezone of the
//! `now` argument (callers pass `Local::now()`).

use chrono::{DateTime, Days, Duration, TimeZone, Timelike, Utc};
use std::collections::HashMap;

use crate::models::{
    Booking, BookingStatus, CustomerStats, PeakHour, RevenuePoint, SalesData, UtilEntry,
};

fn completed(bookings: &[Booking]) -> impl Iterator<Item = &Booking> {
    bookings.iter().filter(|b| b.status == BookingStatus::Completed)
}

fn gross(b: &Booking) -> i64 {
    b.price + b.overtime_charge
}

pub fn sales_summary<Tz: TimeZone>(bookings: &[Booking], now: &DateTime<Tz>) -> SalesData {
    let tz = now.timezone();
    let today = now.date_naive();
    let week_start = (now.clone() - Duration::days(7)).with_timezone(&Utc);
    let month_start = (now.clone() - Duration::days(30)).with_timezone(&Utc);

    let mut sales = SalesData::default();
    for b in completed(bookings) {
        sales.total += gross(b);
        sales.overtime_revenue += b.overtime_charge;

        let Some(end) = b.end_time else { continue };
        if end.with_timezone(&tz).date_naive() == today {
            sales.today += gross(b);
        }
        if end >= week_start {
            sales.this_week += gross(b);
        }
        if end >= month_start {
            sales.this_month += gross(b);
        }
    }
    sales
}

/// Last seven calendar days, oldest first, bucketed by end date.
pub fn revenue_chart<Tz: TimeZone>(bookings: &[Booking], now: &DateTime<Tz>) -> Vec<RevenuePoint> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..7u64)
        .rev()
        .map(|back| {
            let day = today - Days::new(back);
            let (revenue, rides) = completed(bookings)
                .filter(|b| {
                    b.end_time
                        .is_some_and(|end| end.with_timezone(&tz).date_naive() == day)
                })
                .fold((0, 0), |(revenue, rides), b| (revenue + gross(b), rides + 1));

            RevenuePoint {
                date: day.format("%Y-%m-%d").to_string(),
                revenue,
                rides,
            }
        })
        .collect()
}

/// 24 buckets keyed by the hour the ride started.
pub fn peak_hours<Tz: TimeZone>(bookings: &[Booking], tz: &Tz) -> Vec<PeakHour> {
    let mut counts = [0i64; 24];
    for b in completed(bookings) {
        counts[b.start_time.with_timezone(tz).hour() as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| PeakHour {
            hour: hour as u32,
            count,
        })
        .collect()
}

/// Per quad name as stored on the booking; revenue excludes overtime.
pub fn quad_utilisation(bookings: &[Booking]) -> Vec<UtilEntry> {
    let mut entries: Vec<UtilEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for b in completed(bookings) {
        let i = *index.entry(b.quad_name.as_str()).or_insert_with(|| {
            entries.push(UtilEntry {
                quad_name: b.quad_name.clone(),
                rides: 0,
                revenue: 0,
                total_mins: 0,
            });
            entries.len() - 1
        });

        let entry = &mut entries[i];
        entry.rides += 1;
        entry.revenue += b.price;
        entry.total_mins += b.duration;
    }

    entries.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    entries
}

pub fn customer_stats(bookings: &[Booking]) -> CustomerStats {
    struct Customer<'a> {
        name: &'a str,
        rides: i64,
        spent: i64,
    }

    let mut customers: Vec<Customer> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for b in completed(bookings) {
        let i = *index.entry(b.customer_phone.as_str()).or_insert_with(|| {
            customers.push(Customer {
                name: &b.customer_name,
                rides: 0,
                spent: 0,
            });
            customers.len() - 1
        });
        customers[i].rides += 1;
        customers[i].spent += b.price;
    }

    let mut stats = CustomerStats {
        total: customers.len() as i64,
        returning: customers.iter().filter(|c| c.rides > 1).count() as i64,
        ..CustomerStats::default()
    };

    // First customer wins a tie
    if let Some(top) = customers
        .iter()
        .fold(None::<&Customer>, |best, c| match best {
            Some(b) if b.spent >= c.spent => Some(b),
            _ => Some(c),
        })
    {
        stats.top_spender = top.name.to_string();
        stats.top_amount = top.spent;
    }

    stats
}
