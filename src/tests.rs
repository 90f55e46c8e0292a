//! Tests for the rental domain operations and the HTTP binding.
//! Each test runs against its own in-memory SQLite database.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use regex::Regex;
    use std::collections::HashSet;

    use crate::analytics;
    use crate::commands::{
        bookings, fleet, packages, promotions, quads, queue, reports, settings, staff, users,
    };
    use crate::db::Database;
    use crate::error::AppError;
    use crate::models::*;
    use crate::pricing::{self, OVERTIME_RATE};

    /// Create a test database with schema and the default fleet
    fn setup_test_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to create schema");
        db
    }

    fn new_booking(quad_id: i64, price: i64) -> CreateBooking {
        CreateBooking {
            quad_id,
            customer_name: "Wanjiku".to_string(),
            customer_phone: "0712345678".to_string(),
            duration: 15,
            price,
            original_price: Some(price),
            ..CreateBooking::default()
        }
    }

    fn quad_status(db: &Database, id: i64) -> QuadStatus {
        quads::get_quad(db, id).unwrap().status
    }

    /// A completed booking built in memory, for the pure report functions
    fn completed_booking(
        id: i64,
        quad_name: &str,
        customer: (&str, &str),
        price: i64,
        overtime_charge: i64,
        start: DateTime<Utc>,
    ) -> Booking {
        Booking {
            id,
            quad_id: 1,
            user_id: None,
            customer_name: customer.0.to_string(),
            customer_phone: customer.1.to_string(),
            duration: 15,
            price,
            original_price: price,
            promo_code: None,
            start_time: start,
            end_time: Some(start + Duration::minutes(15)),
            status: BookingStatus::Completed,
            receipt_id: format!("RQ-TEST{id:02}"),
            rating: None,
            feedback: None,
            quad_name: quad_name.to_string(),
            quad_image_url: None,
            quad_imei: None,
            is_prebooked: false,
            prebook_time: None,
            group_size: 1,
            id_photo_url: None,
            waiver_signed: false,
            waiver_signed_at: None,
            deposit_amount: 0,
            deposit_returned: false,
            operator_id: None,
            overtime_minutes: overtime_charge / OVERTIME_RATE,
            overtime_charge,
        }
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    // ===== QUAD TESTS =====

    #[test]
    fn test_default_fleet_is_seeded() {
        let db = setup_test_db();

        let fleet = quads::get_quads(&db).unwrap();
        assert_eq!(fleet.len(), 5);
        assert_eq!(fleet[0].name, "Quad 1");
        assert!(fleet.iter().all(|q| q.status == QuadStatus::Available));

        // Initializing again must not reseed
        db.initialize().unwrap();
        assert_eq!(quads::get_quads(&db).unwrap().len(), 5);
    }

    #[test]
    fn test_create_quad_requires_name() {
        let db = setup_test_db();

        let err = quads::create_quad(&db, CreateQuad { name: "   ".into(), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let quad = quads::create_quad(
            &db,
            CreateQuad {
                name: "  Desert Fox ".into(),
                image_url: Some(String::new()),
                imei: Some("356938035643809".into()),
            },
        )
        .unwrap();
        assert_eq!(quad.id, 6);
        assert_eq!(quad.name, "Desert Fox");
        assert_eq!(quad.status, QuadStatus::Available);
        assert_eq!(quad.image_url, None);
        assert_eq!(quad.imei.as_deref(), Some("356938035643809"));
    }

    #[test]
    fn test_update_quad_validates_status() {
        let db = setup_test_db();

        let err = quads::update_quad(
            &db,
            1,
            UpdateQuad { name: "Quad 1".into(), status: "stolen".into(), image_url: None, imei: None },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let updated = quads::update_quad(
            &db,
            1,
            UpdateQuad { name: "Thunder".into(), status: "maintenance".into(), image_url: None, imei: None },
        )
        .unwrap();
        assert_eq!(updated.name, "Thunder");
        assert_eq!(updated.status, QuadStatus::Maintenance);

        let err = quads::update_quad(
            &db,
            99,
            UpdateQuad { name: "Ghost".into(), status: "available".into(), image_url: None, imei: None },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_update_quad_status_rejects_unknown_values() {
        let db = setup_test_db();

        assert!(matches!(
            quads::update_quad_status(&db, 1, "broken"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            quads::update_quad_status(&db, 42, "available"),
            Err(AppError::NotFound(_))
        ));

        quads::update_quad_status(&db, 2, "maintenance").unwrap();
        assert_eq!(quad_status(&db, 2), QuadStatus::Maintenance);
    }

    #[test]
    fn test_forced_rented_quad_is_healed_on_read() {
        let db = setup_test_db();

        quads::update_quad_status(&db, 3, "rented").unwrap();

        let fleet = quads::get_quads(&db).unwrap();
        assert_eq!(fleet[2].status, QuadStatus::Available);
    }

    #[test]
    fn test_heal_keeps_quads_with_active_bookings() {
        let db = setup_test_db();

        bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        quads::update_quad_status(&db, 2, "rented").unwrap();

        let fleet = quads::get_quads(&db).unwrap();
        assert_eq!(fleet[0].status, QuadStatus::Rented);
        assert_eq!(fleet[1].status, QuadStatus::Available);
    }

    #[test]
    fn test_heal_applies_after_reopening_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("royal_quads.db");

        {
            let db = Database::open(&path).unwrap();
            db.initialize().unwrap();
            // Simulates the app closing mid-ride with the booking lost
            db.lock()
                .unwrap()
                .execute("UPDATE quads SET status = 'rented' WHERE id = 4", [])
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        assert_eq!(quad_status(&db, 4), QuadStatus::Available);

        let persisted: String = db
            .lock()
            .unwrap()
            .query_row("SELECT status FROM quads WHERE id = 4", [], |row| row.get(0))
            .unwrap();
        assert_eq!(persisted, "available");
    }

    #[test]
    fn test_fresh_schema_declares_booking_columns() {
        let db = setup_test_db();

        let sql: String = db
            .lock()
            .unwrap()
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'bookings'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        // ALTER TABLE appends after the table constraints
        let constraints = sql.find("FOREIGN KEY").unwrap();
        for column in [
            "is_prebooked",
            "prebook_time",
            "group_size",
            "id_photo_url",
            "waiver_signed_at",
            "deposit_amount",
            "deposit_returned",
            "operator_id",
            "overtime_minutes",
            "overtime_charge",
        ] {
            let at = sql.find(column).unwrap_or_else(|| panic!("{column} missing"));
            assert!(at < constraints, "{column} was added by ALTER TABLE");
        }
    }

    #[test]
    fn test_older_store_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "
                CREATE TABLE quads (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'available'
                );
                CREATE TABLE bookings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    quad_id INTEGER NOT NULL,
                    user_id INTEGER,
                    customer_name TEXT NOT NULL,
                    customer_phone TEXT NOT NULL,
                    duration INTEGER NOT NULL,
                    price INTEGER NOT NULL,
                    original_price INTEGER NOT NULL,
                    promo_code TEXT,
                    start_time TEXT NOT NULL,
                    end_time TEXT,
                    status TEXT NOT NULL DEFAULT 'active',
                    receipt_id TEXT NOT NULL UNIQUE,
                    quad_name TEXT NOT NULL
                );
                INSERT INTO quads (name) VALUES ('Old Faithful');
                ",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();

        // Existing fleet is kept as is
        let fleet = quads::get_quads(&db).unwrap();
        assert_eq!(fleet.len(), 1);
        assert_eq!(fleet[0].imei, None);

        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        bookings::complete_booking(&db, created.id, 2).unwrap();

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.quad_name, "Old Faithful");
        assert_eq!(booking.group_size, 1);
        assert_eq!(booking.overtime_charge, 200);
    }

    // ===== BOOKING TESTS =====

    #[test]
    fn test_create_booking_rents_quad() {
        let db = setup_test_db();

        let created = bookings::create_booking(&db, new_booking(1, 2200)).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(quad_status(&db, 1), QuadStatus::Rented);

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.receipt_id, created.receipt_id);
        assert_eq!(booking.start_time, created.start_time);
        assert_eq!(booking.quad_name, "Quad 1");
        assert_eq!(booking.group_size, 1);
        assert_eq!(booking.overtime_charge, 0);
        assert!(booking.end_time.is_none());
    }

    #[test]
    fn test_no_double_booking() {
        let db = setup_test_db();

        bookings::create_booking(&db, new_booking(2, 1000)).unwrap();
        let err = bookings::create_booking(&db, new_booking(2, 1000)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(bookings::get_active_bookings(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_booking_unknown_or_unavailable_quad() {
        let db = setup_test_db();

        assert!(matches!(
            bookings::create_booking(&db, new_booking(77, 1000)),
            Err(AppError::NotFound(_))
        ));

        quads::update_quad_status(&db, 5, "maintenance").unwrap();
        assert!(matches!(
            bookings::create_booking(&db, new_booking(5, 1000)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_booking_input_validation() {
        let db = setup_test_db();

        let mut nameless = new_booking(1, 1000);
        nameless.customer_name = " ".into();
        assert!(matches!(
            bookings::create_booking(&db, nameless),
            Err(AppError::Validation(_))
        ));

        let mut no_time = new_booking(1, 1000);
        no_time.duration = 0;
        assert!(matches!(
            bookings::create_booking(&db, no_time),
            Err(AppError::Validation(_))
        ));

        let mut ghost_user = new_booking(1, 1000);
        ghost_user.user_id = Some(9);
        assert!(matches!(
            bookings::create_booking(&db, ghost_user),
            Err(AppError::NotFound(_))
        ));

        // Nothing was rented by the failed attempts
        assert_eq!(quad_status(&db, 1), QuadStatus::Available);
    }

    #[test]
    fn test_original_price_defaults_to_price() {
        let db = setup_test_db();

        let mut booking = new_booking(1, 1800);
        booking.original_price = None;
        booking.promo_code = Some(" summer10 ".into());
        let created = bookings::create_booking(&db, booking).unwrap();

        let stored = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(stored.original_price, 1800);
        assert_eq!(stored.promo_code.as_deref(), Some("SUMMER10"));
    }

    #[test]
    fn test_receipt_ids_are_unique_and_well_formed() {
        let db = setup_test_db();
        let pattern = Regex::new(r"^RQ-[A-Z0-9]{6}$").unwrap();

        let mut seen = HashSet::new();
        for round in 0..3 {
            for quad_id in 1..=5 {
                let created = bookings::create_booking(&db, new_booking(quad_id, 1000)).unwrap();
                assert!(pattern.is_match(&created.receipt_id), "bad receipt {}", created.receipt_id);
                assert!(seen.insert(created.receipt_id), "duplicate receipt in round {round}");
                bookings::complete_booking(&db, created.id, 0).unwrap();
            }
        }

        for _ in 0..500 {
            assert!(pattern.is_match(&bookings::generate_receipt_id()));
        }
    }

    #[test]
    fn test_complete_booking_frees_quad() {
        let db = setup_test_db();

        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        let done = bookings::complete_booking(&db, created.id, 0).unwrap();
        assert!(done.success);

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.end_time, Some(done.end_time));
        assert_eq!(quad_status(&db, 1), QuadStatus::Available);

        // The quad can be booked again right away
        bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
    }

    #[test]
    fn test_complete_booking_overrides_maintenance() {
        let db = setup_test_db();

        let created = bookings::create_booking(&db, new_booking(3, 1000)).unwrap();
        quads::update_quad_status(&db, 3, "maintenance").unwrap();

        bookings::complete_booking(&db, created.id, 0).unwrap();
        assert_eq!(quad_status(&db, 3), QuadStatus::Available);
    }

    #[test]
    fn test_complete_booking_only_once() {
        let db = setup_test_db();

        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        bookings::complete_booking(&db, created.id, 2).unwrap();

        assert!(matches!(
            bookings::complete_booking(&db, created.id, 0),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            bookings::complete_booking(&db, 404, 0),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            bookings::complete_booking(&db, created.id, -1),
            Err(AppError::Validation(_))
        ));

        // Overtime from the first completion is frozen
        assert_eq!(bookings::get_booking(&db, created.id).unwrap().overtime_charge, 200);
    }

    #[test]
    fn test_availability_invariant_holds_through_lifecycle() {
        let db = setup_test_db();

        let first = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        bookings::create_booking(&db, new_booking(2, 1800)).unwrap();
        bookings::complete_booking(&db, first.id, 0).unwrap();

        let active: HashSet<i64> = bookings::get_active_bookings(&db)
            .unwrap()
            .into_iter()
            .map(|b| b.quad_id)
            .collect();

        for quad in quads::get_quads(&db).unwrap() {
            assert_eq!(
                quad.status == QuadStatus::Rented,
                active.contains(&quad.id),
                "quad {} out of sync",
                quad.id
            );
        }
    }

    #[test]
    fn test_overtime_charge() {
        let start = noon(10);
        let minutes = pricing::overtime_minutes(start, 15, start + Duration::minutes(20)).unwrap();
        assert_eq!(minutes, 5);
        assert_eq!(pricing::overtime_minutes(start, 15, start + Duration::minutes(10)).unwrap(), 0);

        let db = setup_test_db();
        let created = bookings::create_booking(&db, new_booking(1, 2200)).unwrap();
        bookings::complete_booking(&db, created.id, minutes).unwrap();

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.overtime_minutes, 5);
        assert_eq!(booking.overtime_charge, 5 * OVERTIME_RATE);
        assert_eq!(booking.overtime_charge, 500);
    }

    #[test]
    fn test_ride_status_counts_down_then_overtime() {
        let start = noon(10);
        let mut booking = completed_booking(1, "Quad 1", ("Ali", "0711111111"), 2200, 0, start);
        booking.status = BookingStatus::Active;
        booking.end_time = None;

        let during = bookings::ride_status_at(&booking, start + Duration::minutes(10)).unwrap();
        assert_eq!(during.remaining_seconds, 300);
        assert_eq!(during.overtime_seconds, 0);

        let late = bookings::ride_status_at(&booking, start + Duration::seconds(20 * 60 + 30)).unwrap();
        assert_eq!(late.remaining_seconds, 0);
        assert_eq!(late.overtime_seconds, 330);
        assert_eq!(late.overtime_minutes, 5);
        assert_eq!(late.projected_overtime_charge, 500);
    }

    #[test]
    fn test_ride_status_rejects_completed_ride() {
        let db = setup_test_db();
        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();

        let status = bookings::get_ride_status(&db, created.id).unwrap();
        assert!(status.remaining_seconds > 0);

        bookings::complete_booking(&db, created.id, 0).unwrap();
        assert!(matches!(
            bookings::get_ride_status(&db, created.id),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_ride_duration_is_bounded() {
        let db = setup_test_db();

        for duration in [pricing::MAX_RIDE_MINUTES + 1, 1_000_000_000_000] {
            let mut booking = new_booking(1, 1000);
            booking.duration = duration;
            assert!(matches!(
                bookings::create_booking(&db, booking),
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(quad_status(&db, 1), QuadStatus::Available);

        let mut longest = new_booking(1, 6000);
        longest.duration = pricing::MAX_RIDE_MINUTES;
        let created = bookings::create_booking(&db, longest).unwrap();
        let status = bookings::get_ride_status(&db, created.id).unwrap();
        assert!(status.remaining_seconds > 0);

        let mut far = prebook(None);
        far.duration = 1_000_000_000_000;
        assert!(matches!(queue::create_prebooking(&db, far), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_ride_end_reports_out_of_range_duration() {
        let start = noon(10);
        assert!(matches!(
            pricing::ride_end(start, 1_000_000_000_000),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            pricing::overtime_minutes(start, i64::MAX, start),
            Err(AppError::Validation(_))
        ));

        // A row written before durations were bounded
        let mut stored = completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, start);
        stored.status = BookingStatus::Active;
        stored.duration = 1_000_000_000_000;
        assert!(matches!(
            bookings::ride_status_at(&stored, start),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_overtime_is_bounded() {
        let db = setup_test_db();
        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();

        for minutes in [pricing::MAX_OVERTIME_MINUTES + 1, i64::MAX / 10] {
            assert!(matches!(
                bookings::complete_booking(&db, created.id, minutes),
                Err(AppError::Validation(_))
            ));
        }

        // Rejected completions leave the ride open
        assert_eq!(bookings::get_booking(&db, created.id).unwrap().status, BookingStatus::Active);
        assert_eq!(quad_status(&db, 1), QuadStatus::Rented);

        bookings::complete_booking(&db, created.id, pricing::MAX_OVERTIME_MINUTES).unwrap();
        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.overtime_charge, pricing::MAX_OVERTIME_MINUTES * OVERTIME_RATE);
        assert!(reports::get_sales(&db).unwrap().total > 0);

        assert!(matches!(pricing::overtime_charge(i64::MAX), Err(AppError::Validation(_))));
        assert_eq!(pricing::overtime_charge(5).unwrap(), 500);
    }

    #[test]
    fn test_feedback_rating_bounds() {
        let db = setup_test_db();
        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();

        for bad in [0, 6] {
            assert!(matches!(
                bookings::submit_feedback(&db, created.id, bad, None),
                Err(AppError::Validation(_))
            ));
        }

        bookings::submit_feedback(&db, created.id, 1, Some("Too short".into())).unwrap();
        bookings::submit_feedback(&db, created.id, 5, Some("Loved it".into())).unwrap();

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert_eq!(booking.rating, Some(5));
        assert_eq!(booking.feedback.as_deref(), Some("Loved it"));

        assert!(matches!(
            bookings::submit_feedback(&db, 999, 3, None),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_deposit_and_waiver() {
        let db = setup_test_db();

        let mut booking = new_booking(1, 1000);
        booking.deposit_amount = Some(500);
        booking.group_size = Some(2);
        let created = bookings::create_booking(&db, booking).unwrap();

        let signed = bookings::sign_waiver(&db, created.id).unwrap();
        assert!(signed.waiver_signed);
        assert!(signed.waiver_signed_at.is_some());

        bookings::return_deposit(&db, created.id).unwrap();
        let stored = bookings::get_booking(&db, created.id).unwrap();
        assert!(stored.deposit_returned);
        assert_eq!(stored.deposit_amount, 500);
        assert_eq!(stored.group_size, 2);

        bookings::complete_booking(&db, created.id, 0).unwrap();
        assert!(matches!(
            bookings::sign_waiver(&db, created.id),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_booking_snapshot_survives_quad_rename() {
        let db = setup_test_db();

        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        quads::update_quad(
            &db,
            1,
            UpdateQuad { name: "Renamed".into(), status: "rented".into(), image_url: None, imei: None },
        )
        .unwrap();

        assert_eq!(bookings::get_booking(&db, created.id).unwrap().quad_name, "Quad 1");
    }

    #[test]
    fn test_history_and_receipt_lookup() {
        let db = setup_test_db();
        let user = users::register(
            &db,
            RegisterUser { name: "Otieno".into(), phone: "0722000111".into(), password: "pass1".into() },
        )
        .unwrap();

        let mut mine = new_booking(1, 1000);
        mine.user_id = Some(user.id);
        let a = bookings::create_booking(&db, mine.clone()).unwrap();
        bookings::create_booking(&db, new_booking(2, 1800)).unwrap();
        bookings::complete_booking(&db, a.id, 0).unwrap();
        let b = bookings::create_booking(&db, mine).unwrap();

        let history: Vec<i64> = bookings::get_user_history(&db, user.id)
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(history, vec![b.id, a.id]);

        let completed = bookings::get_booking_history(&db).unwrap();
        assert_eq!(completed.len(), 1);

        let found = bookings::get_booking_by_receipt(&db, &a.receipt_id.to_lowercase()).unwrap();
        assert_eq!(found.id, a.id);
        assert!(matches!(
            bookings::get_booking_by_receipt(&db, "RQ-NOPE00"),
            Err(AppError::NotFound(_))
        ));
    }

    // ===== PROMOTION & PRICING TESTS =====

    #[test]
    fn test_create_promotion_normalizes_code() {
        let db = setup_test_db();

        let promo = promotions::create_promotion(
            &db,
            CreatePromotion { code: "  easter20 ".into(), discount_percentage: 20 },
        )
        .unwrap();
        assert_eq!(promo.code, "EASTER20");
        assert_eq!(promo.is_active, 1);

        let dup = promotions::create_promotion(
            &db,
            CreatePromotion { code: "Easter20".into(), discount_percentage: 5 },
        );
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_promotion_discount_range() {
        let db = setup_test_db();

        for bad in [0, 101, -5] {
            let result = promotions::create_promotion(
                &db,
                CreatePromotion { code: format!("BAD{bad}"), discount_percentage: bad },
            );
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        for ok in [1, 100] {
            promotions::create_promotion(
                &db,
                CreatePromotion { code: format!("OK{ok}"), discount_percentage: ok },
            )
            .unwrap();
        }

        assert!(matches!(
            promotions::create_promotion(&db, CreatePromotion { code: " ".into(), discount_percentage: 10 }),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_promotion() {
        let db = setup_test_db();
        let promo = promotions::create_promotion(
            &db,
            CreatePromotion { code: "RIDE10".into(), discount_percentage: 10 },
        )
        .unwrap();

        let first = promotions::validate_promotion(&db, "ride10").unwrap();
        let second = promotions::validate_promotion(&db, " RIDE10 ").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, promo);

        promotions::toggle_promotion(&db, promo.id, false).unwrap();
        assert!(matches!(
            promotions::validate_promotion(&db, "RIDE10"),
            Err(AppError::NotFound(_))
        ));

        promotions::toggle_promotion(&db, promo.id, true).unwrap();
        assert!(promotions::validate_promotion(&db, "RIDE10").is_ok());

        promotions::delete_promotion(&db, promo.id).unwrap();
        assert!(matches!(
            promotions::validate_promotion(&db, "RIDE10"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            promotions::delete_promotion(&db, promo.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_promotions_listed_newest_first() {
        let db = setup_test_db();
        for code in ["A1", "B2", "C3"] {
            promotions::create_promotion(&db, CreatePromotion { code: code.into(), discount_percentage: 10 })
                .unwrap();
        }

        let codes: Vec<String> = promotions::get_promotions(&db)
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["C3", "B2", "A1"]);
    }

    #[test]
    fn test_discounted_price() {
        for price in [1000, 1800, 2200, 2500, 3500, 6000] {
            assert_eq!(pricing::discounted_price(price, 0), price);
        }
        assert_eq!(pricing::discounted_price(2200, 15), 1870);
        assert_eq!(pricing::discounted_price(2500, 10), 2250);
        assert_eq!(pricing::discounted_price(1000, 100), 0);
        // 1001 * 0.5 = 500.5 rounds up
        assert_eq!(pricing::discounted_price(1001, 50), 501);
        assert_eq!(pricing::discounted_price(1800, 33), 1206);
    }

    #[test]
    fn test_quote_applies_promotion() {
        let db = setup_test_db();
        promotions::create_promotion(&db, CreatePromotion { code: "HALF".into(), discount_percentage: 50 })
            .unwrap();

        let plain = promotions::quote(&db, 15, None).unwrap();
        assert_eq!(plain.price, 2200);
        assert_eq!(plain.discount_percentage, 0);

        let discounted = promotions::quote(&db, 30, Some("half")).unwrap();
        assert_eq!(discounted.original_price, 3500);
        assert_eq!(discounted.price, 1750);
        assert_eq!(discounted.promo_code.as_deref(), Some("HALF"));

        assert!(matches!(promotions::quote(&db, 7, None), Err(AppError::Validation(_))));
        assert!(matches!(promotions::quote(&db, 15, Some("NOPE")), Err(AppError::NotFound(_))));
    }

    // ===== ANALYTICS TESTS =====

    #[test]
    fn test_sales_total_includes_overtime() {
        let now = noon(20);
        let bookings = vec![
            completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, now - Duration::days(1)),
            completed_booking(2, "Quad 2", ("Bea", "0722222222"), 1800, 100, now - Duration::days(10)),
            completed_booking(3, "Quad 3", ("Cy", "0733333333"), 2200, 0, now - Duration::hours(2)),
        ];

        let sales = analytics::sales_summary(&bookings, &now);
        assert_eq!(sales.total, 5100);
        assert_eq!(sales.today, 2200);
        assert_eq!(sales.this_week, 3200);
        assert_eq!(sales.this_month, 5100);
        assert_eq!(sales.overtime_revenue, 100);
    }

    #[test]
    fn test_sales_ignore_active_bookings() {
        let now = noon(20);
        let mut active = completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, now);
        active.status = BookingStatus::Active;
        active.end_time = None;

        assert_eq!(analytics::sales_summary(&[active], &now), SalesData::default());
    }

    #[test]
    fn test_sales_from_store() {
        let db = setup_test_db();

        for (quad_id, price, overtime) in [(1, 1000, 0), (2, 1800, 1), (3, 2200, 0)] {
            let created = bookings::create_booking(&db, new_booking(quad_id, price)).unwrap();
            bookings::complete_booking(&db, created.id, overtime).unwrap();
        }
        bookings::create_booking(&db, new_booking(4, 6000)).unwrap();

        let sales = reports::get_sales(&db).unwrap();
        assert_eq!(sales.total, 5100);
        assert_eq!(sales.this_week, 5100);
        assert_eq!(sales.overtime_revenue, 100);
    }

    #[test]
    fn test_revenue_chart_covers_last_seven_days() {
        let now = noon(20);
        let bookings = vec![
            completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, now),
            completed_booking(2, "Quad 1", ("Ali", "0711111111"), 1800, 200, now),
            completed_booking(3, "Quad 2", ("Bea", "0722222222"), 2200, 0, noon(14)),
            completed_booking(4, "Quad 2", ("Bea", "0722222222"), 2500, 0, noon(13)),
        ];

        let chart = analytics::revenue_chart(&bookings, &now);
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].date, "2026-03-14");
        assert_eq!(chart[6].date, "2026-03-20");

        assert_eq!(chart[0].revenue, 2200);
        assert_eq!(chart[0].rides, 1);
        assert_eq!(chart[6].revenue, 3000);
        assert_eq!(chart[6].rides, 2);
        assert!(chart[1..6].iter().all(|p| p.rides == 0));
    }

    #[test]
    fn test_peak_hours_use_start_time() {
        let at = |hour| Utc.with_ymd_and_hms(2026, 3, 10, hour, 50, 0).unwrap();
        let bookings = vec![
            completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, at(9)),
            completed_booking(2, "Quad 1", ("Ali", "0711111111"), 1000, 0, at(9)),
            completed_booking(3, "Quad 2", ("Bea", "0722222222"), 1000, 0, at(23)),
        ];

        let hours = analytics::peak_hours(&bookings, &Utc);
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[9], PeakHour { hour: 9, count: 2 });
        // Ends at 00:05 the next day but started at 23:50
        assert_eq!(hours[23].count, 1);
        assert_eq!(hours[0].count, 0);
    }

    #[test]
    fn test_quad_utilisation_sorted_by_revenue() {
        let now = noon(20);
        let bookings = vec![
            completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 500, now),
            completed_booking(2, "Quad 2", ("Bea", "0722222222"), 2200, 0, now),
            completed_booking(3, "Quad 1", ("Cy", "0733333333"), 1000, 0, now),
        ];

        let util = analytics::quad_utilisation(&bookings);
        assert_eq!(
            util,
            vec![
                UtilEntry { quad_name: "Quad 2".into(), rides: 1, revenue: 2200, total_mins: 15 },
                UtilEntry { quad_name: "Quad 1".into(), rides: 2, revenue: 2000, total_mins: 30 },
            ]
        );
    }

    #[test]
    fn test_customer_stats() {
        let now = noon(20);
        let bookings = vec![
            completed_booking(1, "Quad 1", ("Ali", "0711111111"), 1000, 0, now),
            completed_booking(2, "Quad 2", ("Ali", "0711111111"), 1800, 0, now),
            completed_booking(3, "Quad 3", ("Bea", "0722222222"), 2500, 900, now),
            completed_booking(4, "Quad 3", ("Cy", "0733333333"), 1000, 0, now),
        ];

        let stats = analytics::customer_stats(&bookings);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.returning, 1);
        assert_eq!(stats.top_spender, "Ali");
        assert_eq!(stats.top_amount, 2800);

        assert_eq!(analytics::customer_stats(&[]), CustomerStats::default());
    }

    #[test]
    fn test_csv_export_quotes_fields() {
        let mut booking = completed_booking(1, "Quad 1", ("Mwangi, Jr", "0711111111"), 1000, 0, noon(5));
        booking.feedback = Some("Said \"wow\"".into());

        let csv = reports::bookings_to_csv(&[booking]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert!(lines[0].starts_with("Receipt,Customer,Phone,Quad"));
        assert!(lines[1].starts_with("RQ-TEST01,\"Mwangi, Jr\",0711111111,Quad 1,15,1000,1000,"));
        assert!(lines[1].ends_with(",\"Said \"\"wow\"\"\""));
        assert!(lines[1].contains("2026-03-05T12:00:00Z"));
    }

    // ===== USER TESTS =====

    #[test]
    fn test_register_and_login() {
        let db = setup_test_db();

        let user = users::register(
            &db,
            RegisterUser { name: " Achieng ".into(), phone: "0798765432".into(), password: "s3cret".into() },
        )
        .unwrap();
        assert_eq!(user.name, "Achieng");
        assert_eq!(user.role, UserRole::User);

        let logged_in = users::login(&db, "0798765432", "s3cret").unwrap();
        assert_eq!(logged_in, user);

        assert!(matches!(
            users::login(&db, "0798765432", "wrong"),
            Err(AppError::Unauthorized(_))
        ));

        let dup = users::register(
            &db,
            RegisterUser { name: "Other".into(), phone: "0798765432".into(), password: "abcd".into() },
        );
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_register_validation() {
        let db = setup_test_db();

        let cases = [
            ("", "0712345678", "pass"),
            ("Kim", "12345", "pass"),
            ("Kim", "0812345678", "pass"),
            ("Kim", "0712345678", "abc"),
        ];
        for (name, phone, password) in cases {
            let result = users::register(
                &db,
                RegisterUser { name: name.into(), phone: phone.into(), password: password.into() },
            );
            assert!(matches!(result, Err(AppError::Validation(_))), "{name}/{phone}/{password}");
        }

        assert!(users::is_valid_phone("0112345678"));
        assert!(users::is_valid_phone("+254712345678"));
        assert!(!users::is_valid_phone("071234567"));
    }

    // ===== PACKAGE TESTS =====

    #[test]
    fn test_packages() {
        let db = setup_test_db();

        let bundle = packages::create_package(
            &db,
            CreatePackage { name: "Family Pack".into(), description: "4 rides".into(), rides: 4, price: 8000 },
        )
        .unwrap();
        assert_eq!(bundle.is_active, 1);

        assert!(matches!(
            packages::create_package(
                &db,
                CreatePackage { name: "Empty".into(), description: String::new(), rides: 0, price: 100 },
            ),
            Err(AppError::Validation(_))
        ));

        packages::toggle_package(&db, bundle.id, false).unwrap();
        assert_eq!(packages::get_packages(&db).unwrap()[0].is_active, 0);

        packages::delete_package(&db, bundle.id).unwrap();
        assert!(packages::get_packages(&db).unwrap().is_empty());
    }

    // ===== STAFF TESTS =====

    fn create_operator(db: &Database, name: &str) -> Staff {
        staff::create_staff(
            db,
            CreateStaff { name: name.into(), phone: "0700000000".into(), pin: "4321".into(), role: StaffRole::Operator },
        )
        .unwrap()
    }

    #[test]
    fn test_staff_pin_verification() {
        let db = setup_test_db();
        let john = create_operator(&db, "John");

        assert!(staff::verify_staff_pin(&db, john.id, "4321").unwrap());
        assert!(!staff::verify_staff_pin(&db, john.id, "0000").unwrap());

        staff::set_staff_active(&db, john.id, false).unwrap();
        assert!(!staff::verify_staff_pin(&db, john.id, "4321").unwrap());

        assert!(matches!(
            staff::create_staff(
                &db,
                CreateStaff { name: "Jane".into(), phone: String::new(), pin: "12a4".into(), role: StaffRole::Manager },
            ),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_staff_pin_is_not_serialized() {
        let db = setup_test_db();
        let john = create_operator(&db, "John");

        let listed = serde_json::to_value(staff::get_staff(&db).unwrap()).unwrap();
        assert_eq!(listed[0]["name"], "John");
        assert!(listed[0].get("pin").is_none());
        assert!(!listed.to_string().contains("4321"));

        // The stored PIN is still what verification checks against
        assert!(staff::verify_staff_pin(&db, john.id, "4321").unwrap());
    }

    #[test]
    fn test_shift_lifecycle() {
        let db = setup_test_db();
        let john = create_operator(&db, "John");

        let shift = staff::start_shift(&db, john.id, Some("Morning".into())).unwrap();
        assert_eq!(shift.staff_name, "John");
        assert!(shift.end_time.is_none());

        assert!(matches!(
            staff::start_shift(&db, john.id, None),
            Err(AppError::Conflict(_))
        ));
        assert_eq!(staff::get_open_shifts(&db).unwrap().len(), 1);

        let ended = staff::end_shift(&db, shift.id, None).unwrap();
        assert!(ended.end_time.is_some());
        assert_eq!(ended.notes, "Morning");
        assert!(matches!(
            staff::end_shift(&db, shift.id, None),
            Err(AppError::Conflict(_))
        ));
        assert!(staff::get_open_shifts(&db).unwrap().is_empty());

        // Members with shift history cannot be deleted
        assert!(matches!(staff::delete_staff(&db, john.id), Err(AppError::Conflict(_))));

        let jane = create_operator(&db, "Jane");
        staff::delete_staff(&db, jane.id).unwrap();
        assert_eq!(staff::get_staff(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_inactive_staff_cannot_start_shift() {
        let db = setup_test_db();
        let john = create_operator(&db, "John");
        staff::set_staff_active(&db, john.id, false).unwrap();

        assert!(matches!(staff::start_shift(&db, john.id, None), Err(AppError::Conflict(_))));
        assert!(matches!(staff::start_shift(&db, 99, None), Err(AppError::NotFound(_))));
    }

    // ===== FLEET UPKEEP TESTS =====

    #[test]
    fn test_maintenance_logs() {
        let db = setup_test_db();
        let john = create_operator(&db, "John");

        let log = fleet::create_maintenance_log(
            &db,
            CreateMaintenanceLog {
                quad_id: 2,
                kind: MaintenanceType::Fuel,
                description: "Full tank".into(),
                cost: 1500,
                operator_id: Some(john.id),
            },
        )
        .unwrap();
        assert_eq!(log.quad_name, "Quad 2");
        assert_eq!(log.operator_name.as_deref(), Some("John"));

        fleet::create_maintenance_log(
            &db,
            CreateMaintenanceLog {
                quad_id: 3,
                kind: MaintenanceType::Service,
                description: "Oil change".into(),
                cost: 3000,
                operator_id: None,
            },
        )
        .unwrap();

        assert_eq!(fleet::get_maintenance_logs(&db, None).unwrap().len(), 2);
        assert_eq!(fleet::get_maintenance_logs(&db, Some(2)).unwrap(), vec![log.clone()]);

        let missing_quad = fleet::create_maintenance_log(
            &db,
            CreateMaintenanceLog {
                quad_id: 50,
                kind: MaintenanceType::Repair,
                description: "Brakes".into(),
                cost: 0,
                operator_id: None,
            },
        );
        assert!(matches!(missing_quad, Err(AppError::NotFound(_))));

        fleet::delete_maintenance_log(&db, log.id).unwrap();
        assert_eq!(fleet::get_maintenance_logs(&db, None).unwrap().len(), 1);
    }

    #[test]
    fn test_damage_reports_and_fleet_costs() {
        let db = setup_test_db();
        let created = bookings::create_booking(&db, new_booking(1, 1000)).unwrap();

        let report = fleet::create_damage_report(
            &db,
            CreateDamageReport {
                quad_id: 1,
                booking_id: Some(created.id),
                customer_name: None,
                description: "Cracked mirror".into(),
                photo_url: None,
                severity: DamageSeverity::Minor,
                repair_cost: 800,
            },
        )
        .unwrap();
        assert_eq!(report.customer_name.as_deref(), Some("Wanjiku"));
        assert!(!report.resolved);

        let resolved = fleet::resolve_damage_report(&db, report.id).unwrap();
        assert!(resolved.resolved);

        fleet::create_maintenance_log(
            &db,
            CreateMaintenanceLog {
                quad_id: 1,
                kind: MaintenanceType::Repair,
                description: "Mirror replaced".into(),
                cost: 200,
                operator_id: None,
            },
        )
        .unwrap();

        let costs = fleet::get_fleet_costs(&db).unwrap();
        assert_eq!(
            costs,
            vec![FleetCost { quad_name: "Quad 1".into(), maintenance_cost: 200, repair_cost: 800, total_cost: 1000 }]
        );

        let bad_booking = fleet::create_damage_report(
            &db,
            CreateDamageReport {
                quad_id: 1,
                booking_id: Some(77),
                customer_name: None,
                description: "Dent".into(),
                photo_url: None,
                severity: DamageSeverity::Moderate,
                repair_cost: 0,
            },
        );
        assert!(matches!(bad_booking, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_damage_report_booking_must_match_quad() {
        let db = setup_test_db();
        let ride = bookings::create_booking(&db, new_booking(2, 1000)).unwrap();

        let mismatched = fleet::create_damage_report(
            &db,
            CreateDamageReport {
                quad_id: 1,
                booking_id: Some(ride.id),
                customer_name: None,
                description: "Bent footrest".into(),
                photo_url: None,
                severity: DamageSeverity::Minor,
                repair_cost: 300,
            },
        );
        assert!(matches!(mismatched, Err(AppError::Validation(_))));
        assert!(fleet::get_damage_reports(&db).unwrap().is_empty());
    }

    // ===== WAITLIST & PREBOOKING TESTS =====

    #[test]
    fn test_waitlist_order() {
        let db = setup_test_db();

        for name in ["First", "Second"] {
            queue::add_to_waitlist(
                &db,
                CreateWaitlistEntry { customer_name: name.into(), customer_phone: "0711111111".into(), duration: 10 },
            )
            .unwrap();
        }

        let list = queue::get_waitlist(&db).unwrap();
        assert_eq!(list[0].customer_name, "First");
        assert!(!list[0].notified);

        queue::notify_waitlist_entry(&db, list[0].id).unwrap();
        queue::remove_from_waitlist(&db, list[1].id).unwrap();

        let list = queue::get_waitlist(&db).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].notified);
    }

    fn prebook(quad_id: Option<i64>) -> CreatePrebooking {
        CreatePrebooking {
            quad_id,
            customer_name: "Njeri".into(),
            customer_phone: "0712121212".into(),
            duration: 30,
            price: 3500,
            scheduled_for: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn test_prebooking_conversion() {
        let db = setup_test_db();

        let pre = queue::create_prebooking(&db, prebook(Some(2))).unwrap();
        assert_eq!(pre.quad_name.as_deref(), Some("Quad 2"));
        assert_eq!(pre.status, PrebookingStatus::Pending);

        queue::confirm_prebooking(&db, pre.id).unwrap();
        let created = queue::convert_prebooking(&db, pre.id, None).unwrap();

        let booking = bookings::get_booking(&db, created.id).unwrap();
        assert!(booking.is_prebooked);
        assert_eq!(booking.prebook_time, Some(pre.scheduled_for));
        assert_eq!(booking.price, 3500);
        assert_eq!(quad_status(&db, 2), QuadStatus::Rented);

        assert!(matches!(
            queue::convert_prebooking(&db, pre.id, None),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(queue::cancel_prebooking(&db, pre.id), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_prebooking_conversion_respects_availability() {
        let db = setup_test_db();

        bookings::create_booking(&db, new_booking(1, 1000)).unwrap();
        let pre = queue::create_prebooking(&db, prebook(None)).unwrap();

        assert!(matches!(
            queue::convert_prebooking(&db, pre.id, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            queue::convert_prebooking(&db, pre.id, Some(1)),
            Err(AppError::Conflict(_))
        ));

        // The failed attempts left the prebooking open
        let cancelled = queue::cancel_prebooking(&db, pre.id).unwrap();
        assert_eq!(cancelled.status, PrebookingStatus::Cancelled);
    }

    #[test]
    fn test_prebooking_must_be_in_future() {
        let db = setup_test_db();

        let mut past = prebook(None);
        past.scheduled_for = Utc::now() - Duration::minutes(5);
        assert!(matches!(queue::create_prebooking(&db, past), Err(AppError::Validation(_))));
    }

    // ===== ADMIN PIN TESTS =====

    #[test]
    fn test_admin_pin() {
        let db = setup_test_db();

        assert!(settings::verify_admin_pin(&db, "1234").unwrap());
        assert!(!settings::verify_admin_pin(&db, "0000").unwrap());

        assert!(matches!(
            settings::change_admin_pin(&db, "9999", "5678"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            settings::change_admin_pin(&db, "1234", "12"),
            Err(AppError::Validation(_))
        ));

        settings::change_admin_pin(&db, "1234", "5678").unwrap();
        assert!(settings::verify_admin_pin(&db, "5678").unwrap());
        assert!(!settings::verify_admin_pin(&db, "1234").unwrap());
    }

    // ===== CONFIG TESTS =====

    #[test]
    fn test_default_config() {
        let config = crate::config::Config::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.log_format, crate::config::LogFormat::Pretty);
        assert_eq!(config.db_path, "royal_quads.db");
    }

    // ===== HTTP TESTS =====

    mod http {
        use axum::{
            body::Body,
            http::{Request, StatusCode},
            Router,
        };
        use http_body_util::BodyExt;
        use serde_json::{json, Value};
        use std::sync::Arc;
        use tower::ServiceExt;

        use crate::db::Database;
        use crate::routes;

        fn app() -> Router {
            let db = Database::open_in_memory().unwrap();
            db.initialize().unwrap();
            routes::router(Arc::new(db))
        }

        async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        fn booking_body(quad_id: i64) -> Value {
            json!({
                "quadId": quad_id,
                "customerName": "Kamau",
                "customerPhone": "0712345678",
                "duration": 10,
                "price": 1800,
                "originalPrice": 1800
            })
        }

        #[tokio::test]
        async fn test_list_quads() {
            let app = app();
            let (status, body) = send(&app, "GET", "/api/quads", None).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body.as_array().unwrap().len(), 5);
            assert_eq!(body[0]["status"], "available");
            assert!(body[0]["imageUrl"].is_null());
        }

        #[tokio::test]
        async fn test_booking_round_trip_over_http() {
            let app = app();

            let (status, created) = send(&app, "POST", "/api/bookings", Some(booking_body(1))).await;
            assert_eq!(status, StatusCode::OK);
            assert!(created["receiptId"].as_str().unwrap().starts_with("RQ-"));

            let (status, err) = send(&app, "POST", "/api/bookings", Some(booking_body(1))).await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(err["error"], "Quad is not available");

            let id = created["id"].as_i64().unwrap();
            let (status, done) = send(
                &app,
                "POST",
                &format!("/api/bookings/{id}/complete"),
                Some(json!({ "overtimeMinutes": 3 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(done["success"], true);

            let (_, sales) = send(&app, "GET", "/api/sales", None).await;
            assert_eq!(sales["total"], 2100);
            assert_eq!(sales["overtimeRevenue"], 300);

            let (status, _) = send(&app, "POST", &format!("/api/bookings/{id}/complete"), None).await;
            assert_eq!(status, StatusCode::CONFLICT);
        }

        #[tokio::test]
        async fn test_error_statuses() {
            let app = app();

            let (status, _) = send(&app, "POST", "/api/bookings", Some(booking_body(40))).await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _) = send(&app, "PUT", "/api/quads/1/status", Some(json!({ "status": "lost" }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);

            let (_, created) = send(&app, "POST", "/api/bookings", Some(booking_body(2))).await;
            let id = created["id"].as_i64().unwrap();
            let (status, _) = send(
                &app,
                "POST",
                &format!("/api/bookings/{id}/feedback"),
                Some(json!({ "rating": 6 })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);

            let (status, _) = send(
                &app,
                "POST",
                "/api/auth/login",
                Some(json!({ "phone": "0700000000", "password": "nope" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_promo_validation_over_http() {
            let app = app();

            let (status, promo) = send(
                &app,
                "POST",
                "/api/promotions",
                Some(json!({ "code": "weekend", "discountPercentage": 25 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(promo["code"], "WEEKEND");

            let (status, found) = send(&app, "GET", "/api/promotions/validate/Weekend", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(found["discountPercentage"], 25);

            let (_, quote) = send(&app, "GET", "/api/pricing/quote?duration=20&promoCode=weekend", None).await;
            assert_eq!(quote["price"], 1875);

            let (status, _) = send(&app, "GET", "/api/promotions/validate/MISSING", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_staff_listing_hides_pins() {
            let app = app();

            let (status, _) = send(
                &app,
                "POST",
                "/api/staff",
                Some(json!({ "name": "Op", "pin": "9876", "role": "operator" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);

            let (status, listed) = send(&app, "GET", "/api/staff", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(listed[0]["name"], "Op");
            assert!(listed[0].get("pin").is_none());

            let (_, check) = send(&app, "POST", "/api/staff/1/verify-pin", Some(json!({ "pin": "9876" }))).await;
            assert_eq!(check["valid"], true);
        }

        #[tokio::test]
        async fn test_malformed_body_is_validation_error() {
            let app = app();

            let (status, body) = send(&app, "POST", "/api/bookings", Some(json!({ "quadId": "one" }))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());

            let request = Request::builder()
                .method("POST")
                .uri("/api/promotions")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["error"].is_string());
        }
    }
}
