use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, AppResult};

pub const DEFAULT_ADMIN_PIN: &str = "1234";

/// Single-owner handle to the rental store.
///
/// Every domain operation holds `conn` for its whole read-compute-write
/// cycle, so operations never interleave.
pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| AppError::Internal(format!("Failed to create data directory: {e}")))?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::Internal(format!("Store lock poisoned: {e}")))
    }

    pub fn initialize(&self) -> AppResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Fleet
            CREATE TABLE IF NOT EXISTS quads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'available'
                    CHECK (status IN ('available', 'rented', 'maintenance')),
                image_url TEXT,
                imei TEXT
            );

            -- Customer accounts
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin'))
            );

            CREATE TABLE IF NOT EXISTS promotions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                discount_percentage INTEGER NOT NULL
                    CHECK (discount_percentage BETWEEN 1 AND 100),
                is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
            );

            -- Rentals; quad display fields are copied at creation
            CREATE TABLE IF NOT EXISTS bookings (
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
                status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed')),
                receipt_id TEXT NOT NULL UNIQUE,
                rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
                feedback TEXT,
                quad_name TEXT NOT NULL,
                quad_image_url TEXT,
                quad_imei TEXT,
                is_prebooked INTEGER NOT NULL DEFAULT 0,
                prebook_time TEXT,
                group_size INTEGER NOT NULL DEFAULT 1,
                id_photo_url TEXT,
                waiver_signed INTEGER NOT NULL DEFAULT 0,
                waiver_signed_at TEXT,
                deposit_amount INTEGER NOT NULL DEFAULT 0,
                deposit_returned INTEGER NOT NULL DEFAULT 0,
                operator_id INTEGER,
                overtime_minutes INTEGER NOT NULL DEFAULT 0,
                overtime_charge INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (quad_id) REFERENCES quads(id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS packages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                rides INTEGER NOT NULL CHECK (rides >= 1),
                price INTEGER NOT NULL CHECK (price >= 0),
                is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
            );

            CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT NOT NULL DEFAULT '',
                pin TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'operator' CHECK (role IN ('operator', 'manager')),
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS shifts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                staff_id INTEGER NOT NULL,
                staff_name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                notes TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (staff_id) REFERENCES staff(id)
            );

            CREATE TABLE IF NOT EXISTS maintenance_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quad_id INTEGER NOT NULL,
                quad_name TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('service', 'fuel', 'repair', 'inspection')),
                description TEXT NOT NULL,
                cost INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL,
                operator_id INTEGER,
                operator_name TEXT,
                FOREIGN KEY (quad_id) REFERENCES quads(id)
            );

            CREATE TABLE IF NOT EXISTS damage_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quad_id INTEGER NOT NULL,
                quad_name TEXT NOT NULL,
                booking_id INTEGER,
                customer_name TEXT,
                description TEXT NOT NULL,
                photo_url TEXT,
                severity TEXT NOT NULL CHECK (severity IN ('minor', 'moderate', 'severe')),
                repair_cost INTEGER NOT NULL DEFAULT 0,
                resolved INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL,
                FOREIGN KEY (quad_id) REFERENCES quads(id),
                FOREIGN KEY (booking_id) REFERENCES bookings(id)
            );

            CREATE TABLE IF NOT EXISTS waitlist (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_name TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                duration INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                notified INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS prebookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quad_id INTEGER,
                quad_name TEXT,
                customer_name TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                duration INTEGER NOT NULL,
                price INTEGER NOT NULL,
                scheduled_for TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'confirmed', 'cancelled', 'converted')),
                created_at TEXT NOT NULL,
                FOREIGN KEY (quad_id) REFERENCES quads(id)
            );

            -- Singleton values (admin PIN)
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;
        Self::seed_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> AppResult<()> {
        // Upgrades files created before these columns existed; fresh
        // databases get them from the CREATE statements above
        const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
            ("quads", "image_url", "TEXT"),
            ("quads", "imei", "TEXT"),
            ("bookings", "rating", "INTEGER"),
            ("bookings", "feedback", "TEXT"),
            ("bookings", "quad_image_url", "TEXT"),
            ("bookings", "quad_imei", "TEXT"),
            ("bookings", "is_prebooked", "INTEGER NOT NULL DEFAULT 0"),
            ("bookings", "prebook_time", "TEXT"),
            ("bookings", "group_size", "INTEGER NOT NULL DEFAULT 1"),
            ("bookings", "id_photo_url", "TEXT"),
            ("bookings", "waiver_signed", "INTEGER NOT NULL DEFAULT 0"),
            ("bookings", "waiver_signed_at", "TEXT"),
            ("bookings", "deposit_amount", "INTEGER NOT NULL DEFAULT 0"),
            ("bookings", "deposit_returned", "INTEGER NOT NULL DEFAULT 0"),
            ("bookings", "operator_id", "INTEGER"),
            ("bookings", "overtime_minutes", "INTEGER NOT NULL DEFAULT 0"),
            ("bookings", "overtime_charge", "INTEGER NOT NULL DEFAULT 0"),
        ];

        for (table, column, ddl) in ADDED_COLUMNS {
            let columns: Vec<String> = conn
                .prepare(&format!("PRAGMA table_info({table})"))?
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<Result<_, _>>()?;

            if !columns.iter().any(|c| c == column) {
                tracing::info!(table, column, "Adding missing column");
                conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {ddl}"), [])?;
            }
        }

        Ok(())
    }

    fn seed_conn(conn: &Connection) -> AppResult<()> {
        let quad_count: i64 = conn.query_row("SELECT COUNT(*) FROM quads", [], |row| row.get(0))?;

        // First launch: five default quads
        if quad_count == 0 {
            for i in 1..=5 {
                conn.execute("INSERT INTO quads (name) VALUES (?1)", [format!("Quad {i}")])?;
            }
            tracing::info!("Seeded default fleet");
        }

        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('admin_pin', ?1)",
            [DEFAULT_ADMIN_PIN],
        )?;

        Ok(())
    }
}
