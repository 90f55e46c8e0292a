use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Declares a closed set of lowercase string values, stored as TEXT and
/// serialized as the same string.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(format!("Invalid {}: '{}'", stringify!($name), other)),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum!(QuadStatus {
    Available => "available",
    Rented => "rented",
    Maintenance => "maintenance",
});

text_enum!(BookingStatus {
    Active => "active",
    Completed => "completed",
});

text_enum!(UserRole {
    User => "user",
    Admin => "admin",
});

text_enum!(MaintenanceType {
    Service => "service",
    Fuel => "fuel",
    Repair => "repair",
    Inspection => "inspection",
});

text_enum!(DamageSeverity {
    Minor => "minor",
    Moderate => "moderate",
    Severe => "severe",
});

text_enum!(StaffRole {
    Operator => "operator",
    Manager => "manager",
});

text_enum!(PrebookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Converted => "converted",
});

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ===== Quads =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quad {
    pub id: i64,
    pub name: String,
    pub status: QuadStatus,
    pub image_url: Option<String>,
    pub imei: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuad {
    pub name: String,
    pub image_url: Option<String>,
    pub imei: Option<String>,
}

/// Status is kept as text so an unknown value is reported as a validation error.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuad {
    pub name: String,
    pub status: String,
    pub image_url: Option<String>,
    pub imei: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateQuadStatus {
    pub status: String,
}

// ===== Bookings =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub quad_id: i64,
    pub user_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    /// Minutes
    pub duration: i64,
    pub price: i64,
    pub original_price: i64,
    pub promo_code: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub receipt_id: String,
    pub rating: Option<i64>,
    pub feedback: Option<String>,
    pub quad_name: String,
    pub quad_image_url: Option<String>,
    pub quad_imei: Option<String>,
    pub is_prebooked: bool,
    pub prebook_time: Option<DateTime<Utc>>,
    pub group_size: i64,
    pub id_photo_url: Option<String>,
    pub waiver_signed: bool,
    pub waiver_signed_at: Option<DateTime<Utc>>,
    pub deposit_amount: i64,
    pub deposit_returned: bool,
    pub operator_id: Option<i64>,
    pub overtime_minutes: i64,
    pub overtime_charge: i64,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub quad_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub duration: i64,
    pub price: i64,
    /// Defaults to `price` when absent
    pub original_price: Option<i64>,
    pub promo_code: Option<String>,
    pub user_id: Option<i64>,
    pub group_size: Option<i64>,
    pub id_photo_url: Option<String>,
    #[serde(default)]
    pub waiver_signed: bool,
    pub deposit_amount: Option<i64>,
    pub operator_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreated {
    pub id: i64,
    pub receipt_id: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBooking {
    #[serde(default)]
    pub overtime_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCompleted {
    pub success: bool,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitFeedback {
    pub rating: i64,
    pub feedback: Option<String>,
}

/// Clock-derived view of an active ride.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideStatus {
    pub booking_id: i64,
    pub ends_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub overtime_seconds: i64,
    pub overtime_minutes: i64,
    pub projected_overtime_charge: i64,
}

// ===== Users =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

// ===== Promotions & pricing =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: i64,
    pub code: String,
    pub discount_percentage: i64,
    pub is_active: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotion {
    pub code: String,
    pub discount_percentage: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleActive {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub duration: i64,
    pub original_price: i64,
    pub discount_percentage: i64,
    pub price: i64,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub duration: i64,
    pub promo_code: Option<String>,
}

// ===== Packages =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub rides: i64,
    pub price: i64,
    pub is_active: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePackage {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rides: i64,
    pub price: i64,
}

// ===== Maintenance & damage =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: i64,
    pub quad_id: i64,
    pub quad_name: String,
    #[serde(rename = "type")]
    pub kind: MaintenanceType,
    pub description: String,
    pub cost: i64,
    pub date: DateTime<Utc>,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenanceLog {
    pub quad_id: i64,
    #[serde(rename = "type")]
    pub kind: MaintenanceType,
    pub description: String,
    #[serde(default)]
    pub cost: i64,
    pub operator_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceQuery {
    pub quad_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DamageReport {
    pub id: i64,
    pub quad_id: i64,
    pub quad_name: String,
    pub booking_id: Option<i64>,
    pub customer_name: Option<String>,
    pub description: String,
    pub photo_url: Option<String>,
    pub severity: DamageSeverity,
    pub repair_cost: i64,
    pub resolved: bool,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDamageReport {
    pub quad_id: i64,
    pub booking_id: Option<i64>,
    pub customer_name: Option<String>,
    pub description: String,
    pub photo_url: Option<String>,
    pub severity: DamageSeverity,
    #[serde(default)]
    pub repair_cost: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FleetCost {
    pub quad_name: String,
    pub maintenance_cost: i64,
    pub repair_cost: i64,
    pub total_cost: i64,
}

// ===== Staff & shifts =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// Checked server-side only; never sent to clients
    #[serde(default, skip_serializing)]
    pub pin: String,
    pub role: StaffRole,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub pin: String,
    pub role: StaffRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPin {
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PinCheck {
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: i64,
    pub staff_id: i64,
    pub staff_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShift {
    pub staff_id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct EndShift {
    pub notes: Option<String>,
}

// ===== Waitlist & prebookings =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub duration: i64,
    pub added_at: DateTime<Utc>,
    pub notified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWaitlistEntry {
    pub customer_name: String,
    pub customer_phone: String,
    pub duration: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prebooking {
    pub id: i64,
    pub quad_id: Option<i64>,
    pub quad_name: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub duration: i64,
    pub price: i64,
    pub scheduled_for: DateTime<Utc>,
    pub status: PrebookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrebooking {
    pub quad_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub duration: i64,
    pub price: i64,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPrebooking {
    pub quad_id: Option<i64>,
}

// ===== Analytics =====

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesData {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub overtime_revenue: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RevenuePoint {
    pub date: String,
    pub revenue: i64,
    pub rides: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PeakHour {
    pub hour: u32,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UtilEntry {
    pub quad_name: String,
    pub rides: i64,
    pub revenue: i64,
    pub total_mins: i64,
}

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total: i64,
    pub returning: i64,
    pub top_spender: String,
    pub top_amount: i64,
}

// ===== Admin =====

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePin {
    pub current_pin: String,
    pub new_pin: String,
}
