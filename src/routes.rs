//! HTTP JSON binding of the domain operations under `/api`.
//!
//! Handlers only unpack the request and call into `commands`; every rule
//! lives there.

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Query, Request, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::commands::{
    bookings, fleet, packages, promotions, quads, queue, reports, settings, staff, users,
};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::*;

pub type AppState = Arc<Database>;

pub fn router(db: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Royal Quads API OK" }))
        .merge(quad_routes())
        .merge(booking_routes())
        .merge(report_routes())
        .merge(user_routes())
        .merge(promotion_routes())
        .merge(fleet_routes())
        .merge(staff_routes())
        .merge(queue_routes())
        .merge(admin_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

fn quad_routes() -> Router<AppState> {
    Router::new()
        .route("/api/quads", get(list_quads).post(create_quad))
        .route("/api/quads/{id}", get(get_quad).put(update_quad))
        .route("/api/quads/{id}/status", put(update_quad_status))
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/bookings/active", get(active_bookings))
        .route("/api/bookings/history", get(booking_history))
        .route("/api/bookings/export", get(export_bookings))
        .route("/api/bookings/receipt/{receipt_id}", get(booking_by_receipt))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/complete", post(complete_booking))
        .route("/api/bookings/{id}/feedback", post(submit_feedback))
        .route("/api/bookings/{id}/deposit/return", post(return_deposit))
        .route("/api/bookings/{id}/waiver", post(sign_waiver))
        .route("/api/bookings/{id}/ride", get(ride_status))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(sales))
        .route("/api/analytics/revenue", get(revenue_chart))
        .route("/api/analytics/peak-hours", get(peak_hours))
        .route("/api/analytics/utilisation", get(quad_utilisation))
        .route("/api/analytics/customers", get(customer_stats))
        .route("/api/analytics/fleet-costs", get(fleet_costs))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/history", get(user_history))
}

fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/api/promotions", get(list_promotions).post(create_promotion))
        .route("/api/promotions/validate/{code}", get(validate_promotion))
        .route("/api/promotions/{id}", delete(delete_promotion))
        .route("/api/promotions/{id}/toggle", post(toggle_promotion))
        .route("/api/pricing/quote", get(quote))
        .route("/api/packages", get(list_packages).post(create_package))
        .route("/api/packages/{id}", delete(delete_package))
        .route("/api/packages/{id}/toggle", post(toggle_package))
}

fn fleet_routes() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance", get(list_maintenance).post(create_maintenance))
        .route("/api/maintenance/{id}", delete(delete_maintenance))
        .route("/api/damage", get(list_damage).post(create_damage))
        .route("/api/damage/{id}", delete(delete_damage))
        .route("/api/damage/{id}/resolve", post(resolve_damage))
}

fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/api/staff", get(list_staff).post(create_staff))
        .route("/api/staff/{id}", delete(delete_staff))
        .route("/api/staff/{id}/active", post(set_staff_active))
        .route("/api/staff/{id}/verify-pin", post(verify_staff_pin))
        .route("/api/shifts", get(list_shifts).post(start_shift))
        .route("/api/shifts/open", get(open_shifts))
        .route("/api/shifts/{id}/end", post(end_shift))
}

fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/api/waitlist", get(list_waitlist).post(add_to_waitlist))
        .route("/api/waitlist/{id}", delete(remove_from_waitlist))
        .route("/api/waitlist/{id}/notify", post(notify_waitlist))
        .route("/api/prebookings", get(list_prebookings).post(create_prebooking))
        .route("/api/prebookings/{id}/confirm", post(confirm_prebooking))
        .route("/api/prebookings/{id}/cancel", post(cancel_prebooking))
        .route("/api/prebookings/{id}/convert", post(convert_prebooking))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/pin/verify", post(verify_admin_pin))
        .route("/api/admin/pin", put(change_admin_pin))
}

/// `Json` body whose rejections surface as `Validation` errors.
struct AppJson<T>(T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Parses an optional JSON body; an empty body yields the default.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::validation(format!("Invalid request body: {e}")))
}

// ===== Quads =====

async fn list_quads(State(db): State<AppState>) -> AppResult<Json<Vec<Quad>>> {
    Ok(Json(quads::get_quads(&db)?))
}

async fn get_quad(State(db): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Quad>> {
    Ok(Json(quads::get_quad(&db, id)?))
}

async fn create_quad(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateQuad>,
) -> AppResult<Json<Quad>> {
    Ok(Json(quads::create_quad(&db, payload)?))
}

async fn update_quad(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateQuad>,
) -> AppResult<Json<Quad>> {
    Ok(Json(quads::update_quad(&db, id, payload)?))
}

async fn update_quad_status(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateQuadStatus>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(quads::update_quad_status(&db, id, &payload.status)?))
}

// ===== Bookings =====

async fn list_bookings(State(db): State<AppState>) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(bookings::get_all_bookings(&db)?))
}

async fn create_booking(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateBooking>,
) -> AppResult<Json<BookingCreated>> {
    Ok(Json(bookings::create_booking(&db, payload)?))
}

async fn active_bookings(State(db): State<AppState>) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(bookings::get_active_bookings(&db)?))
}

async fn booking_history(State(db): State<AppState>) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(bookings::get_booking_history(&db)?))
}

async fn export_bookings(State(db): State<AppState>) -> AppResult<impl IntoResponse> {
    let csv = reports::export_bookings_csv(&db)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bookings.csv\""),
        ],
        csv,
    ))
}

async fn booking_by_receipt(
    State(db): State<AppState>,
    Path(receipt_id): Path<String>,
) -> AppResult<Json<Booking>> {
    Ok(Json(bookings::get_booking_by_receipt(&db, &receipt_id)?))
}

async fn get_booking(State(db): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Booking>> {
    Ok(Json(bookings::get_booking(&db, id)?))
}

async fn complete_booking(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<BookingCompleted>> {
    let payload: CompleteBooking = optional_body(&body)?;
    Ok(Json(bookings::complete_booking(&db, id, payload.overtime_minutes)?))
}

async fn submit_feedback(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<SubmitFeedback>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(bookings::submit_feedback(&db, id, payload.rating, payload.feedback)?))
}

async fn return_deposit(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(bookings::return_deposit(&db, id)?))
}

async fn sign_waiver(State(db): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Booking>> {
    Ok(Json(bookings::sign_waiver(&db, id)?))
}

async fn ride_status(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RideStatus>> {
    Ok(Json(bookings::get_ride_status(&db, id)?))
}

// ===== Reports =====

async fn sales(State(db): State<AppState>) -> AppResult<Json<SalesData>> {
    Ok(Json(reports::get_sales(&db)?))
}

async fn revenue_chart(State(db): State<AppState>) -> AppResult<Json<Vec<RevenuePoint>>> {
    Ok(Json(reports::get_revenue_chart(&db)?))
}

async fn peak_hours(State(db): State<AppState>) -> AppResult<Json<Vec<PeakHour>>> {
    Ok(Json(reports::get_peak_hours(&db)?))
}

async fn quad_utilisation(State(db): State<AppState>) -> AppResult<Json<Vec<UtilEntry>>> {
    Ok(Json(reports::get_quad_utilisation(&db)?))
}

async fn customer_stats(State(db): State<AppState>) -> AppResult<Json<CustomerStats>> {
    Ok(Json(reports::get_customer_stats(&db)?))
}

async fn fleet_costs(State(db): State<AppState>) -> AppResult<Json<Vec<FleetCost>>> {
    Ok(Json(fleet::get_fleet_costs(&db)?))
}

// ===== Users =====

async fn register(
    State(db): State<AppState>,
    AppJson(payload): AppJson<RegisterUser>,
) -> AppResult<Json<User>> {
    Ok(Json(users::register(&db, payload)?))
}

async fn login(
    State(db): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(users::login(&db, &payload.phone, &payload.password)?))
}

async fn get_user(State(db): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    Ok(Json(users::get_user(&db, id)?))
}

async fn user_history(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(bookings::get_user_history(&db, id)?))
}

// ===== Promotions, pricing & packages =====

async fn list_promotions(State(db): State<AppState>) -> AppResult<Json<Vec<Promotion>>> {
    Ok(Json(promotions::get_promotions(&db)?))
}

async fn create_promotion(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreatePromotion>,
) -> AppResult<Json<Promotion>> {
    Ok(Json(promotions::create_promotion(&db, payload)?))
}

async fn validate_promotion(
    State(db): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Promotion>> {
    Ok(Json(promotions::validate_promotion(&db, &code)?))
}

async fn delete_promotion(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(promotions::delete_promotion(&db, id)?))
}

async fn toggle_promotion(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ToggleActive>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(promotions::toggle_promotion(&db, id, payload.is_active)?))
}

async fn quote(
    State(db): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> AppResult<Json<PriceQuote>> {
    Ok(Json(promotions::quote(&db, query.duration, query.promo_code.as_deref())?))
}

async fn list_packages(State(db): State<AppState>) -> AppResult<Json<Vec<Package>>> {
    Ok(Json(packages::get_packages(&db)?))
}

async fn create_package(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreatePackage>,
) -> AppResult<Json<Package>> {
    Ok(Json(packages::create_package(&db, payload)?))
}

async fn delete_package(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(packages::delete_package(&db, id)?))
}

async fn toggle_package(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ToggleActive>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(packages::toggle_package(&db, id, payload.is_active)?))
}

// ===== Maintenance & damage =====

async fn list_maintenance(
    State(db): State<AppState>,
    Query(query): Query<MaintenanceQuery>,
) -> AppResult<Json<Vec<MaintenanceLog>>> {
    Ok(Json(fleet::get_maintenance_logs(&db, query.quad_id)?))
}

async fn create_maintenance(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateMaintenanceLog>,
) -> AppResult<Json<MaintenanceLog>> {
    Ok(Json(fleet::create_maintenance_log(&db, payload)?))
}

async fn delete_maintenance(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(fleet::delete_maintenance_log(&db, id)?))
}

async fn list_damage(State(db): State<AppState>) -> AppResult<Json<Vec<DamageReport>>> {
    Ok(Json(fleet::get_damage_reports(&db)?))
}

async fn create_damage(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateDamageReport>,
) -> AppResult<Json<DamageReport>> {
    Ok(Json(fleet::create_damage_report(&db, payload)?))
}

async fn delete_damage(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(fleet::delete_damage_report(&db, id)?))
}

async fn resolve_damage(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DamageReport>> {
    Ok(Json(fleet::resolve_damage_report(&db, id)?))
}

// ===== Staff & shifts =====

async fn list_staff(State(db): State<AppState>) -> AppResult<Json<Vec<Staff>>> {
    Ok(Json(staff::get_staff(&db)?))
}

async fn create_staff(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateStaff>,
) -> AppResult<Json<Staff>> {
    Ok(Json(staff::create_staff(&db, payload)?))
}

async fn delete_staff(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(staff::delete_staff(&db, id)?))
}

async fn set_staff_active(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ToggleActive>,
) -> AppResult<Json<Staff>> {
    Ok(Json(staff::set_staff_active(&db, id, payload.is_active)?))
}

async fn verify_staff_pin(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<VerifyPin>,
) -> AppResult<Json<PinCheck>> {
    let valid = staff::verify_staff_pin(&db, id, &payload.pin)?;
    Ok(Json(PinCheck { valid }))
}

async fn list_shifts(State(db): State<AppState>) -> AppResult<Json<Vec<Shift>>> {
    Ok(Json(staff::get_shifts(&db)?))
}

async fn open_shifts(State(db): State<AppState>) -> AppResult<Json<Vec<Shift>>> {
    Ok(Json(staff::get_open_shifts(&db)?))
}

async fn start_shift(
    State(db): State<AppState>,
    AppJson(payload): AppJson<StartShift>,
) -> AppResult<Json<Shift>> {
    Ok(Json(staff::start_shift(&db, payload.staff_id, payload.notes)?))
}

async fn end_shift(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<Shift>> {
    let payload: EndShift = optional_body(&body)?;
    Ok(Json(staff::end_shift(&db, id, payload.notes)?))
}

// ===== Waitlist & prebookings =====

async fn list_waitlist(State(db): State<AppState>) -> AppResult<Json<Vec<WaitlistEntry>>> {
    Ok(Json(queue::get_waitlist(&db)?))
}

async fn add_to_waitlist(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreateWaitlistEntry>,
) -> AppResult<Json<WaitlistEntry>> {
    Ok(Json(queue::add_to_waitlist(&db, payload)?))
}

async fn remove_from_waitlist(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(queue::remove_from_waitlist(&db, id)?))
}

async fn notify_waitlist(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(queue::notify_waitlist_entry(&db, id)?))
}

async fn list_prebookings(State(db): State<AppState>) -> AppResult<Json<Vec<Prebooking>>> {
    Ok(Json(queue::get_prebookings(&db)?))
}

async fn create_prebooking(
    State(db): State<AppState>,
    AppJson(payload): AppJson<CreatePrebooking>,
) -> AppResult<Json<Prebooking>> {
    Ok(Json(queue::create_prebooking(&db, payload)?))
}

async fn confirm_prebooking(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Prebooking>> {
    Ok(Json(queue::confirm_prebooking(&db, id)?))
}

async fn cancel_prebooking(
    State(db): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Prebooking>> {
    Ok(Json(queue::cancel_prebooking(&db, id)?))
}

async fn convert_prebooking(
    State(db): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<BookingCreated>> {
    let payload: ConvertPrebooking = optional_body(&body)?;
    Ok(Json(queue::convert_prebooking(&db, id, payload.quad_id)?))
}

// ===== Admin =====

async fn verify_admin_pin(
    State(db): State<AppState>,
    AppJson(payload): AppJson<VerifyPin>,
) -> AppResult<Json<PinCheck>> {
    let valid = settings::verify_admin_pin(&db, &payload.pin)?;
    Ok(Json(PinCheck { valid }))
}

async fn change_admin_pin(
    State(db): State<AppState>,
    AppJson(payload): AppJson<ChangePin>,
) -> AppResult<Json<SuccessResponse>> {
    Ok(Json(settings::change_admin_pin(&db, &payload.current_pin, &payload.new_pin)?))
}
