use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::ledger;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seats))
        .route("/seats/toggle", patch(toggle_seat))
        .route("/admin/showtimes", post(create_showtime))
}

/* ---------- SEAT LEDGER ---------- */

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    showtime_id: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct SeatResponse {
    id: i64,
    seat_number: String,
    is_booked: bool,
}

// GET /api/seats?showtime_id= - занятость зала в порядке генерации
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeatsQuery>,
) -> Result<impl IntoResponse> {
    if params.showtime_id <= 0 {
        return Err(AppError::Validation("showtime_id must be positive".into()));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM showtimes WHERE id = $1)",
    )
    .bind(params.showtime_id)
    .fetch_one(&state.db.pool)
    .await?;
    if !exists {
        return Err(AppError::ShowtimeNotFound);
    }

    let seats = sqlx::query_as::<_, SeatResponse>(
        "SELECT id, seat_number, is_booked FROM seats WHERE showtime_id = $1 ORDER BY id",
    )
    .bind(params.showtime_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "seats": seats,
            "count": seats.len()
        })),
    ))
}

// PATCH /api/seats/toggle - ручной админский оверрайд одного места
#[derive(Debug, Deserialize)]
struct ToggleSeatRequest {
    seat_id: i64,
    // состояние, которое админ видел на экране; защита от гонки двух админов
    expected_booked: bool,
}

async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleSeatRequest>,
) -> Result<impl IntoResponse> {
    if req.seat_id <= 0 {
        return Err(AppError::Validation("seat_id must be positive".into()));
    }

    let seat = ledger::toggle_seat(&state.db.pool, req.seat_id, req.expected_booked).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "seat": seat
        })),
    ))
}

/* ---------- SHOWTIME CREATION ---------- */

#[derive(Debug, Deserialize, Validate)]
struct CreateShowtimeRequest {
    #[validate(range(min = 1))]
    movie_id: i64,
    show_date: chrono::NaiveDate,
    show_time: chrono::NaiveTime,
    #[validate(range(min = 1, max = 260))]
    total_seats: i32,
    #[validate(range(min = 0.01))]
    price: f64,
}

// POST /api/admin/showtimes - сеанс создается сразу вместе со всеми местами
async fn create_showtime(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateShowtimeRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let showtime_id = ledger::create_showtime(
        &state.db.pool,
        req.movie_id,
        req.show_date,
        req.show_time,
        req.total_seats,
        req.price,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "showtime_id": showtime_id,
            "total_seats": req.total_seats
        })),
    ))
}
