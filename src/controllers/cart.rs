use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cart", post(create_cart))
        .route("/cart/{cart_id}", get(get_cart))
        .route("/cart/{cart_id}/seats", patch(update_seats))
        .route("/cart/{cart_id}/extras", patch(update_extras))
}

/// Loads the cart and enforces the staleness policy: a cart bound to a
/// different showtime than the caller is on gets discarded on the spot.
async fn load_cart_for(state: &AppState, cart_id: Uuid, showtime_id: i64) -> Result<Cart> {
    let cart = state
        .carts
        .load(cart_id)
        .await?
        .ok_or(AppError::CartNotFound)?;
    if !cart.belongs_to(showtime_id) {
        state.carts.delete(cart_id).await;
        return Err(AppError::CartShowtimeMismatch);
    }
    Ok(cart)
}

/* ---------- CART LIFECYCLE ---------- */

#[derive(Debug, Deserialize)]
struct CreateCartRequest {
    showtime_id: i64,
}

// POST /api/cart - пустая корзина, привязанная к сеансу
async fn create_cart(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCartRequest>,
) -> Result<impl IntoResponse> {
    if req.showtime_id <= 0 {
        return Err(AppError::Validation("showtime_id must be positive".into()));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM showtimes WHERE id = $1)",
    )
    .bind(req.showtime_id)
    .fetch_one(&state.db.pool)
    .await?;
    if !exists {
        return Err(AppError::ShowtimeNotFound);
    }

    let cart = Cart::new(req.showtime_id);
    state.carts.save(&cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "cart_id": cart.id,
            "showtime_id": cart.showtime_id
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct GetCartQuery {
    showtime_id: i64,
}

// GET /api/cart/{id}?showtime_id= - корзина плюс пересчитанный итог
async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
    Query(params): Query<GetCartQuery>,
) -> Result<impl IntoResponse> {
    let cart = load_cart_for(&state, cart_id, params.showtime_id).await?;

    let ticket_price = sqlx::query_scalar::<_, f64>(
        "SELECT price::FLOAT FROM showtimes WHERE id = $1",
    )
    .bind(cart.showtime_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(AppError::ShowtimeNotFound)?;

    // Тот же фильтр, что и при чекауте: снятый с продажи доп не должен
    // попадать в котировку, которую потом отвергнет booking
    let extra_ids: Vec<i64> = cart.extras.keys().copied().collect();
    let priced: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT id, price::FLOAT FROM extras WHERE id = ANY($1) AND status = 'active'",
    )
    .bind(&extra_ids)
    .fetch_all(&state.db.pool)
    .await?;
    let prices: BTreeMap<i64, f64> = priced.into_iter().collect();

    let total = cart.compute_total(ticket_price, &prices);

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "cart": cart,
            "total": total
        })),
    ))
}

/* ---------- SEAT STAGING ---------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SeatAction {
    Select,
    Deselect,
}

#[derive(Debug, Deserialize)]
struct UpdateSeatsRequest {
    showtime_id: i64,
    action: SeatAction,
    seat_number: String,
}

// PATCH /api/cart/{id}/seats - выбор/снятие места до любого коммита в БД
async fn update_seats(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
    Json(req): Json<UpdateSeatsRequest>,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart_for(&state, cart_id, req.showtime_id).await?;

    match req.action {
        SeatAction::Select => {
            // Сверяемся с актуальным состоянием леджера, а не со снапшотом
            // страницы: место могло уйти, пока пользователь думал
            let booked = sqlx::query_scalar::<_, bool>(
                "SELECT is_booked FROM seats WHERE showtime_id = $1 AND seat_number = $2",
            )
            .bind(cart.showtime_id)
            .bind(&req.seat_number)
            .fetch_optional(&state.db.pool)
            .await?
            .ok_or_else(|| AppError::UnknownSeat(req.seat_number.clone()))?;

            if booked {
                return Err(AppError::SeatUnavailable(req.seat_number));
            }
            cart.select_seat(&req.seat_number, state.config.booking.max_seats_per_order)?;
        }
        SeatAction::Deselect => {
            cart.deselect_seat(&req.seat_number);
        }
    }

    state.carts.save(&cart).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "seats": cart.seats
        })),
    ))
}

/* ---------- EXTRAS STAGING ---------- */

#[derive(Debug, Deserialize)]
struct UpdateExtrasRequest {
    showtime_id: i64,
    extra_id: i64,
    quantity: i64,
}

// PATCH /api/cart/{id}/extras - количество клампится в 0..=10 на сервере
async fn update_extras(
    State(state): State<Arc<AppState>>,
    Path(cart_id): Path<Uuid>,
    Json(req): Json<UpdateExtrasRequest>,
) -> Result<impl IntoResponse> {
    let mut cart = load_cart_for(&state, cart_id, req.showtime_id).await?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM extras WHERE id = $1 AND status = 'active')",
    )
    .bind(req.extra_id)
    .fetch_one(&state.db.pool)
    .await?;
    if !exists {
        return Err(AppError::ExtraNotFound(req.extra_id));
    }

    cart.set_extra_quantity(
        req.extra_id,
        req.quantity,
        state.config.booking.max_extra_quantity,
    );
    state.carts.save(&cart).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "extras": cart.extras
        })),
    ))
}
