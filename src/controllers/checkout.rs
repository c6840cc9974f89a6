use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::booking::{self, BookingOrder};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/checkout", post(process_checkout))
}

const PAYMENT_METHODS: [&str; 3] = ["cash", "gcash", "bank"];

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    showtime_id: i64,
    seats: Vec<String>,
    #[serde(default)]
    extras: BTreeMap<i64, u32>,
    // итог, который киоск показывал пользователю; сервер его пересчитает
    claimed_total: f64,
    payment_method: String,
    // корзину чистим только при успехе, при ошибке она нужна для ретрая
    cart_id: Option<Uuid>,
}

// POST /api/checkout - единственный путь, создающий продажу
async fn process_checkout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    if !PAYMENT_METHODS.contains(&req.payment_method.as_str()) {
        return Err(AppError::Validation(format!(
            "payment_method must be one of: {}",
            PAYMENT_METHODS.join(", ")
        )));
    }

    let order = BookingOrder {
        showtime_id: req.showtime_id,
        seats: req.seats,
        extras: req.extras,
        claimed_total: req.claimed_total,
    };

    let sale_id = booking::commit_booking(&state.db.pool, &state.config.booking, &order).await?;

    // Продажа зафиксирована; корзина своё отработала
    if let Some(cart_id) = req.cart_id {
        state.carts.delete(cart_id).await;
    }

    // payment_method записи не имеет - только отображение на экране киоска
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "sale_id": sale_id,
            "payment_method": req.payment_method
        })),
    ))
}
