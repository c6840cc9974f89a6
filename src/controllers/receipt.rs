use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Sale;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/receipt/{sale_id}", get(get_receipt))
}

#[derive(Debug, sqlx::FromRow)]
struct ShowingRow {
    show_date: chrono::NaiveDate,
    show_time: chrono::NaiveTime,
    ticket_price: f64,
    title: String,
    poster_image: Option<String>,
    rating: String,
    duration: i32,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct ExtraLineRow {
    name: String,
    category: String,
    price: f64,
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct ExtraLine {
    name: String,
    category: String,
    price: f64,
    quantity: i32,
    subtotal: f64,
}

fn price_lines(lines: Vec<ExtraLineRow>) -> Vec<ExtraLine> {
    lines
        .into_iter()
        .map(|l| ExtraLine {
            subtotal: l.price * l.quantity as f64,
            name: l.name,
            category: l.category,
            price: l.price,
            quantity: l.quantity,
        })
        .collect()
}

// GET /api/receipt/{sale_id} - read-only проекция продажи для чека
//
// Места читаем по sale_id, а не "все занятые места сеанса": при двух
// продажах одного сеанса подряд чек показывает ровно свои места.
async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Path(sale_id): Path<i64>,
) -> Result<impl IntoResponse> {
    if sale_id <= 0 {
        return Err(AppError::Validation("sale_id must be positive".into()));
    }

    let sale = sqlx::query_as::<_, Sale>(
        "SELECT id, showtime_id, seats_booked, total_amount::FLOAT as total_amount, sale_date
         FROM sales
         WHERE id = $1",
    )
    .bind(sale_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(AppError::SaleNotFound)?;

    let showing = sqlx::query_as::<_, ShowingRow>(
        "SELECT st.show_date, st.show_time, st.price::FLOAT as ticket_price,
                m.title, m.poster_image, m.rating, m.duration
         FROM showtimes st
         JOIN movies m ON st.movie_id = m.id
         WHERE st.id = $1",
    )
    .bind(sale.showtime_id)
    .fetch_one(&state.db.pool)
    .await?;

    let seats: Vec<String> = sqlx::query_scalar(
        "SELECT seat_number FROM seats WHERE sale_id = $1 ORDER BY seat_number",
    )
    .bind(sale_id)
    .fetch_all(&state.db.pool)
    .await?;

    let lines = sqlx::query_as::<_, ExtraLineRow>(
        "SELECT e.name, e.category, e.price::FLOAT as price, se.quantity
         FROM sales_extras se
         JOIN extras e ON se.extra_id = e.id
         WHERE se.sale_id = $1
         ORDER BY e.category, e.name",
    )
    .bind(sale_id)
    .fetch_all(&state.db.pool)
    .await?;

    let extras = price_lines(lines);

    let tickets_total = sale.seats_booked as f64 * showing.ticket_price;
    let extras_total: f64 = extras.iter().map(|l| l.subtotal).sum();

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "receipt": {
                "sale_id": sale.id,
                "sale_date": sale.sale_date,
                "movie": {
                    "title": showing.title,
                    "poster_image": showing.poster_image,
                    "rating": showing.rating,
                    "duration": showing.duration
                },
                "showtime": {
                    "id": sale.showtime_id,
                    "show_date": showing.show_date,
                    "show_time": showing.show_time,
                    "ticket_price": showing.ticket_price
                },
                "seats": seats,
                "seats_booked": sale.seats_booked,
                "extras": extras,
                "tickets_total": tickets_total,
                "extras_total": extras_total,
                "total_amount": sale.total_amount
            }
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: f64, quantity: i32) -> ExtraLineRow {
        ExtraLineRow {
            name: name.to_string(),
            category: "snack".to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn subtotals_plus_tickets_reconstruct_the_sale_total() {
        // продажа: 2 места по 12.50 + попкорн 5.00 x3
        let extras = price_lines(vec![line("Popcorn", 5.00, 3)]);
        assert_eq!(extras.len(), 1);
        assert!((extras[0].subtotal - 15.00).abs() < 0.005);

        let tickets_total = 2.0 * 12.50;
        let extras_total: f64 = extras.iter().map(|l| l.subtotal).sum();
        let stored_total = 40.00;
        assert!((tickets_total + extras_total - stored_total).abs() < 0.005);
    }

    #[test]
    fn empty_extras_produce_no_lines() {
        assert!(price_lines(vec![]).is_empty());
    }
}
