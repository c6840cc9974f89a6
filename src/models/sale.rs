use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub showtime_id: i64,
    pub seats_booked: i32,
    pub total_amount: f64,
    pub sale_date: NaiveDateTime,
}
