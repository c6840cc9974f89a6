use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub showtime_id: i64,
    pub seat_number: String,
    pub is_booked: bool,
    pub sale_id: Option<i64>,
}
