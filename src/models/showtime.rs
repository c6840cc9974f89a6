use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// price хранится как NUMERIC(10,2), в запросах кастуем ::FLOAT
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub movie_id: i64,
    pub show_date: NaiveDate,
    pub show_time: NaiveTime,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price: f64,
}
