use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub trailer_url: Option<String>,
    pub poster_image: Option<String>,
    pub duration: i32,
    pub rating: String,
    pub status: String,
}
