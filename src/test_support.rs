//! Хелперы для тестов, которым нужна настоящая БД. Без DATABASE_URL такие
//! тесты тихо пропускаются; с ним - каждый тест сеет свои собственные
//! строки и проверяет только их.

use chrono::{Duration, NaiveTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::services::ledger;

pub(crate) async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    sqlx::migrate!("./src/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    Some(pool)
}

pub(crate) async fn seed_movie(pool: &PgPool, title: &str, status: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO movies (title, duration, rating, status)
         VALUES ($1, 120, 'PG', $2)
         RETURNING id",
    )
    .bind(title)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("failed to seed movie")
}

pub(crate) async fn seed_showtime(
    pool: &PgPool,
    movie_id: i64,
    days_from_now: i64,
    total_seats: i32,
    price: f64,
) -> i64 {
    let show_date = Utc::now().date_naive() + Duration::days(days_from_now);
    let show_time = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
    ledger::create_showtime(pool, movie_id, show_date, show_time, total_seats, price)
        .await
        .expect("failed to seed showtime")
}

pub(crate) async fn seed_extra(pool: &PgPool, name: &str, price: f64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO extras (name, price, category, status)
         VALUES ($1, $2, 'snack', 'active')
         RETURNING id",
    )
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("failed to seed extra")
}

pub(crate) async fn available_seats(pool: &PgPool, showtime_id: i64) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT available_seats FROM showtimes WHERE id = $1")
        .bind(showtime_id)
        .fetch_one(pool)
        .await
        .expect("failed to read available_seats")
}

pub(crate) async fn booked_count(pool: &PgPool, showtime_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM seats WHERE showtime_id = $1 AND is_booked = TRUE",
    )
    .bind(showtime_id)
    .fetch_one(pool)
    .await
    .expect("failed to count booked seats")
}

pub(crate) async fn sales_count(pool: &PgPool, showtime_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE showtime_id = $1")
        .bind(showtime_id)
        .fetch_one(pool)
        .await
        .expect("failed to count sales")
}
