use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::Seat;

/// Ten seats per row: A1..A10, B1..B10, ... Generated once per showtime,
/// never regenerated afterwards.
pub const SEATS_PER_ROW: i32 = 10;

/// Rows run A..Z, so the hard capacity ceiling is 260 seats.
pub const MAX_TOTAL_SEATS: i32 = 26 * SEATS_PER_ROW;

/// Seat labels in generation order for a given capacity. Capacities beyond
/// `MAX_TOTAL_SEATS` are clamped so the row letter never walks past 'Z'.
pub fn seat_labels(total_seats: i32) -> Vec<String> {
    (0..total_seats.clamp(0, MAX_TOTAL_SEATS))
        .map(|i| {
            let row = (b'A' + (i / SEATS_PER_ROW) as u8) as char;
            let col = i % SEATS_PER_ROW + 1;
            format!("{}{}", row, col)
        })
        .collect()
}

/// Creates a showtime together with its full seat set in one transaction.
/// available_seats стартует равным total_seats - все места свободны.
pub async fn create_showtime(
    pool: &PgPool,
    movie_id: i64,
    show_date: NaiveDate,
    show_time: NaiveTime,
    total_seats: i32,
    price: f64,
) -> Result<i64> {
    // Лимит проверяем здесь, а не только в хендлере: это инвариант
    // генератора, любой вызывающий обязан в него упереться
    if !(1..=MAX_TOTAL_SEATS).contains(&total_seats) {
        return Err(AppError::Validation(format!(
            "total_seats must be between 1 and {}",
            MAX_TOTAL_SEATS
        )));
    }

    let movie_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)",
    )
    .bind(movie_id)
    .fetch_one(pool)
    .await?;
    if !movie_exists {
        return Err(AppError::MovieNotFound);
    }

    let mut tx = pool.begin().await?;

    let showtime_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO showtimes (movie_id, show_date, show_time, total_seats, available_seats, price)
         VALUES ($1, $2, $3, $4, $4, $5)
         RETURNING id",
    )
    .bind(movie_id)
    .bind(show_date)
    .bind(show_time)
    .bind(total_seats)
    .bind(price)
    .fetch_one(&mut *tx)
    .await?;

    let labels = seat_labels(total_seats);
    let result = sqlx::query(
        "INSERT INTO seats (showtime_id, seat_number)
         SELECT $1, unnest($2::VARCHAR[])",
    )
    .bind(showtime_id)
    .bind(&labels)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "created showtime {} with {} seats",
        showtime_id,
        result.rows_affected()
    );
    Ok(showtime_id)
}

/// Manual admin override: flips one seat, guarded by the state the admin
/// was looking at. Если другой админ успел раньше - conditional update не
/// заденет ни одной строки и вернем конфликт вместо тихой перезаписи.
pub async fn toggle_seat(pool: &PgPool, seat_id: i64, expected_booked: bool) -> Result<Seat> {
    let mut tx = pool.begin().await?;

    // Freeing a seat also detaches it from whatever sale booked it
    let seat = sqlx::query_as::<_, Seat>(
        "UPDATE seats
         SET is_booked = NOT is_booked,
             sale_id = CASE WHEN is_booked THEN NULL ELSE sale_id END
         WHERE id = $1 AND is_booked = $2
         RETURNING id, showtime_id, seat_number, is_booked, sale_id",
    )
    .bind(seat_id)
    .bind(expected_booked)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(seat) = seat else {
        let _ = tx.rollback().await;
        // seat missing entirely vs lost race - для админки различие не нужно,
        // в обоих случаях экран устарел
        return Err(AppError::ToggleConflict);
    };

    // После ручного вмешательства кеш доступности пересчитываем честно
    sqlx::query(
        "UPDATE showtimes
         SET available_seats = (
             SELECT COUNT(*) FROM seats
             WHERE showtime_id = $1 AND is_booked = FALSE
         )
         WHERE id = $1",
    )
    .bind(seat.showtime_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_ten_per_row() {
        let labels = seat_labels(96);
        assert_eq!(labels.len(), 96);
        assert_eq!(labels[0], "A1");
        assert_eq!(labels[9], "A10");
        assert_eq!(labels[10], "B1");
        assert_eq!(labels[95], "J6");
    }

    #[test]
    fn labels_are_unique() {
        let labels = seat_labels(MAX_TOTAL_SEATS);
        let unique: HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
        assert_eq!(*labels.last().unwrap(), "Z10");
    }

    #[test]
    fn zero_capacity_generates_nothing() {
        assert!(seat_labels(0).is_empty());
        assert!(seat_labels(-5).is_empty());
    }

    #[test]
    fn oversized_capacity_is_clamped_to_the_last_row() {
        let labels = seat_labels(MAX_TOTAL_SEATS + 100);
        assert_eq!(labels.len(), MAX_TOTAL_SEATS as usize);
        assert_eq!(*labels.last().unwrap(), "Z10");
    }
}
