use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Extra, Movie, Showtime};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/showtimes", get(list_showtimes))
        .route("/extras", get(list_extras))
}

// Фильм плюс id его предстоящих сеансов - с этого начинается пайплайн киоска
#[derive(Debug, Serialize)]
struct MovieListing {
    #[serde(flatten)]
    movie: Movie,
    showtime_ids: Vec<i64>,
}

async fn list_active_movies(pool: &PgPool) -> Result<Vec<MovieListing>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT id, title, description, trailer_url, poster_image, duration, rating, status
         FROM movies
         WHERE status = 'active'
         ORDER BY title",
    )
    .fetch_all(pool)
    .await?;

    // Предстоящие сеансы одним запросом, дальше раскладываем по фильмам
    let upcoming: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT movie_id, id FROM showtimes
         WHERE show_date >= CURRENT_DATE
         ORDER BY show_date, show_time",
    )
    .fetch_all(pool)
    .await?;

    let mut by_movie: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for (movie_id, showtime_id) in upcoming {
        by_movie.entry(movie_id).or_default().push(showtime_id);
    }

    Ok(movies
        .into_iter()
        .map(|m| MovieListing {
            showtime_ids: by_movie.remove(&m.id).unwrap_or_default(),
            movie: m,
        })
        .collect())
}

// GET /api/movies - активные фильмы для первого экрана киоска
async fn list_movies(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let movies = list_active_movies(&state.db.pool).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "movies": movies,
            "count": movies.len()
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct ShowtimesQuery {
    movie_id: i64,
    date: Option<chrono::NaiveDate>,
}

// GET /api/showtimes?movie_id=&date= - сеансы с доступностью мест
async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowtimesQuery>,
) -> Result<impl IntoResponse> {
    if params.movie_id <= 0 {
        return Err(crate::error::AppError::Validation(
            "movie_id must be positive".into(),
        ));
    }

    let mut q = String::from(
        "SELECT id, movie_id, show_date, show_time, total_seats, available_seats, price::FLOAT as price
         FROM showtimes
         WHERE movie_id = $1",
    );
    if params.date.is_some() {
        q.push_str(" AND show_date = $2");
    }
    q.push_str(" ORDER BY show_date, show_time");

    let mut dbq = sqlx::query_as::<_, Showtime>(&q).bind(params.movie_id);
    if let Some(date) = params.date {
        dbq = dbq.bind(date);
    }
    let showtimes = dbq.fetch_all(&state.db.pool).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "showtimes": showtimes,
            "count": showtimes.len()
        })),
    ))
}

// GET /api/extras - активные снеки и напитки
async fn list_extras(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let extras = sqlx::query_as::<_, Extra>(
        "SELECT id, name, description, price::FLOAT as price, category, image, status
         FROM extras
         WHERE status = 'active'
         ORDER BY category, name",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "extras": extras,
            "count": extras.len()
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn movie_listing_carries_upcoming_showtime_ids() {
        let Some(pool) = test_support::pool().await else {
            return;
        };

        let movie_id = test_support::seed_movie(&pool, "Catalog Feature", "active").await;
        let hidden_id = test_support::seed_movie(&pool, "Shelved Feature", "inactive").await;
        let tomorrow = test_support::seed_showtime(&pool, movie_id, 1, 20, 10.00).await;
        let next_week = test_support::seed_showtime(&pool, movie_id, 7, 20, 10.00).await;
        // вчерашний сеанс в списке предстоящих быть не должен
        let yesterday = test_support::seed_showtime(&pool, movie_id, -1, 20, 10.00).await;

        let listings = list_active_movies(&pool).await.unwrap();

        let ours = listings
            .iter()
            .find(|l| l.movie.id == movie_id)
            .expect("seeded movie missing from listing");
        assert_eq!(ours.showtime_ids, vec![tomorrow, next_week]);
        assert!(!ours.showtime_ids.contains(&yesterday));

        assert!(listings.iter().all(|l| l.movie.id != hidden_id));
    }
}
