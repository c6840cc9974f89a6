use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, HashSet};
use tracing::{error, info};

use crate::config::BookingConfig;
use crate::error::{AppError, Result};
use crate::services::pricing;

/// Checkout payload after the controller has stripped transport concerns.
#[derive(Debug, Clone)]
pub struct BookingOrder {
    pub showtime_id: i64,
    pub seats: Vec<String>,
    pub extras: BTreeMap<i64, u32>,
    /// Client's running total - проверяется, но не сохраняется как есть
    pub claimed_total: f64,
}

/// The one multi-statement write path: cart → sale + booked seats + extras
/// lines, commit-or-rollback as a unit.
///
/// Порядок шагов как в киоске: sale → seats → available_seats → extras.
/// Отличия от него сознательные: места захватываются условным UPDATE
/// (проигранная гонка = конфликт, а не двойная продажа), отсутствующая
/// строка места - громкая ошибка целостности, а итоговая сумма
/// пересчитывается из цен каталога.
pub async fn commit_booking(
    pool: &PgPool,
    limits: &BookingConfig,
    order: &BookingOrder,
) -> Result<i64> {
    validate_order(limits, order)?;

    let mut tx = pool.begin().await?;
    match run_booking(&mut tx, order).await {
        Ok(sale_id) => {
            tx.commit().await?;
            info!(
                "sale {} committed: showtime {}, {} seats, {} extras lines",
                sale_id,
                order.showtime_id,
                order.seats.len(),
                order.extras.len()
            );
            Ok(sale_id)
        }
        Err(e) => {
            // Ни одного частичного эффекта снаружи видно быть не должно
            if let Err(rb) = tx.rollback().await {
                error!("booking rollback failed: {:?}", rb);
            }
            Err(e)
        }
    }
}

fn validate_order(limits: &BookingConfig, order: &BookingOrder) -> Result<()> {
    if order.showtime_id <= 0 {
        return Err(AppError::Validation("showtime_id must be positive".into()));
    }
    if order.seats.is_empty() {
        return Err(AppError::Validation("no seats selected".into()));
    }
    if order.seats.len() > limits.max_seats_per_order {
        return Err(AppError::SeatLimitReached(limits.max_seats_per_order));
    }
    let distinct: HashSet<&String> = order.seats.iter().collect();
    if distinct.len() != order.seats.len() {
        return Err(AppError::Validation("duplicate seat labels".into()));
    }
    for (extra_id, qty) in &order.extras {
        if *qty == 0 || *qty > limits.max_extra_quantity {
            return Err(AppError::Validation(format!(
                "quantity for extra {} must be 1..={}",
                extra_id, limits.max_extra_quantity
            )));
        }
    }
    Ok(())
}

async fn run_booking(tx: &mut Transaction<'_, Postgres>, order: &BookingOrder) -> Result<i64> {
    let ticket_price = sqlx::query_scalar::<_, f64>(
        "SELECT price::FLOAT FROM showtimes WHERE id = $1",
    )
    .bind(order.showtime_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::ShowtimeNotFound)?;

    // Цены допов берем из каталога, неизвестный или выключенный доп - отказ
    let extra_ids: Vec<i64> = order.extras.keys().copied().collect();
    let priced: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT id, price::FLOAT FROM extras WHERE id = ANY($1) AND status = 'active'",
    )
    .bind(&extra_ids)
    .fetch_all(&mut **tx)
    .await?;
    let price_by_id: BTreeMap<i64, f64> = priced.into_iter().collect();
    for extra_id in &extra_ids {
        if !price_by_id.contains_key(extra_id) {
            return Err(AppError::ExtraNotFound(*extra_id));
        }
    }

    // Пересчет суммы до первой записи; клиентская цифра - только подсказка
    let lines: Vec<(f64, u32)> = order
        .extras
        .iter()
        .map(|(id, qty)| (price_by_id[id], *qty))
        .collect();
    let totals = pricing::order_totals(order.seats.len(), ticket_price, &lines);
    if !pricing::totals_match(totals.total, order.claimed_total) {
        return Err(AppError::TotalMismatch {
            expected: totals.total,
        });
    }

    let sale_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO sales (showtime_id, seats_booked, total_amount, sale_date)
         VALUES ($1, $2, $3, NOW())
         RETURNING id",
    )
    .bind(order.showtime_id)
    .bind(order.seats.len() as i32)
    .bind(totals.total)
    .fetch_one(&mut **tx)
    .await?;

    // Захват мест: строка должна существовать и быть свободной. Две
    // конкурентные брони одного места разойдутся здесь по rows_affected.
    let mut failed: Vec<String> = Vec::new();
    for label in &order.seats {
        let result = sqlx::query(
            "UPDATE seats
             SET is_booked = TRUE, sale_id = $1
             WHERE showtime_id = $2 AND seat_number = $3 AND is_booked = FALSE",
        )
        .bind(sale_id)
        .bind(order.showtime_id)
        .bind(label)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            failed.push(label.clone());
        }
    }

    if !failed.is_empty() {
        // Различаем "место занято" и "строки места вообще нет": второе -
        // ошибка целостности данных, её не маскируем под конфликт
        let existing: Vec<String> = sqlx::query_scalar(
            "SELECT seat_number FROM seats WHERE showtime_id = $1 AND seat_number = ANY($2)",
        )
        .bind(order.showtime_id)
        .bind(&failed)
        .fetch_all(&mut **tx)
        .await?;
        let existing: HashSet<String> = existing.into_iter().collect();
        let missing: Vec<String> = failed
            .iter()
            .filter(|l| !existing.contains(*l))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(AppError::SeatRowsMissing(missing));
        }
        return Err(AppError::SeatsConflict(failed));
    }

    // Кеш доступности: прямой декремент, защищенный условием. Внутри этой
    // же транзакции захваты выше гарантируют, что декремент точный.
    let decremented = sqlx::query(
        "UPDATE showtimes
         SET available_seats = available_seats - $1
         WHERE id = $2 AND available_seats >= $1",
    )
    .bind(order.seats.len() as i32)
    .bind(order.showtime_id)
    .execute(&mut **tx)
    .await?;
    if decremented.rows_affected() == 0 {
        error!(
            "availability underflow for showtime {} while booking sale {}",
            order.showtime_id, sale_id
        );
        return Err(AppError::SeatsConflict(order.seats.clone()));
    }

    for (extra_id, qty) in &order.extras {
        sqlx::query(
            "INSERT INTO sales_extras (sale_id, extra_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(sale_id)
        .bind(extra_id)
        .bind(*qty as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(sale_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> BookingConfig {
        BookingConfig {
            max_seats_per_order: 8,
            max_extra_quantity: 10,
            cart_ttl_seconds: 1800,
        }
    }

    fn order(seats: &[&str]) -> BookingOrder {
        BookingOrder {
            showtime_id: 1,
            seats: seats.iter().map(|s| s.to_string()).collect(),
            extras: BTreeMap::new(),
            claimed_total: 0.0,
        }
    }

    #[test]
    fn empty_seat_list_is_rejected() {
        let err = validate_order(&limits(), &order(&[])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn nine_seats_are_rejected() {
        let nine: Vec<&str> = vec!["A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9"];
        let err = validate_order(&limits(), &order(&nine)).unwrap_err();
        assert!(matches!(err, AppError::SeatLimitReached(8)));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = validate_order(&limits(), &order(&["A1", "A1"])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn zero_and_oversized_quantities_are_rejected() {
        let mut o = order(&["A1"]);
        o.extras.insert(3, 0);
        assert!(validate_order(&limits(), &o).is_err());
        o.extras.insert(3, 11);
        assert!(validate_order(&limits(), &o).is_err());
        o.extras.insert(3, 10);
        assert!(validate_order(&limits(), &o).is_ok());
    }

    /* ---------- тесты против настоящей БД (пропускаются без DATABASE_URL) ---------- */

    use crate::services::ledger;
    use crate::test_support;

    fn order_for(showtime_id: i64, seats: &[&str], claimed_total: f64) -> BookingOrder {
        BookingOrder {
            showtime_id,
            seats: seats.iter().map(|s| s.to_string()).collect(),
            extras: BTreeMap::new(),
            claimed_total,
        }
    }

    async fn seeded_showtime(pool: &PgPool, total_seats: i32, price: f64) -> i64 {
        let movie_id = test_support::seed_movie(pool, "Booking Feature", "active").await;
        test_support::seed_showtime(pool, movie_id, 1, total_seats, price).await
    }

    #[tokio::test]
    async fn committed_booking_links_seats_and_extras_to_the_sale() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let showtime_id = seeded_showtime(&pool, 20, 12.50).await;
        let extra_id = test_support::seed_extra(&pool, "Popcorn", 5.00).await;

        let mut o = order_for(showtime_id, &["A1", "A2"], 40.00);
        o.extras.insert(extra_id, 3);

        let sale_id = commit_booking(&pool, &limits(), &o).await.unwrap();

        // чек потом читает места по sale_id - линковка должна быть точной
        let seats: Vec<String> = sqlx::query_scalar(
            "SELECT seat_number FROM seats WHERE sale_id = $1 ORDER BY seat_number",
        )
        .bind(sale_id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(seats, vec!["A1", "A2"]);

        let (total, qty): (f64, i32) = sqlx::query_as(
            "SELECT s.total_amount::FLOAT, se.quantity
             FROM sales s JOIN sales_extras se ON se.sale_id = s.id
             WHERE s.id = $1",
        )
        .bind(sale_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(pricing::totals_match(total, 40.00));
        assert_eq!(qty, 3);

        assert_eq!(test_support::available_seats(&pool, showtime_id).await, 18);
    }

    #[tokio::test]
    async fn conflicting_seat_rolls_back_the_entire_booking() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let showtime_id = seeded_showtime(&pool, 20, 10.00).await;
        let extra_id = test_support::seed_extra(&pool, "Soda", 3.00).await;

        commit_booking(&pool, &limits(), &order_for(showtime_id, &["A3"], 10.00))
            .await
            .unwrap();

        // A1 захватится внутри транзакции, A3 даст конфликт - и всё
        // должно откатиться: ни продажи, ни мест, ни допов
        let mut o = order_for(showtime_id, &["A1", "A3"], 23.00);
        o.extras.insert(extra_id, 1);
        let err = commit_booking(&pool, &limits(), &o).await.unwrap_err();
        match err {
            AppError::SeatsConflict(labels) => assert_eq!(labels, vec!["A3"]),
            other => panic!("expected SeatsConflict, got {:?}", other),
        }

        assert_eq!(test_support::sales_count(&pool, showtime_id).await, 1);
        assert_eq!(test_support::booked_count(&pool, showtime_id).await, 1);
        assert_eq!(test_support::available_seats(&pool, showtime_id).await, 19);

        let extras_lines: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales_extras se
             JOIN sales s ON s.id = se.sale_id
             WHERE s.showtime_id = $1",
        )
        .bind(showtime_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(extras_lines, 0);
    }

    #[tokio::test]
    async fn concurrent_bookings_of_one_seat_yield_one_success_one_conflict() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let showtime_id = seeded_showtime(&pool, 20, 10.00).await;

        let first = order_for(showtime_id, &["B1"], 10.00);
        let second = order_for(showtime_id, &["B1"], 10.00);
        let limits = limits();
        let (r1, r2) = tokio::join!(
            commit_booking(&pool, &limits, &first),
            commit_booking(&pool, &limits, &second),
        );

        assert!(
            r1.is_ok() != r2.is_ok(),
            "expected exactly one winner, got {:?} / {:?}",
            r1,
            r2
        );
        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(loser.unwrap_err(), AppError::SeatsConflict(_)));

        assert_eq!(test_support::sales_count(&pool, showtime_id).await, 1);
        assert_eq!(test_support::booked_count(&pool, showtime_id).await, 1);
        assert_eq!(test_support::available_seats(&pool, showtime_id).await, 19);
    }

    #[tokio::test]
    async fn availability_tracks_booked_count_through_bookings_and_toggles() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let showtime_id = seeded_showtime(&pool, 20, 10.00).await;

        commit_booking(
            &pool,
            &limits(),
            &order_for(showtime_id, &["A1", "A2", "A3"], 30.00),
        )
        .await
        .unwrap();

        let seat_id = |label: &str| {
            let pool = pool.clone();
            let label = label.to_string();
            async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT id FROM seats WHERE showtime_id = $1 AND seat_number = $2",
                )
                .bind(showtime_id)
                .bind(label)
                .fetch_one(&pool)
                .await
                .unwrap()
            }
        };

        // админ вручную занимает B1 и освобождает A1
        ledger::toggle_seat(&pool, seat_id("B1").await, false)
            .await
            .unwrap();
        ledger::toggle_seat(&pool, seat_id("A1").await, true)
            .await
            .unwrap();

        // устаревший экран: B1 уже занято, второй toggle с тем же
        // ожиданием должен отлететь
        let stale = ledger::toggle_seat(&pool, seat_id("B1").await, false).await;
        assert!(matches!(stale.unwrap_err(), AppError::ToggleConflict));

        let booked = test_support::booked_count(&pool, showtime_id).await;
        assert_eq!(booked, 3); // A2, A3, B1
        assert_eq!(
            test_support::available_seats(&pool, showtime_id).await,
            20 - booked as i32
        );
    }
}
