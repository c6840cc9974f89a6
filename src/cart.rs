use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Staged order for one showtime: chosen seats plus extra-item quantities.
///
/// Раньше это жило в localStorage киоска; теперь это явный объект состояния,
/// который стадии seat-selection → extras → checkout передают друг другу
/// через CartStore. Ничего из корзины не попадает в БД до самого чекаута.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub showtime_id: i64,
    // порядок выбора сохраняем, как его видел пользователь
    pub seats: Vec<String>,
    pub extras: BTreeMap<i64, u32>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(showtime_id: i64) -> Self {
        Cart {
            id: Uuid::new_v4(),
            showtime_id,
            seats: Vec::new(),
            extras: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Adds a seat label. Selecting an already-selected seat is a no-op,
    /// selecting past `max_seats` is rejected.
    pub fn select_seat(&mut self, label: &str, max_seats: usize) -> Result<()> {
        if self.seats.iter().any(|s| s == label) {
            return Ok(());
        }
        if self.seats.len() >= max_seats {
            return Err(AppError::SeatLimitReached(max_seats));
        }
        self.seats.push(label.to_string());
        self.touch();
        Ok(())
    }

    pub fn deselect_seat(&mut self, label: &str) {
        self.seats.retain(|s| s != label);
        self.touch();
    }

    /// Sets the quantity for an extra, clamped into `0..=max_quantity`.
    /// Quantity zero drops the line entirely.
    pub fn set_extra_quantity(&mut self, extra_id: i64, quantity: i64, max_quantity: u32) {
        let clamped = quantity.clamp(0, max_quantity as i64) as u32;
        if clamped == 0 {
            self.extras.remove(&extra_id);
        } else {
            self.extras.insert(extra_id, clamped);
        }
        self.touch();
    }

    /// `seats × price + Σ qty × extra price`. Pure; prices come from the
    /// caller so the cart never talks to the database.
    pub fn compute_total(&self, ticket_price: f64, extra_prices: &BTreeMap<i64, f64>) -> f64 {
        let tickets = self.seats.len() as f64 * ticket_price;
        let extras: f64 = self
            .extras
            .iter()
            .map(|(id, qty)| extra_prices.get(id).copied().unwrap_or(0.0) * *qty as f64)
            .sum();
        tickets + extras
    }

    /// Корзина привязана ровно к одному сеансу; чужая корзина невалидна.
    pub fn belongs_to(&self, showtime_id: i64) -> bool {
        self.showtime_id == showtime_id
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
