pub mod catalog;
pub mod seats;
pub mod cart;
pub mod checkout;
pub mod receipt;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(catalog::routes())
        .merge(seats::routes())
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(receipt::routes())
}
