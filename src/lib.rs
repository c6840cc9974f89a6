pub mod config;
pub mod database;
pub mod redis_client;
pub mod error;
pub mod models;
pub mod cart;
pub mod cart_store;
pub mod controllers;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub carts: cart_store::CartStore,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let carts = cart_store::CartStore::new(redis.clone(), config.booking.cart_ttl_seconds);

        Ok(Arc::new(Self {
            db,
            redis,
            carts,
            config,
        }))
    }
}
