use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Лимиты процесса бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub max_seats_per_order: usize,
    pub max_extra_quantity: u32,
    pub cart_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_kiosk=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").expect("REDIS_URL must be set"),
            },
            booking: BookingConfig {
                max_seats_per_order: env::var("MAX_SEATS_PER_ORDER")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .expect("MAX_SEATS_PER_ORDER must be a valid number"),
                max_extra_quantity: env::var("MAX_EXTRA_QUANTITY")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("MAX_EXTRA_QUANTITY must be a valid number"),
                cart_ttl_seconds: env::var("CART_TTL_SECONDS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .expect("CART_TTL_SECONDS must be a valid number"),
            },
        }
    }
}
