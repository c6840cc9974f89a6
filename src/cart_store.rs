use redis::AsyncCommands;
use tracing::info;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::Result;
use crate::redis_client::RedisClient;

/// Redis-backed staging area for carts.
///
/// Каждая корзина лежит отдельным ключом с TTL; брошенные корзины
/// протухают сами, успешный чекаут удаляет ключ явно.
#[derive(Clone)]
pub struct CartStore {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl CartStore {
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(cart_id: Uuid) -> String {
        format!("cart:{}", cart_id)
    }

    pub async fn save(&self, cart: &Cart) -> Result<()> {
        let data = serde_json::to_string(cart)?;
        let mut conn = self.redis.conn.clone();
        let _: () = conn.set_ex(Self::key(cart.id), data, self.ttl_seconds).await?;
        Ok(())
    }

    pub async fn load(&self, cart_id: Uuid) -> Result<Option<Cart>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(Self::key(cart_id)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, cart_id: Uuid) {
        let mut conn = self.redis.conn.clone();
        // Не критично, если удаление упадёт — TTL добьёт ключ
        let res: std::result::Result<(), _> = conn.del(Self::key(cart_id)).await;
        if res.is_err() {
            info!("failed to delete cart {}, ttl will expire it", cart_id);
        }
    }
}
