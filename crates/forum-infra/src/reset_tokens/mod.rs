//! Password reset token stores - Redis and in-memory fallback.

mod memory;

pub use memory::InMemoryResetTokenStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisResetTokenStore};
