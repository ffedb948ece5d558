//! # Forum Infrastructure
//!
//! Concrete implementations of the ports defined in `forum-core`.
//! This crate contains database, token store, and external service integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `rate-limit` - Rate limiting via governor
//! - `redis` - Redis-backed password reset tokens

pub mod auth;
pub mod database;
pub mod mail;
pub mod memory;
pub mod reset_tokens;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::DatabaseConfig;
pub use mail::LogMailer;
pub use memory::InMemoryStore;
pub use reset_tokens::InMemoryResetTokenStore;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use reset_tokens::{RedisConfig, RedisResetTokenStore};
