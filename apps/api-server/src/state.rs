//! Application state - shared across all handlers.

use std::sync::Arc;

use forum_core::ports::{
    Mailer, PasswordService, PostRepository, RateLimiter, ResetTokenStore, TokenService,
    UnitOfWork, UserRepository, VoteRepository,
};
use forum_core::services::{AccountService, PostFeed, PostService, VoteLedger};
use forum_infra::{
    Argon2PasswordService, InMemoryResetTokenStore, InMemoryStore, JwtTokenService, LogMailer,
};

use crate::config::{AppConfig, SessionConfig};

/// The storage ports, backed by one store.
struct Storage {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl Storage {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            votes: store.clone(),
            uow: store,
        }
    }

    #[cfg(feature = "postgres")]
    async fn connect(config: Option<&forum_infra::DatabaseConfig>) -> Self {
        use forum_infra::database::{
            PostgresPostRepository, PostgresUnitOfWork, PostgresUserRepository,
            PostgresVoteRepository, connect,
        };

        let Some(config) = config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::in_memory();
        };

        match connect(config).await {
            Ok(db) => Self {
                users: Arc::new(PostgresUserRepository::new(db.clone())),
                posts: Arc::new(PostgresPostRepository::new(db.clone())),
                votes: Arc::new(PostgresVoteRepository::new(db.clone())),
                uow: Arc::new(PostgresUnitOfWork::new(db)),
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                Self::in_memory()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn connect(_config: Option<&forum_infra::DatabaseConfig>) -> Self {
        tracing::info!("Running without postgres feature - using in-memory store");
        Self::in_memory()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub feed: Arc<PostFeed>,
    pub ledger: Arc<VoteLedger>,
    /// Read ports for building per-request loaders.
    pub users: Arc<dyn UserRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub session: SessionConfig,
    /// `None` disables rate limiting.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: AppConfig) -> Self {
        let storage = Storage::connect(config.database.as_ref()).await;
        let reset_tokens = reset_token_store().await;

        #[cfg(feature = "rate-limit")]
        let rate_limiter: Option<Arc<dyn RateLimiter>> =
            Some(Arc::new(forum_infra::InMemoryRateLimiter::from_env()));
        #[cfg(not(feature = "rate-limit"))]
        let rate_limiter: Option<Arc<dyn RateLimiter>> = None;

        let state = Self::assemble(storage, reset_tokens, rate_limiter, config);
        tracing::info!("Application state initialized");
        state
    }

    /// In-memory state with no rate limiting, for tests.
    #[cfg(test)]
    pub fn in_memory(config: AppConfig) -> Self {
        Self::assemble(
            Storage::in_memory(),
            Arc::new(InMemoryResetTokenStore::new()),
            None,
            config,
        )
    }

    fn assemble(
        storage: Storage,
        reset_tokens: Arc<dyn ResetTokenStore>,
        rate_limiter: Option<Arc<dyn RateLimiter>>,
        config: AppConfig,
    ) -> Self {
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt));

        let accounts = AccountService::new(
            storage.users.clone(),
            passwords,
            reset_tokens,
            mailer,
            config.reset,
        );

        Self {
            accounts: Arc::new(accounts),
            posts: Arc::new(PostService::new(storage.posts.clone(), storage.uow.clone())),
            feed: Arc::new(PostFeed::new(storage.posts)),
            ledger: Arc::new(VoteLedger::new(storage.uow)),
            users: storage.users,
            votes: storage.votes,
            tokens,
            session: config.session,
            rate_limiter,
        }
    }
}

#[cfg(feature = "redis")]
async fn reset_token_store() -> Arc<dyn ResetTokenStore> {
    use forum_infra::{RedisConfig, RedisResetTokenStore};

    let Some(config) = RedisConfig::from_env() else {
        return Arc::new(InMemoryResetTokenStore::new());
    };

    match RedisResetTokenStore::new(&config).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis. Reset tokens kept in memory.");
            Arc::new(InMemoryResetTokenStore::new())
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn reset_token_store() -> Arc<dyn ResetTokenStore> {
    Arc::new(InMemoryResetTokenStore::new())
}
