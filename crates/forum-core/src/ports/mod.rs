//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mailer;
mod rate_limit;
mod repository;
mod reset_token;
mod transaction;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use mailer::{MailError, Mailer, OutgoingMail};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, PostRepository, UserRepository, VoteRepository};
pub use reset_token::{ResetTokenError, ResetTokenStore};
pub use transaction::{Transaction, UnitOfWork};
