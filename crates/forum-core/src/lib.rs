//! # Forum Core
//!
//! The domain layer of the forum backend: entities, ports, and the services
//! that own the voting ledger and the post feed.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod context;
pub mod domain;
pub mod error;
pub mod loader;
pub mod ports;
pub mod services;
pub mod validation;

pub use context::RequestContext;
pub use error::{DomainError, FieldError};
