//! SeaORM entities.

pub mod post;
pub mod user;
pub mod vote;
