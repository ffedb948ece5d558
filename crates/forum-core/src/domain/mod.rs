//! Domain entities - the core business objects.

mod feed;
mod post;
mod user;
mod vote;

pub use feed::{Cursor, FeedPage};
pub use post::Post;
pub use user::{User, mask_email};
pub use vote::{InvalidVoteValue, Vote, VoteValue};
