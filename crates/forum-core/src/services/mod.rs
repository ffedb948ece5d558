//! Application services - the operations the transport layer calls.

mod accounts;
mod post_feed;
mod posts;
mod vote_ledger;

pub use accounts::{AccountService, ResetPolicy};
pub use post_feed::{MAX_PAGE_SIZE, PostFeed, clamp_limit};
pub use posts::PostService;
pub use vote_ledger::{VoteLedger, VoteTransition};
