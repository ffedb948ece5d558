use chrono::{DateTime, SecondsFormat, Utc};

use super::Post;
use crate::error::{DomainError, FieldError};

/// Pagination token: the `created_at` of the last post on the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub DateTime<Utc>);

impl Cursor {
    /// Parse a cursor echoed back by a client. Must be RFC 3339.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| Cursor(dt.with_timezone(&Utc)))
            .map_err(|_| {
                DomainError::Validation(vec![FieldError::new(
                    "cursor",
                    "Cursor must be an RFC 3339 timestamp",
                )])
            })
    }

    /// Wire form, with enough precision to round-trip database timestamps.
    pub fn encode(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// One page of the post feed, newest first.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub total_count: u64,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub posts: Vec<Post>,
}
