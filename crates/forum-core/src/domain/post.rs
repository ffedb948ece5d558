use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters kept in a post's text snippet.
pub const SNIPPET_LEN: usize = 50;

/// Post entity - a titled text submission that collects votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    /// Running tally of vote values. Only the vote ledger writes it.
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with zero points.
    pub fn new(author_id: Uuid, title: String, text: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// First [`SNIPPET_LEN`] characters of the text.
    pub fn text_snippet(&self) -> &str {
        match self.text.char_indices().nth(SNIPPET_LEN) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}
