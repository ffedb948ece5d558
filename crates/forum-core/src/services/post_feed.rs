//! Cursor pagination over posts, newest first.

use std::sync::Arc;

use crate::domain::{Cursor, FeedPage};
use crate::error::DomainError;
use crate::ports::PostRepository;

/// Hard ceiling on page size, whatever the caller asks for.
pub const MAX_PAGE_SIZE: u64 = 10;

/// Clamp a requested limit into `1..=MAX_PAGE_SIZE`.
pub fn clamp_limit(requested: i64) -> u64 {
    requested.clamp(1, MAX_PAGE_SIZE as i64) as u64
}

pub struct PostFeed {
    posts: Arc<dyn PostRepository>,
}

impl PostFeed {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Fetch the page after `cursor`, or the newest page without one.
    ///
    /// A page is strictly older than its cursor, so posts sharing the
    /// cursor's exact timestamp are skipped.
    pub async fn list(&self, limit: i64, cursor: Option<Cursor>) -> Result<FeedPage, DomainError> {
        let limit = clamp_limit(limit);

        let (total_count, posts) = futures::try_join!(
            self.posts.count(),
            self.posts.find_page(limit, cursor.map(|c| c.0)),
        )?;

        // Past the end of the data: nothing to anchor the next cursor on.
        let Some(last) = posts.last() else {
            return Ok(FeedPage {
                total_count,
                cursor: None,
                has_more: false,
                posts,
            });
        };
        let next_cursor = Cursor(last.created_at);

        let has_more = match cursor {
            None => posts.len() as u64 != total_count,
            // More pages exist unless this page already reached the oldest post.
            Some(_) => match self.posts.find_oldest().await? {
                Some(oldest) => oldest.created_at != last.created_at,
                None => false,
            },
        };

        tracing::debug!(
            limit,
            returned = posts.len(),
            total_count,
            has_more,
            "Feed page fetched"
        );

        Ok(FeedPage {
            total_count,
            cursor: Some(next_cursor),
            has_more,
            posts,
        })
    }
}
