#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use forum_core::domain::{Post, User};
use forum_core::ports::BaseRepository;
use forum_core::services::{PostFeed, PostService, VoteLedger};
use forum_infra::InMemoryStore;

pub struct Harness {
    pub store: InMemoryStore,
    pub ledger: VoteLedger,
    pub posts: PostService,
    pub feed: PostFeed,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        Self {
            ledger: VoteLedger::new(shared.clone()),
            posts: PostService::new(shared.clone(), shared.clone()),
            feed: PostFeed::new(shared),
            store,
        }
    }

    pub async fn user(&self, username: &str) -> Uuid {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "not-a-real-hash".to_string(),
        );
        BaseRepository::<User, Uuid>::insert(&self.store, user)
            .await
            .unwrap()
            .id
    }

    pub async fn post_at(&self, author_id: Uuid, created_at: DateTime<Utc>) -> Post {
        let mut post = Post::new(author_id, "A title".to_string(), "Some text".to_string());
        post.created_at = created_at;
        post.updated_at = created_at;
        BaseRepository::<Post, Uuid>::insert(&self.store, post)
            .await
            .unwrap()
    }

    pub async fn post(&self, author_id: Uuid) -> Post {
        self.post_at(author_id, Utc::now()).await
    }

    /// `count` posts one minute apart, returned newest first.
    pub async fn timeline(&self, author_id: Uuid, count: i64) -> Vec<Post> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut posts = Vec::new();
        for i in 0..count {
            posts.push(self.post_at(author_id, start + Duration::minutes(i)).await);
        }
        posts.reverse();
        posts
    }

    pub async fn stored_post(&self, id: Uuid) -> Option<Post> {
        BaseRepository::<Post, Uuid>::find_by_id(&self.store, id)
            .await
            .unwrap()
    }
}
