//! In-memory implementation of every storage port.
//!
//! Tables sit behind one mutex that is only held for the duration of a
//! single read or write. An [`InMemoryTransaction`] holds a per-post row
//! lock from [`lock_post`](Transaction::lock_post) until it ends, which
//! also covers that post's vote rows, and keeps an undo log so that
//! rollback (explicit or on drop) restores every row it touched. Data is
//! lost on process restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use uuid::Uuid;

use forum_core::domain::{Post, User, Vote};
use forum_core::error::RepoError;
use forum_core::ports::{
    BaseRepository, PostRepository, Transaction, UnitOfWork, UserRepository, VoteRepository,
};

type VoteKey = (Uuid, Uuid);

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    votes: HashMap<VoteKey, Vote>,
}

/// Row locks by post id. Entries are dropped once no transaction holds or
/// waits on them.
type RowLocks = Arc<Mutex<HashMap<Uuid, Arc<RowLock<()>>>>>;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    row_locks: RowLocks,
    conflict_on_commit: Arc<AtomicBool>,
}

fn lock_tables(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    // A panic mid-write leaves no partial row behind, so a poisoned guard is
    // still consistent.
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        lock_tables(&self.tables)
    }

    /// Make the next transaction commit fail with [`RepoError::Conflict`]
    /// and roll back, as a concurrent writer would cause.
    pub fn inject_commit_conflict(&self) {
        self.conflict_on_commit.store(true, Ordering::SeqCst);
    }

    pub async fn vote_count(&self) -> usize {
        self.tables().votes.len()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables();

        let clash = tables.users.values().any(|u| {
            u.id == user.id || u.username == user.username || u.email == user.email
        });
        if clash {
            return Err(RepoError::Constraint("users: duplicate key".to_string()));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        // ON DELETE CASCADE: posts by the user, their votes, and the user's votes
        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in &authored {
            tables.posts.remove(post_id);
        }
        tables
            .votes
            .retain(|(post_id, user_id), _| *user_id != id && !authored.contains(post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables();
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let user = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables().posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables();
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts: duplicate key".to_string()));
        }
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("posts: unknown author".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.votes.retain(|(post_id, _), _| *post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_page(
        &self,
        limit: u64,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables();

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| before.is_none_or(|b| p.created_at < b))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_oldest(&self) -> Result<Option<Post>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .posts
            .values()
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.tables().posts.len() as u64)
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<Option<Post>, RepoError> {
        let mut tables = self.tables();
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };

        post.title = title.to_string();
        post.text = text.to_string();
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }
}

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn find_by_post_and_user(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        let tables = self.tables();
        Ok(tables.votes.get(&(post_id, user_id)).cloned())
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Vote>, RepoError> {
        let tables = self.tables();
        Ok(post_ids
            .iter()
            .filter_map(|post_id| tables.votes.get(&(*post_id, user_id)).cloned())
            .collect())
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Vote>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .votes
            .values()
            .filter(|v| v.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepoError> {
        Ok(Box::new(InMemoryTransaction {
            tables: self.tables.clone(),
            row_locks: self.row_locks.clone(),
            held: Vec::new(),
            undo: Vec::new(),
            conflict_on_commit: self.conflict_on_commit.clone(),
        }))
    }
}

/// Prior state of a row touched inside a transaction.
enum Undo {
    Points(Uuid, i32),
    Post(Uuid, Post),
    Vote(VoteKey, Option<Vote>),
}

pub struct InMemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    row_locks: RowLocks,
    held: Vec<(Uuid, OwnedMutexGuard<()>)>,
    undo: Vec<Undo>,
    conflict_on_commit: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        lock_tables(&self.tables)
    }

    fn revert(&mut self) {
        let mut tables = lock_tables(&self.tables);
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Points(id, points) => {
                    if let Some(post) = tables.posts.get_mut(&id) {
                        post.points = points;
                    }
                }
                Undo::Post(id, prev) => {
                    tables.posts.insert(id, prev);
                }
                Undo::Vote(key, Some(prev)) => {
                    tables.votes.insert(key, prev);
                }
                Undo::Vote(key, None) => {
                    tables.votes.remove(&key);
                }
            }
        }
    }

    fn release_row_locks(&mut self) {
        let mut row_locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        for (post_id, guard) in self.held.drain(..) {
            drop(guard);
            // Only the registry still references an idle lock.
            if row_locks
                .get(&post_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                row_locks.remove(&post_id);
            }
        }
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        self.revert();
        self.release_row_locks();
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn lock_post(&mut self, id: Uuid) -> Result<Option<Post>, RepoError> {
        if !self.held.iter().any(|(post_id, _)| *post_id == id) {
            let lock = self
                .row_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_default()
                .clone();
            let guard = lock.lock_owned().await;
            self.held.push((id, guard));
        }

        Ok(self.tables().posts.get(&id).cloned())
    }

    async fn find_vote(
        &mut self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        Ok(self.tables().votes.get(&(post_id, user_id)).cloned())
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepoError> {
        let key = (vote.post_id, vote.user_id);
        let mut tables = lock_tables(&self.tables);
        if tables.votes.contains_key(&key) {
            return Err(RepoError::Conflict("votes: duplicate key".to_string()));
        }
        if !tables.posts.contains_key(&vote.post_id) {
            return Err(RepoError::Constraint("votes: unknown post".to_string()));
        }

        tables.votes.insert(key, vote.clone());
        self.undo.push(Undo::Vote(key, None));
        Ok(())
    }

    async fn update_vote(&mut self, vote: &Vote) -> Result<(), RepoError> {
        let key = (vote.post_id, vote.user_id);
        let mut tables = lock_tables(&self.tables);
        let prev = tables.votes.get(&key).cloned().ok_or(RepoError::NotFound)?;

        tables.votes.insert(key, vote.clone());
        self.undo.push(Undo::Vote(key, Some(prev)));
        Ok(())
    }

    async fn set_points(&mut self, post_id: Uuid, points: i32) -> Result<(), RepoError> {
        let mut tables = lock_tables(&self.tables);
        let post = tables.posts.get_mut(&post_id).ok_or(RepoError::NotFound)?;

        self.undo.push(Undo::Points(post_id, post.points));
        post.points = points;
        Ok(())
    }

    async fn delete_votes_by_post(&mut self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = lock_tables(&self.tables);
        let keys: Vec<VoteKey> = tables
            .votes
            .keys()
            .filter(|(p, _)| *p == post_id)
            .copied()
            .collect();

        for key in &keys {
            let prev = tables.votes.remove(key);
            self.undo.push(Undo::Vote(*key, prev));
        }
        Ok(keys.len() as u64)
    }

    async fn delete_post(&mut self, post_id: Uuid) -> Result<(), RepoError> {
        let mut tables = lock_tables(&self.tables);
        if tables.votes.keys().any(|(p, _)| *p == post_id) {
            return Err(RepoError::Constraint("votes reference this post".to_string()));
        }

        let prev = tables.posts.remove(&post_id).ok_or(RepoError::NotFound)?;
        self.undo.push(Undo::Post(post_id, prev));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let mut this = self;
        if this.conflict_on_commit.swap(false, Ordering::SeqCst) {
            // Drop reverts the undo log.
            return Err(RepoError::Conflict(
                "could not serialize access due to concurrent update".to_string(),
            ));
        }

        this.undo.clear();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        let mut this = self;
        this.revert();
        Ok(())
    }
}
