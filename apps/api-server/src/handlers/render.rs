//! Domain entities to wire DTOs.

use uuid::Uuid;

use forum_core::domain::{Post, User};
use forum_core::{DomainError, RequestContext};
use forum_shared::dto::{PostResponse, UserResponse};

/// A user's email is only shown to that user.
pub fn user_response(user: User, viewer: Option<Uuid>) -> UserResponse {
    let email = if viewer == Some(user.id) {
        user.email
    } else {
        String::new()
    };

    UserResponse {
        id: user.id,
        username: user.username,
        email,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Render posts with their authors and the caller's vote on each, batching
/// lookups through the request's loaders.
pub async fn post_responses(
    ctx: &RequestContext,
    posts: Vec<Post>,
) -> Result<Vec<PostResponse>, DomainError> {
    let author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

    let (authors, vote_types) = tokio::try_join!(
        ctx.users.load_many(&author_ids),
        ctx.vote_types(&post_ids),
    )?;

    Ok(posts
        .into_iter()
        .zip(authors)
        .zip(vote_types)
        .map(|((post, author), vote_type)| PostResponse {
            id: post.id,
            text_snippet: post.text_snippet().to_string(),
            title: post.title,
            text: post.text,
            points: post.points,
            author: author.map(|a| user_response(a, ctx.caller)),
            vote_type,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
        .collect())
}

pub async fn post_response(ctx: &RequestContext, post: Post) -> Result<PostResponse, DomainError> {
    let id = post.id;
    post_responses(ctx, vec![post])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal(format!("post {id} lost while rendering")))
}
