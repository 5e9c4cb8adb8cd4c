//! Owned-resource operations over posts.
//! Reads are public; every mutating operation consults the authorization gate
//! before touching the store, in the order the API promises: authentication
//! first, then existence, then ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::identity::{RequestContext, require_identity, require_ownership};
use crate::storage::{Post, PostPatch, PublicUser, SharedStore, Store};

/// Post as served by the API: the author relation resolved to a public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: PublicUser,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

fn view(store: &Store, post: &Post) -> Result<PostView, AppError> {
    let author = store
        .find_user_by_id(&post.author)
        .map(|u| u.to_public())
        .ok_or_else(|| AppError::internal("dangling_author", "post author no longer exists"))?;
    Ok(PostView {
        id: post.id.clone(),
        title: post.title.clone(),
        content: post.content.clone(),
        author,
        published: post.published,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

/// All posts, newest first. Public.
pub fn list_posts(store: &SharedStore) -> Result<Vec<PostView>, AppError> {
    let guard = store.0.lock();
    guard.posts().iter().map(|p| view(&guard, p)).collect()
}

/// A single post by id. Public.
pub fn get_post(store: &SharedStore, id: &str) -> Result<PostView, AppError> {
    let guard = store.0.lock();
    let Some(post) = guard.post(id) else {
        return Err(AppError::not_found("not_found", "post not found"));
    };
    view(&guard, post)
}

/// The caller's posts, newest first.
pub fn my_posts(store: &SharedStore, ctx: &RequestContext) -> Result<Vec<PostView>, AppError> {
    let user_id = require_identity(ctx)?;
    let guard = store.0.lock();
    guard.posts_by_author(user_id).iter().map(|p| view(&guard, p)).collect()
}

/// Create a post owned by the caller. Posts start unpublished.
pub fn create_post(
    store: &SharedStore,
    ctx: &RequestContext,
    req: &CreatePostRequest,
) -> Result<PostView, AppError> {
    let user_id = require_identity(ctx)?;
    let post = Post::new(&req.title, &req.content, user_id);
    let mut guard = store.0.lock();
    guard.insert_post(&post)?;
    info!(target: "posts", "create post={} author={}", post.id, user_id);
    view(&guard, &post)
}

/// Partially update a post. Only the owner may mutate it.
pub fn update_post(
    store: &SharedStore,
    ctx: &RequestContext,
    id: &str,
    patch: &PostPatch,
) -> Result<PostView, AppError> {
    require_identity(ctx)?;
    let mut guard = store.0.lock();
    let Some(author) = guard.post(id).map(|p| p.author.clone()) else {
        return Err(AppError::not_found("not_found", "post not found"));
    };
    require_ownership(ctx, &author)?;
    let updated = guard.update_post(id, patch)?;
    view(&guard, &updated)
}

/// Delete a post. Only the owner may delete it.
pub fn delete_post(store: &SharedStore, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
    let user_id = require_identity(ctx)?;
    let mut guard = store.0.lock();
    let Some(author) = guard.post(id).map(|p| p.author.clone()) else {
        return Err(AppError::not_found("not_found", "post not found"));
    };
    require_ownership(ctx, &author)?;
    guard.delete_post(id)?;
    info!(target: "posts", "delete post={} author={}", id, user_id);
    Ok(())
}
