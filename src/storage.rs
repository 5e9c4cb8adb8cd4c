//!
//! quillboard storage module
//! -------------------------
//! File-backed store for identities and posts under a configured root folder.
//! Each collection persists as a JSON document (`users.json`, `posts.json`)
//! rewritten on every mutation; the store is loaded once at startup and kept
//! in memory behind a mutex.
//!
//! Key responsibilities:
//! - Authoritative uniqueness enforcement for username/email at insert time.
//!   Callers may pre-check for a friendlier error, but the check inside
//!   `insert_user` runs under the store lock and is the actual guard.
//! - Ownership data: every post carries an immutable `author` id.
//! - Write-through persistence so a restart observes all committed mutations.
//!
//! The public API centers around the `Store` type, wrapped in a thread-safe
//! `SharedStore` (`Arc<Mutex<Store>>`) elsewhere in the codebase.

use std::sync::Arc;
use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;

/// Stored identity record. `password_hash` is an opaque PHC string and never
/// crosses the API boundary; responses use `PublicUser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// API-safe view of a user: everything except the secret hash.
/// Serialized in the camelCase the dashboard client expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// An owned resource. `author` references `User.id` and is immutable after
/// creation; only that identity may mutate or delete the post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: &str, content: &str, author: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            author: author.to_string(),
            published: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a post; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

pub struct Store {
    root: PathBuf,
    users: Vec<User>,
    posts: Vec<Post>,
}

impl Store {
    /// Open (or initialize) a store rooted at the given folder.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create or access store root: {}", root.display()))?;
        let users = load_collection(&root.join(USERS_FILE))?;
        let posts = load_collection(&root.join(POSTS_FILE))?;
        debug!(target: "storage", "store opened: root={}, users={}, posts={}", root.display(), users.len(), posts.len());
        Ok(Self { root, users, posts })
    }

    // --- users ---

    /// True when a user with this username OR email already exists.
    /// Comparisons are case-insensitive.
    pub fn identity_taken(&self, username: &str, email: &str) -> bool {
        self.users.iter().any(|u| {
            u.username.eq_ignore_ascii_case(username) || u.email.eq_ignore_ascii_case(email)
        })
    }

    /// Insert a new user. The uniqueness re-check here runs under the store
    /// lock and is the authoritative constraint.
    pub fn insert_user(&mut self, user: &User) -> Result<(), AppError> {
        if self.identity_taken(&user.username, &user.email) {
            return Err(AppError::conflict(
                "duplicate_identity",
                "a user with this email or username already exists",
            ));
        }
        self.users.push(user.clone());
        self.persist_users()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn find_user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    // --- posts ---

    pub fn insert_post(&mut self, post: &Post) -> Result<(), AppError> {
        self.posts.push(post.clone());
        self.persist_posts()
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// All posts, newest first.
    pub fn posts(&self) -> Vec<Post> {
        let mut out = self.posts.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Posts by a single author, newest first.
    pub fn posts_by_author(&self, author: &str) -> Vec<Post> {
        let mut out: Vec<Post> = self.posts.iter().filter(|p| p.author == author).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Apply a partial update. `author` and `created_at` are immutable.
    pub fn update_post(&mut self, id: &str, patch: &PostPatch) -> Result<Post, AppError> {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == id) else {
            return Err(post_not_found());
        };
        if let Some(title) = &patch.title { post.title = title.clone(); }
        if let Some(content) = &patch.content { post.content = content.clone(); }
        if let Some(published) = patch.published { post.published = published; }
        post.updated_at = Utc::now();
        let updated = post.clone();
        self.persist_posts()?;
        Ok(updated)
    }

    pub fn delete_post(&mut self, id: &str) -> Result<(), AppError> {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return Err(post_not_found());
        }
        self.persist_posts()
    }

    // --- persistence ---

    fn persist_users(&self) -> Result<(), AppError> {
        persist_collection(&self.root.join(USERS_FILE), &self.users)
    }

    fn persist_posts(&self) -> Result<(), AppError> {
        persist_collection(&self.root.join(POSTS_FILE), &self.posts)
    }
}

const USERS_FILE: &str = "users.json";
const POSTS_FILE: &str = "posts.json";

fn post_not_found() -> AppError {
    AppError::not_found("not_found", "post not found")
}

fn load_collection<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(items)
}

fn persist_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), AppError> {
    let raw = serde_json::to_string_pretty(items)
        .map_err(|e| AppError::io("storage_io", e.to_string()))?;
    fs::write(path, raw).map_err(|e| AppError::io("storage_io", e.to_string()))
}

/// Cheap-clone handle to the store shared across request handlers.
#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::new(root)?))))
    }
}
