//! Blog posts and comments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use groenmarkt_core::{CommentId, PostId, UserId};

/// A blog post. Only published posts are listed publicly.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
