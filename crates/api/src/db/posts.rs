//! Blog post and comment repository.

use sqlx::PgPool;

use groenmarkt_core::{CommentId, PostId, UserId};

use super::RepositoryError;
use crate::models::{Comment, Post};

const POST_COLUMNS: &str = "id, title, content, author_id, is_published, created_at, updated_at";

/// Repository for posts and their comments.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Post>, RepositoryError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_published ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Post>(&sql).fetch_all(self.pool).await?)
    }

    /// Get a published post by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND is_published");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Create a post for the given author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        author_id: UserId,
        title: &str,
        content: &str,
    ) -> Result<Post, RepositoryError> {
        let sql = format!(
            "INSERT INTO posts (title, content, author_id) VALUES ($1, $2, $3)
             RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(title)
            .bind(content)
            .bind(author_id)
            .fetch_one(self.pool)
            .await?)
    }

    /// Update a post's title and content, author-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist or
    /// is not owned by `author_id`.
    pub async fn update(
        &self,
        id: PostId,
        author_id: UserId,
        title: &str,
        content: &str,
    ) -> Result<Post, RepositoryError> {
        let sql = format!(
            "UPDATE posts SET title = $1, content = $2, updated_at = now()
             WHERE id = $3 AND author_id = $4
             RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(title)
            .bind(content)
            .bind(id)
            .bind(author_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("post {id}")))
    }

    /// Delete a post, author-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: PostId, author_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("post {id}")));
        }
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// List a post's comments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, content, created_at
             FROM comments WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Add a comment to a published post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist or
    /// is unpublished.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        if self.get_published(post_id).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("post {post_id}")));
        }
        Ok(sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (post_id, author_id, content) VALUES ($1, $2, $3)
             RETURNING id, post_id, author_id, content, created_at",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(self.pool)
        .await?)
    }

    /// Delete a comment, author-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete_comment(
        &self,
        id: CommentId,
        author_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("comment {id}")));
        }
        Ok(())
    }
}
