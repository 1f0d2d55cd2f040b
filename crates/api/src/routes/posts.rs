//! Blog post and comment handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use groenmarkt_core::{CommentId, PostId};

use crate::db::posts::PostRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Post create/update payload.
#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

fn validate_post(input: &PostInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_owned()));
    }
    if input.content.trim().is_empty() {
        return Err(AppError::BadRequest("content is required".to_owned()));
    }
    Ok(())
}

/// `GET /api/posts` — published posts, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let posts = PostRepository::new(state.pool()).list_published().await?;
    Ok(Json(json!({ "count": posts.len(), "posts": posts })))
}

/// `GET /api/posts/{id}`
pub async fn detail(State(state): State<AppState>, Path(id): Path<PostId>) -> Result<Json<Value>> {
    let post = PostRepository::new(state.pool())
        .get_published(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
    Ok(Json(json!({ "post": post })))
}

/// `POST /api/posts`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<Value>)> {
    validate_post(&input)?;
    let post = PostRepository::new(state.pool())
        .create(user.id, input.title.trim(), &input.content)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// `PUT /api/posts/{id}` — author-scoped.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PostId>,
    Json(input): Json<PostInput>,
) -> Result<Json<Value>> {
    validate_post(&input)?;
    let post = PostRepository::new(state.pool())
        .update(id, user.id, input.title.trim(), &input.content)
        .await?;
    Ok(Json(json!({ "post": post })))
}

/// `DELETE /api/posts/{id}` — author-scoped.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PostId>,
) -> Result<Json<Value>> {
    PostRepository::new(state.pool()).delete(id, user.id).await?;
    Ok(Json(json!({ "message": format!("post {id} deleted") })))
}

/// `GET /api/posts/{id}/comments`
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<Json<Value>> {
    let repo = PostRepository::new(state.pool());
    if repo.get_published(id).await?.is_none() {
        return Err(AppError::NotFound(format!("post {id}")));
    }
    let comments = repo.list_comments(id).await?;
    Ok(Json(json!({ "count": comments.len(), "comments": comments })))
}

/// Comment payload.
#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

/// `POST /api/posts/{id}/comments`
pub async fn add_comment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PostId>,
    Json(input): Json<CommentInput>,
) -> Result<(StatusCode, Json<Value>)> {
    if input.content.trim().is_empty() {
        return Err(AppError::BadRequest("content is required".to_owned()));
    }
    let comment = PostRepository::new(state.pool())
        .add_comment(id, user.id, &input.content)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

/// `DELETE /api/comments/{id}` — author-scoped.
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CommentId>,
) -> Result<Json<Value>> {
    PostRepository::new(state.pool())
        .delete_comment(id, user.id)
        .await?;
    Ok(Json(json!({ "message": format!("comment {id} deleted") })))
}
