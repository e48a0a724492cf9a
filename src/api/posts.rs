//! Posts API: posts, likes and comments.
//!
//! All endpoints require a valid token. Deleting a post or a comment is only
//! allowed for its author.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::error::{ApiError, ResultExt};
use super::validation::{FieldOrder, ValidateJson, not_blank};
use super::{Gates, load_caller};
use crate::auth::{Identity, assert_owner};
use crate::db::{Comment, Database, Like, Post};

const POST_NOT_FOUND: &str = "Post not found";

#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
}

pub fn router(state: PostsState, gates: &Gates) -> Router {
    gates
        .protect(
            Router::new()
                .route("/", post(create_post))
                .route("/", get(list_posts))
                .route("/{id}", get(get_post))
                .route("/{id}", delete(delete_post))
                .route("/like/{id}", put(like_post))
                .route("/unlike/{id}", put(unlike_post))
                .route("/comment/{id}", post(add_comment))
                .route("/comment/{id}/{comment_id}", delete(delete_comment)),
        )
        .with_state(state)
}

// --- Request/Response types ---

/// Body of a new post or comment.
#[derive(Deserialize, Validate)]
struct TextRequest {
    #[validate(
        required(message = "Text is required"),
        custom(function = "not_blank", message = "Text is required")
    )]
    text: Option<String>,
}

impl FieldOrder for TextRequest {
    const FIELDS: &'static [&'static str] = &["text"];
}

impl TextRequest {
    fn into_text(self) -> String {
        self.text.unwrap_or_default().trim().to_string()
    }
}

#[derive(Serialize)]
struct LikeResponse {
    user: String,
}

impl From<Like> for LikeResponse {
    fn from(like: Like) -> Self {
        Self { user: like.user }
    }
}

#[derive(Serialize)]
struct CommentResponse {
    id: String,
    user: String,
    text: String,
    name: String,
    avatar: String,
    date: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.uuid,
            user: comment.user,
            text: comment.text,
            name: comment.name,
            avatar: comment.avatar,
            date: comment.created_at,
        }
    }
}

#[derive(Serialize)]
struct PostResponse {
    id: String,
    user: String,
    text: String,
    name: String,
    avatar: String,
    likes: Vec<LikeResponse>,
    comments: Vec<CommentResponse>,
    date: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.uuid,
            user: post.user,
            text: post.text,
            name: post.name,
            avatar: post.avatar,
            likes: post.likes.into_iter().map(LikeResponse::from).collect(),
            comments: post.comments.into_iter().map(CommentResponse::from).collect(),
            date: post.created_at,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    msg: &'static str,
}

// --- Helpers ---

/// Look up a post. Unknown and malformed ids are both "not found".
async fn find_post(db: &Database, id: &str) -> Result<Post, ApiError> {
    db.posts()
        .get_by_uuid(id.trim())
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND))
}

async fn likes_response(
    db: &Database,
    post_id: i64,
) -> Result<Json<Vec<LikeResponse>>, ApiError> {
    let likes = db
        .posts()
        .likes(post_id)
        .await
        .db_err("Failed to get likes")?;
    Ok(Json(likes.into_iter().map(LikeResponse::from).collect()))
}

async fn comments_response(
    db: &Database,
    post_id: i64,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = db
        .posts()
        .comments(post_id)
        .await
        .db_err("Failed to get comments")?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

// --- Handlers ---

async fn create_post(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    ValidateJson(payload): ValidateJson<TextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = payload.into_text();
    let user = load_caller(&state.db, &identity).await?;

    let uuid = state
        .db
        .posts()
        .create(user.id, &text, &user.name, &user.avatar)
        .await
        .db_err("Failed to create post")?;

    let post = find_post(&state.db, &uuid).await?;
    Ok(Json(PostResponse::from(post)))
}

async fn list_posts(State(state): State<PostsState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.db.posts().list().await.db_err("Failed to list posts")?;
    Ok(Json(
        posts
            .into_iter()
            .map(PostResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state.db, &id).await?;
    Ok(Json(PostResponse::from(post)))
}

async fn delete_post(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state.db, &id).await?;
    assert_owner(&post.user, &identity)?;

    state
        .db
        .posts()
        .delete(post.id)
        .await
        .db_err("Failed to delete post")?;

    info!(post = %post.uuid, user = %identity.user_id, "Post removed");

    Ok(Json(MessageResponse {
        msg: "Post removed",
    }))
}

async fn like_post(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state.db, &id).await?;
    let user = load_caller(&state.db, &identity).await?;

    let added = state
        .db
        .posts()
        .add_like(post.id, user.id)
        .await
        .db_err("Failed to like post")?;
    if !added {
        return Err(ApiError::bad_request("Post already liked"));
    }

    likes_response(&state.db, post.id).await
}

async fn unlike_post(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state.db, &id).await?;
    let user = load_caller(&state.db, &identity).await?;

    let removed = state
        .db
        .posts()
        .remove_like(post.id, user.id)
        .await
        .db_err("Failed to unlike post")?;
    if !removed {
        return Err(ApiError::bad_request("Post not yet liked"));
    }

    likes_response(&state.db, post.id).await
}

async fn add_comment(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    Path(id): Path<String>,
    ValidateJson(payload): ValidateJson<TextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = payload.into_text();
    let post = find_post(&state.db, &id).await?;
    let user = load_caller(&state.db, &identity).await?;

    state
        .db
        .posts()
        .add_comment(post.id, user.id, &text, &user.name, &user.avatar)
        .await
        .db_err("Failed to add comment")?;

    comments_response(&state.db, post.id).await
}

async fn delete_comment(
    State(state): State<PostsState>,
    Identity(identity): Identity,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let post = find_post(&state.db, &id).await?;

    let comment = state
        .db
        .posts()
        .get_comment(post.id, comment_id.trim())
        .await
        .db_err("Failed to get comment")?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    assert_owner(&comment.user, &identity)?;

    state
        .db
        .posts()
        .delete_comment(comment.id)
        .await
        .db_err("Failed to delete comment")?;

    comments_response(&state.db, post.id).await
}
