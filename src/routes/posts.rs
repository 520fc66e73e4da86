use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{NewPost, Post, PostChanges, User, UserCompany};
use crate::registration::{directory, memberships};
use crate::state::SharedState;

const MAX_TITLE_LEN: usize = 200;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub published: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// Resolves the caller and the company their posts are scoped to.
async fn member(state: &SharedState, auth: &AuthUser) -> Result<(User, UserCompany), AppError> {
    let user = directory::require_user(&state.store, &auth.subject_id).await?;
    let membership = memberships::require_selected(&state.store, user.id).await?;
    Ok((user, membership))
}

async fn find_post(state: &SharedState, id: Uuid, company_id: Uuid) -> Result<Post, AppError> {
    state
        .store
        .posts
        .find_by_id(id, company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

fn ensure_can_edit(user: &User, membership: &UserCompany, post: &Post) -> Result<(), AppError> {
    if post.author_id == user.id || membership.role.can_moderate() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author or a moderator can modify this post".to_string(),
        ))
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Post>>, AppError> {
    let (_, membership) = member(&state, &auth).await?;

    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let posts = state
        .store
        .posts
        .list(membership.company_id, params.published, limit, offset)
        .await?;
    Ok(Json(posts))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let (user, membership) = member(&state, &auth).await?;

    let title = req.title.trim().to_string();
    validate_title(&title)?;

    let post = state
        .store
        .posts
        .create(&NewPost {
            company_id: membership.company_id,
            author_id: user.id,
            title,
            content: req.content,
            excerpt: req.excerpt,
            published: req.published,
        })
        .await?;

    tracing::info!(post_id = %post.id, company_id = %post.company_id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, AppError> {
    let (_, membership) = member(&state, &auth).await?;
    let post = find_post(&state, id, membership.company_id).await?;
    Ok(Json(post))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(mut changes): Json<PostChanges>,
) -> Result<Json<Post>, AppError> {
    let (user, membership) = member(&state, &auth).await?;
    let post = find_post(&state, id, membership.company_id).await?;
    ensure_can_edit(&user, &membership, &post)?;

    if let Some(title) = changes.title.take() {
        let title = title.trim().to_string();
        validate_title(&title)?;
        changes.title = Some(title);
    }

    let post = state
        .store
        .posts
        .update(id, membership.company_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    Ok(Json(post))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (user, membership) = member(&state, &auth).await?;
    let post = find_post(&state, id, membership.company_id).await?;
    ensure_can_edit(&user, &membership, &post)?;

    if !state.store.posts.delete(id, membership.company_id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(post_id = %id, user_id = %user.id, "Post deleted");
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Title must be between 1 and {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
