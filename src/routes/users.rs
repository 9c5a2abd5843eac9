use crate::{error::AppError, models::UserProfile, state::AppState};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertUserRequest {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// PUT /internal/users/{user_id}
///
/// Profile sync from the identity service. Idempotent; the last write for
/// a given id wins.
pub async fn upsert_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
    body: web::Json<UpsertUserRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let profile = UserProfile {
        id: user_id.into_inner(),
        display_name: body.display_name,
        avatar_url: body.avatar_url,
        last_seen_at: body.last_seen_at.unwrap_or_else(Utc::now),
    };
    state.directory.upsert(profile.clone()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /internal/users/{user_id}
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let profile = state
        .directory
        .find(user_id.into_inner())
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(HttpResponse::Ok().json(profile))
}
