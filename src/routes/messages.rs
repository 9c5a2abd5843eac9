use crate::{error::AppError, middleware::guards::User, state::AppState};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReactionRequest {
    /// Unicode emoji or emoji code
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessageParams {
    #[serde(default)]
    pub delete_for_everyone: bool,
}

/// GET /conversations/{peer_id}/messages
///
/// Fetching a conversation doubles as the delivery acknowledgement: every
/// message the peer sent that is still `sent` flips to `delivered` before
/// the page is returned.
pub async fn get_messages(
    state: web::Data<AppState>,
    peer_id: web::Path<Uuid>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let messages = state
        .messages
        .list_conversation(user.id, peer_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /conversations/{peer_id}/messages
pub async fn send_message(
    state: web::Data<AppState>,
    peer_id: web::Path<Uuid>,
    user: User,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let message = state
        .messages
        .send(
            user.id,
            peer_id.into_inner(),
            body.text,
            body.image_url,
            body.reply_to,
        )
        .await?;
    Ok(HttpResponse::Created().json(message))
}

/// POST /conversations/{peer_id}/read
pub async fn mark_read(
    state: web::Data<AppState>,
    peer_id: web::Path<Uuid>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let updated = state
        .messages
        .mark_read(user.id, peer_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// PUT /messages/{message_id}
pub async fn edit_message(
    state: web::Data<AppState>,
    message_id: web::Path<Uuid>,
    user: User,
    body: web::Json<EditMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let message = state
        .messages
        .edit(user.id, message_id.into_inner(), body.into_inner().text)
        .await?;
    Ok(HttpResponse::Ok().json(message))
}

/// DELETE /messages/{message_id}?delete_for_everyone=
pub async fn delete_message(
    state: web::Data<AppState>,
    message_id: web::Path<Uuid>,
    user: User,
    params: web::Query<DeleteMessageParams>,
) -> Result<HttpResponse, AppError> {
    state
        .messages
        .delete(user.id, message_id.into_inner(), params.delete_for_everyone)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /messages/{message_id}/reactions
pub async fn add_reaction(
    state: web::Data<AppState>,
    message_id: web::Path<Uuid>,
    user: User,
    body: web::Json<AddReactionRequest>,
) -> Result<HttpResponse, AppError> {
    let message = state
        .messages
        .react(user.id, message_id.into_inner(), body.into_inner().emoji)
        .await?;
    Ok(HttpResponse::Ok().json(message))
}

/// GET /messages/unread-counts
pub async fn unread_counts(
    state: web::Data<AppState>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let counts = state.messages.unread_counts(user.id).await?;
    Ok(HttpResponse::Ok().json(counts))
}
