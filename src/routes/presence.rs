use crate::{error::AppError, middleware::guards::User, state::AppState};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PresenceResponse {
    pub users: Vec<Uuid>,
}

/// GET /presence
///
/// On-demand copy of the same snapshot the socket layer broadcasts. Lets
/// a client that just lost its socket re-sync without waiting for the
/// next presence event.
pub async fn get_presence(
    state: web::Data<AppState>,
    _user: User,
) -> Result<HttpResponse, AppError> {
    let users = state.presence.online_users().await;
    Ok(HttpResponse::Ok().json(PresenceResponse { users }))
}
