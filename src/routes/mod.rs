use actix_web::{web, HttpResponse};

pub mod messages;
use messages::{
    add_reaction, delete_message, edit_message, get_messages, mark_read, send_message,
    unread_counts,
};
pub mod presence;
use presence::get_presence;
pub mod users;
use users::{get_user, upsert_user};
pub mod wsroute;
use wsroute::ws_handler;

// OpenAPI endpoint handler
async fn openapi_json() -> HttpResponse {
    use utoipa::OpenApi;
    HttpResponse::Ok().json(crate::openapi::ApiDoc::openapi())
}

// Health check handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // API v1 endpoints (all business logic routes with /api/v1 prefix).
    // Registered before the bare scope: an empty scope prefix matches every
    // path, so it has to come last.
    cfg.service(
        web::scope("/api/v1")
            // Live socket
            .route("/ws", web::get().to(ws_handler))
            // Conversations
            .route(
                "/conversations/{peer_id}/messages",
                web::get().to(get_messages),
            )
            .route(
                "/conversations/{peer_id}/messages",
                web::post().to(send_message),
            )
            .route("/conversations/{peer_id}/read", web::post().to(mark_read))
            // Messages
            .route("/messages/unread-counts", web::get().to(unread_counts))
            .route("/messages/{message_id}", web::put().to(edit_message))
            .route("/messages/{message_id}", web::delete().to(delete_message))
            .route(
                "/messages/{message_id}/reactions",
                web::post().to(add_reaction),
            )
            // Presence
            .route("/presence", web::get().to(get_presence))
            // Identity sync
            .route("/internal/users/{user_id}", web::put().to(upsert_user))
            .route("/internal/users/{user_id}", web::get().to(get_user)),
    );

    // Service introspection endpoints (no API version prefix)
    cfg.service(
        web::scope("")
            .route("/health", web::get().to(health_check))
            .route("/metrics", web::get().to(crate::metrics::metrics_handler))
            .route("/openapi.json", web::get().to(openapi_json)),
    );
}
