/// OpenAPI documentation for Pulse Chat Service
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pulse Chat Service API",
        version = "0.1.0",
        description = "Real-time 1:1 messaging, presence, and call signaling",
        contact(
            name = "Pulse Team",
            email = "team@pulse.dev"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Development server"),
        (url = "https://api.pulse.dev/chat", description = "Production server"),
    ),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Conversations", description = "Conversation history and read state"),
        (name = "Messages", description = "Message lifecycle: send, edit, delete, react"),
        (name = "Presence", description = "Online user snapshots"),
        (name = "WebSocket", description = "Live delivery, typing, and call signaling"),
    ),
    components(schemas(
        crate::models::MessageStatus,
        crate::models::MessageView,
        crate::models::Reaction,
        crate::models::ReplyPreview,
        crate::models::UserProfile,
        crate::routes::messages::SendMessageRequest,
        crate::routes::messages::EditMessageRequest,
        crate::routes::messages::AddReactionRequest,
        crate::routes::presence::PresenceResponse,
        crate::routes::users::UpsertUserRequest,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn title() -> &'static str {
        "Pulse Chat Service"
    }

    pub fn openapi_json_path() -> &'static str {
        "/openapi.json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes() {
        let doc = ApiDoc::openapi();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["info"]["title"], "Pulse Chat Service API");
        assert!(value["components"]["schemas"]
            .as_object()
            .is_some_and(|schemas| schemas.contains_key("MessageView")));
    }
}
