use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Display-safe projection of an account owned by the identity service.
///
/// This service never sees credentials; it keeps just enough to route
/// messages and render conversation headers, and it only ever mutates
/// `last_seen_at` (on connect/disconnect).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}
