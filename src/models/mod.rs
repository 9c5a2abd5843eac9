pub mod message;
pub mod user;

// Re-export for convenience
pub use message::{Message, MessageStatus, MessageView, NewMessage, Reaction, ReplyPreview};
pub use user::UserProfile;
