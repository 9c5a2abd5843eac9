pub mod call_service;
pub mod message_service;

pub use call_service::CallService;
pub use message_service::MessageService;
