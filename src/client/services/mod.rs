pub mod chat_coordinator;
pub mod chat_session;
pub mod groups_service;
pub mod history_service;
pub mod message_log;
