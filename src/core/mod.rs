pub mod app;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod keyring;
pub mod message;
pub mod providers;
pub mod session;
pub mod sse;
pub mod store;
pub mod voice;
