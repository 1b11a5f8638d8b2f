pub mod chat;
pub mod client;
pub mod markdown;
pub mod prompts;
