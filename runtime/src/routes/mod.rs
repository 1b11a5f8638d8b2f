pub mod analyze;
pub mod chat;
pub mod status;

pub mod types;

pub use analyze::analysis_routes;
pub use chat::chat_routes;
pub use status::status_routes;
