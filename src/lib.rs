pub mod chat;
pub mod config;
pub mod error;
pub mod notify;
pub mod search;
pub mod webhooks;

pub use error::{NotifierError, WebhookError};
