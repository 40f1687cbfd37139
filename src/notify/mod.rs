//! Event consumer: rendering, screenshots and chat delivery.

pub mod capture;
pub mod consumer;
pub mod cq;
pub mod render;
pub mod sender;

pub use capture::{CaptureTarget, PageCapture, WebDriverCapture};
pub use consumer::Notifier;
pub use render::Renderer;
pub use sender::{AdapterClient, ChatSender};
