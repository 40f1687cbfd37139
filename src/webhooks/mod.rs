//! GitHub webhook ingestion: verify, normalize, queue.

pub mod channel;
pub mod event;
pub mod normalize;
pub mod server;
pub mod signature;

pub use channel::{event_channel, EventReceiver, EventSender};
pub use event::{Event, EventType};
pub use normalize::Normalizer;
pub use server::{router, WebhookState};
