//! Bounded hand-off between the webhook handler and the notifier.

use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tracing::warn;

use crate::error::WebhookError;
use crate::webhooks::event::Event;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Producer half. Cheap to clone; every request handler holds one.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
    send_timeout: Duration,
}

/// Consumer half. There is exactly one.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Event>,
}

/// Create a queue holding at most `capacity` events. Panics if `capacity` is zero.
pub fn event_channel(capacity: usize, send_timeout: Duration) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx, send_timeout }, EventReceiver { rx })
}

impl EventSender {
    /// Queue `event`, waiting at most the configured timeout for space.
    ///
    /// Once this returns `Ok` the event belongs to the consumer; dropping the
    /// caller afterwards does not take it back.
    pub async fn enqueue(&self, event: Event) -> Result<(), WebhookError> {
        match self.tx.send_timeout(event, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(event)) => {
                warn!(
                    "Event queue full for {:?}; rejecting {} event for {}/{}",
                    self.send_timeout, event.event_type, event.owner, event.repo
                );
                Err(WebhookError::ServiceOverloaded)
            }
            Err(SendTimeoutError::Closed(_)) => Err(WebhookError::ChannelClosed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl EventReceiver {
    /// Next event in arrival order, or `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking variant, mostly useful for draining in tests.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}
