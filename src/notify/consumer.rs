use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::NotifyTargets;
use crate::notify::render::Renderer;
use crate::notify::sender::ChatSender;
use crate::webhooks::channel::EventReceiver;
use crate::webhooks::event::Event;

/// Drains the event queue and pushes rendered messages to chat.
pub struct Notifier {
    renderer: Renderer,
    sender: Arc<dyn ChatSender>,
    targets: NotifyTargets,
}

impl Notifier {
    pub fn new(renderer: Renderer, sender: Arc<dyn ChatSender>, targets: NotifyTargets) -> Self {
        Self {
            renderer,
            sender,
            targets,
        }
    }

    /// Runs until every `EventSender` has been dropped.
    pub async fn run(self, mut events: EventReceiver) {
        info!(
            "Notifier started (user {}, group {})",
            self.targets.user_id, self.targets.group_id
        );
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        info!("Event queue closed, notifier stopping");
    }

    pub async fn handle(&self, event: &Event) {
        info!(
            "Received {} event action {:?} for {}/{}",
            event.event_type, event.action, event.owner, event.repo
        );
        let Some(message) = self.renderer.render(event).await else {
            debug!("Nothing to send for {} {:?}", event.event_type, event.action);
            return;
        };
        if message.is_empty() {
            return;
        }
        self.deliver(&message).await;
    }

    /// Each target is tried independently; failures are logged only.
    async fn deliver(&self, message: &str) {
        if self.targets.user_id != 0 {
            if let Err(e) = self.sender.send_private_msg(self.targets.user_id, message).await {
                error!("Push to user {} failed: {}", self.targets.user_id, e);
            }
        }
        if self.targets.group_id != 0 {
            if let Err(e) = self.sender.send_group_msg(self.targets.group_id, message).await {
                error!("Push to group {} failed: {}", self.targets.group_id, e);
            }
        }
    }
}
