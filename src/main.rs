use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use github_notify::chat;
use github_notify::config::AppConfig;
use github_notify::notify::{AdapterClient, ChatSender, Notifier, PageCapture, Renderer, WebDriverCapture};
use github_notify::search::GitHubSearch;
use github_notify::webhooks::{self, event_channel, WebhookState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "github_notify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting github-notify");

    let config = AppConfig::load()?;
    info!("Configuration loaded");

    let sender: Arc<dyn ChatSender> = Arc::new(AdapterClient::new(&config.adapter));
    let search = Arc::new(GitHubSearch::new(&config.github_api_base, sender.clone()));

    if config.webhook.enabled {
        info!(
            "GitHub webhook enabled (notify user {}, group {}, signature check {})",
            config.notify.user_id,
            config.notify.group_id,
            if config.webhook.secret.is_empty() { "off" } else { "on" }
        );

        let capture: Option<Arc<dyn PageCapture>> = if config.capture.enabled {
            Some(Arc::new(WebDriverCapture::new(&config.capture.webdriver_addr)?))
        } else {
            None
        };

        let (tx, rx) = event_channel(config.webhook.queue_capacity, config.webhook.send_timeout());
        let notifier = Notifier::new(Renderer::new(capture), sender.clone(), config.notify);
        tokio::spawn(notifier.run(rx));

        let app = webhooks::router(WebhookState::new(&config.webhook, tx));
        let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Webhook listening on {}{}", addr, config.webhook.path);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("Webhook server failed: {}", e);
            }
        });
    } else {
        warn!("GitHub webhook is disabled");
    }

    let key = chat::EnvelopeKey::from_config(&config.adapter.encrypt_key);
    if key.is_none() {
        warn!("APP_ENCRYPT_KEY is not set, chat ingress accepts unsealed events");
    }
    let app = chat::router(search, key);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Chat ingress listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
