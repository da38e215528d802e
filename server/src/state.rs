use std::sync::Arc;
use std::time::Duration;

use crate::chat::dispatch::Relay;
use crate::chat::render::HtmlRenderer;
use crate::config::Config;
use crate::ws::registry::Registry;

/// Transport settings each connection actor runs with.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub send_timeout: Duration,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Registry + broadcast core
    pub relay: Arc<Relay>,
    pub connection: ConnectionSettings,
    pub page_title: String,
}

impl AppState {
    /// Build state from config with a fresh registry and the HTML renderer.
    pub fn from_config(config: &Config) -> Self {
        let relay = Relay::new(
            Arc::new(Registry::new()),
            Arc::new(HtmlRenderer),
            config.max_frame_bytes,
        );

        Self {
            relay: Arc::new(relay),
            connection: ConnectionSettings {
                send_timeout: config.send_timeout(),
                ping_interval: config.ping_interval(),
                pong_timeout: config.pong_timeout(),
            },
            page_title: config.page_title.clone(),
        }
    }
}
