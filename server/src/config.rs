use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Real-time chat relay server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "relay-server", version, about = "Real-time chat relay server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "RELAY_PORT", default_value = "8000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "RELAY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./relay.toml")]
    pub config: String,

    /// Enable structured JSON logging
    #[arg(long, env = "RELAY_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Upper bound for a single socket write, in milliseconds
    #[arg(long, env = "RELAY_SEND_TIMEOUT_MS", default_value = "5000")]
    pub send_timeout_ms: u64,

    /// Seconds between server pings
    #[arg(long, env = "RELAY_PING_INTERVAL_SECS", default_value = "30")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before closing
    #[arg(long, env = "RELAY_PONG_TIMEOUT_SECS", default_value = "10")]
    pub pong_timeout_secs: u64,

    /// Largest accepted inbound text frame, in bytes
    #[arg(long, env = "RELAY_MAX_FRAME_BYTES", default_value = "4096")]
    pub max_frame_bytes: usize,

    /// Title shown on the chat page
    #[arg(long, env = "RELAY_PAGE_TITLE", default_value = "Chat")]
    pub page_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            config: "./relay.toml".to_string(),
            json_logs: false,
            generate_config: false,
            send_timeout_ms: 5000,
            ping_interval_secs: 30,
            pong_timeout_secs: 10,
            max_frame_bytes: 4096,
            page_title: "Chat".to_string(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (RELAY_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("RELAY_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Chat Relay Server Configuration
# Place this file at ./relay.toml or specify with --config <path>
# All settings can be overridden via environment variables (RELAY_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 8000)
# port = 8000

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging
# json_logs = false

# ---- Connections ----

# Upper bound for a single socket write in milliseconds (default: 5000)
# A client that cannot accept a frame within this time is disconnected.
# send_timeout_ms = 5000

# Keepalive: ping interval and pong deadline in seconds
# ping_interval_secs = 30
# pong_timeout_secs = 10

# Largest accepted inbound frame in bytes (default: 4096)
# max_frame_bytes = 4096

# ---- Page ----
# page_title = "Chat"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let cli = Config::parse_from(["relay-server"]);
        let defaults = Config::default();
        assert_eq!(cli.port, defaults.port);
        assert_eq!(cli.bind_address, defaults.bind_address);
        assert_eq!(cli.send_timeout_ms, defaults.send_timeout_ms);
        assert_eq!(cli.max_frame_bytes, defaults.max_frame_bytes);
        assert_eq!(cli.page_title, defaults.page_title);
    }

    #[test]
    fn test_durations() {
        let config = Config {
            send_timeout_ms: 250,
            ping_interval_secs: 5,
            pong_timeout_secs: 2,
            ..Config::default()
        };
        assert_eq!(config.send_timeout(), Duration::from_millis(250));
        assert_eq!(config.ping_interval(), Duration::from_secs(5));
        assert_eq!(config.pong_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_template_only_contains_comments() {
        let template = generate_config_template();
        assert!(template
            .lines()
            .all(|line| line.is_empty() || line.starts_with('#')));
        assert!(template.contains("send_timeout_ms"));
    }
}
