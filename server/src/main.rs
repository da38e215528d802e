use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use relay_server::config::{generate_config_template, Config};
use relay_server::{routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("relay_server=info"))?;
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }

    tracing::info!("Chat relay v{} starting", env!("CARGO_PKG_VERSION"));

    let app_state = state::AppState::from_config(&config);
    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        send_timeout_ms = config.send_timeout_ms,
        max_frame_bytes = config.max_frame_bytes,
        "Listening on {}",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
