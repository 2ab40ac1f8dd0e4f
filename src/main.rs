//! Stackpilot server entry point
//!
//! Accepts an optional settings-file path (TOML or JSON) as the first
//! argument; `STACKPILOT_`-prefixed environment variables override it.

use std::path::PathBuf;

use stackpilot::AppState;
use stackpilot_config::{OverrideStore, ServerSettings, SettingsResolver};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stackpilot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let server = ServerSettings::load(settings_path.as_deref())?;

    let overrides = OverrideStore::file(server.provider_config_file());
    let settings = SettingsResolver::from_env(overrides);
    let state = AppState::build(settings, &server);
    let app = stackpilot::router(state);

    let listener = TcpListener::bind(server.bind_addr()).await?;
    info!(
        addr = %server.bind_addr(),
        data_dir = %server.data_dir.display(),
        "Stackpilot server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
