mod config;
mod errors;
mod glyph;
mod layout;
mod markup;
mod routes;
mod sheet;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::sheet::DirectorySheetSource;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting typeset v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.typeset_settings();
    info!(
        spacing_commands = settings.spacing_table.len(),
        spacing_enabled = settings.layout.spacing.enabled,
        sheet_font_size_pt = settings.layout.sheet_font_size_pt,
        "Typeset settings loaded"
    );

    let sheet_source = DirectorySheetSource::new(&config.sheet_dir);
    if !sheet_source.dir().is_dir() {
        tracing::warn!(
            "Sheet directory {} does not exist; typeset requests will fail until it does",
            sheet_source.dir().display()
        );
    }
    info!("Sheet source: {}", sheet_source.dir().display());

    let state = AppState {
        sheet_source: Arc::new(sheet_source),
        settings: Arc::new(settings),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
