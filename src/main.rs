use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use web_recorder::{build_background, create_router, AppState, Config, NatsRelay};
use tracing::{error, info};

/// Background service for the web recorder extension
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/web-recorder")]
    config: String,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }

    info!("Web Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Recording pages: {}", cfg.recorder.recording_page);

    let background = build_background(&cfg).await?;

    if let Some(url) = &cfg.nats.url {
        match NatsRelay::connect(url, cfg.service.name.clone(), cfg.nats.subject_prefix.clone())
            .await
        {
            Ok(relay) => {
                let _relay = relay.spawn(background.broadcaster());
            }
            Err(e) => error!("NATS relay disabled: {:#}", e),
        }
    }

    let router = create_router(AppState::new(Arc::clone(&background)));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
