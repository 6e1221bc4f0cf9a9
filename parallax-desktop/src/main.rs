//! # Parallax Desktop
//!
//! Runs the eye tracking receiver and the stereo projection frame loop.

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use parallax_desktop::{AppConfig, CliArgs, StereoApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,parallax_tracker=debug,parallax_renderer=info).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,parallax_tracker=debug,parallax_renderer=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = AppConfig::from_args(&args)?;

    tracing::info!(
        "Starting Parallax Desktop v{} ({}\" {}x{})",
        parallax_core::VERSION,
        config.display.screen_diagonal_in,
        config.display.resolution_width_px,
        config.display.resolution_height_px
    );

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {e}"))?;
        tracing::info!("Prometheus metrics on http://{}/metrics", addr);
    }

    let mut app = StereoApp::new(config)?;
    let addr = app.start()?;
    tracing::info!("Listening for eye tracker packets on {}", addr);

    let frames = app
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Parallax Desktop exited after {} frames", frames);
    Ok(())
}
