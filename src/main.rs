use anyhow::Context;
use clap::Parser;
use duetpanel::communication::{HttpTransport, HttpTransportConfig};
use duetpanel::panel::FixedAnswer;
use duetpanel::settings::{default_config_path, JsonFilePreferences, PanelConfig};
use duetpanel::{init_logging, PanelRuntime, TracingRenderSink, BUILD_DATE, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

/// Headless control panel for Duet-driven extruder and spindle machines
#[derive(Debug, Parser)]
#[command(name = "duetpanel", version)]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "DUETPANEL_CONFIG")]
    config: Option<PathBuf>,

    /// Controller base URL, overrides the configuration file
    #[arg(long, env = "DUETPANEL_CONTROLLER")]
    controller: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Answer heater fault prompts with "reset" instead of "leave"
    #[arg(long)]
    auto_reset_faults: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs)?;
    tracing::info!("DuetPanel {} (built {})", VERSION, BUILD_DATE);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = PanelConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(url) = cli.controller {
        config.controller.base_url = url;
    }
    config.validate()?;

    let preferences_path = config.resolved_preferences_path()?;
    let preferences = JsonFilePreferences::open(preferences_path.clone())
        .with_context(|| format!("Failed to open {}", preferences_path.display()))?;

    let transport = HttpTransport::new(HttpTransportConfig {
        base_url: config.controller.base_url.clone(),
        timeout: config.controller.timeout(),
        accept_invalid_certs: config.controller.accept_invalid_certs,
    })?;
    tracing::info!("Controller at {}", transport.base_url());

    let panel = PanelRuntime::spawn(
        &config,
        Arc::new(transport),
        Arc::new(preferences),
        Arc::new(TracingRenderSink::default()),
        Arc::new(FixedAnswer(cli.auto_reset_faults)),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");
    panel.shutdown().await;

    Ok(())
}
