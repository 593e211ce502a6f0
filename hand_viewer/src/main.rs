//! hand_viewer: windowed entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hand_viewer::config::{Mode, Size, ViewerConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hand_viewer", about = "Live hand-landmark viewer", version)]
struct Cli {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend address, host:port
    #[arg(long)]
    host: Option<String>,

    /// Connect with wss:// instead of ws://
    #[arg(long)]
    tls: bool,

    /// Mode to open at startup: coordinates or cursor
    #[arg(long)]
    mode: Option<Mode>,

    /// Screen size the cursor maps onto, e.g. 2560x1440
    #[arg(long)]
    screen: Option<Size>,

    /// Reconnect automatically with exponential backoff after a failure
    #[arg(long)]
    reconnect: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ViewerConfig> {
        let mut cfg = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(host) = self.host { cfg.host = host; }
        if self.tls                  { cfg.tls = true; }
        if let Some(mode) = self.mode { cfg.mode = mode; }
        if let Some(size) = self.screen {
            cfg.screen_width = size.width;
            cfg.screen_height = size.height;
        }
        if self.reconnect { cfg.reconnect.enabled = true; }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hand_viewer=info,hand_core=warn".into()),
        )
        .init();

    let cfg = cli.into_config()?;
    info!(
        "hand_viewer v{} → {}",
        env!("CARGO_PKG_VERSION"),
        cfg.endpoint(cfg.mode),
    );

    hand_viewer::app::run(cfg)?;
    Ok(())
}
