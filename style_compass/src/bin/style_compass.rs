use std::{net::SocketAddr, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use index_ingestor::providers::eastmoney::EastmoneyProvider;
use style_compass::{
    config::{CompassConfig, load_config_path},
    pipeline::Pipeline,
    server::{AppState, router},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "CSI 300 growth/value style compass")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Serve the dashboard over HTTP.
    Serve(ConfigArgs),
    /// Fetch once, print the dashboard state as JSON, and exit.
    Once(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<CompassConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config_path(path)?,
            None => CompassConfig::default(),
        };
        cfg.apply_env()?;
        cfg.validate().context("invalid configuration after env overrides")?;
        Ok(cfg)
    }
}

fn build_pipeline(cfg: &CompassConfig) -> Result<Pipeline> {
    let provider = EastmoneyProvider::new(cfg.fetch_policy())?;
    Ok(Pipeline::new(
        Arc::new(provider),
        cfg.growth_request()?,
        cfg.value_request()?,
        cfg.cache_ttl(),
    ))
}

async fn serve(cfg: CompassConfig) -> Result<()> {
    let state = AppState::new(build_pipeline(&cfg)?, cfg.page_options());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.bind, cfg.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.server.bind, cfg.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!("style compass listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn once(cfg: CompassConfig) -> Result<bool> {
    let pipeline = build_pipeline(&cfg)?;
    let state = pipeline.load().await;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(state.history().is_some())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, stopping");
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Serve(args) => {
            serve(args.load()?).await?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Once(args) => {
            let available = once(args.load()?).await?;
            Ok(if available {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
