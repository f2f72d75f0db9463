//! `woonveilig`: keeps track of a WoonVeilig alarm panel.
//!
//! `run` (the default) logs in, restores the watermark from disk, polls the
//! panel's history log and prints every derived fact as a JSON line on
//! stdout until Ctrl-C. `set <state>` switches the panel's mode once and
//! exits.

mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use woonveilig_core::{AlarmState, Fact, Panel};

use crate::store::FileWatermarkStore;

/// Bridge daemon for WoonVeilig alarm panels.
#[derive(Parser, Debug)]
#[command(name = "woonveilig", version, about)]
struct Cli {
    /// Profile from the config file
    #[arg(short, long, env = "WOONVEILIG_PROFILE")]
    profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "WOONVEILIG_CONFIG")]
    config: Option<PathBuf>,

    /// Where the watermark is persisted between runs
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Poll the panel and report state changes (default)
    Run,
    /// Switch the panel to `disarmed`, `armed` or `partially_armed`
    Set { state: AlarmState },
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config = match cli.config {
        Some(ref path) => woonveilig_config::load_config_from(path),
        None => woonveilig_config::load_config(),
    }
    .wrap_err("failed to load configuration")?;
    let panel_config = config.panel_config(cli.profile.as_deref())?;
    let panel = Panel::new(panel_config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let state_file = cli
                .state_file
                .unwrap_or_else(|| woonveilig_config::data_dir().join("watermark.json"));
            run(panel, FileWatermarkStore::new(state_file)).await
        }
        Command::Set { state } => set(panel, state).await,
    }
}

async fn run(panel: Panel, store: FileWatermarkStore) -> Result<()> {
    panel
        .login()
        .await
        .wrap_err_with(|| format!("cannot log in to panel at {}", panel.config().host))?;

    let interval = panel.config().poll_interval;
    info!(
        host = %panel.config().host,
        interval_secs = interval.as_secs(),
        state_file = %store.path().display(),
        "polling panel"
    );

    let cancel = CancellationToken::new();
    let mut facts = panel.subscribe();
    let poller = panel.poller(store).spawn(interval, cancel.clone());

    loop {
        tokio::select! {
            biased;
            result = tokio::signal::ctrl_c() => {
                result.wrap_err("cannot listen for Ctrl-C")?;
                info!("shutting down");
                break;
            }
            fact = facts.recv() => match fact {
                Ok(fact) => println!("{}", fact_line(fact)?),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "fact stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    cancel.cancel();
    poller.await?;
    Ok(())
}

async fn set(panel: Panel, state: AlarmState) -> Result<()> {
    panel
        .login()
        .await
        .wrap_err_with(|| format!("cannot log in to panel at {}", panel.config().host))?;

    let attempts = panel.set_state(state).await.into_result()?;
    info!(%state, attempts, "panel mode changed");
    Ok(())
}

fn fact_line(fact: Fact) -> Result<String> {
    Ok(serde_json::to_string(&fact)?)
}
