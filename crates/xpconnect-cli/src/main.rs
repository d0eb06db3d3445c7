//! xpconnect - Command-line tool for the X-Plane UDP dataref protocol
//!
//! Watch datarefs, set values and fire commands on a running simulator.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xpconnect_client::{Command, XPlaneConnector};
use xpconnect_core::DataRefValue;

mod config;

const READY_TIMEOUT: Duration = Duration::from_secs(2);
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

type Engine = JoinHandle<xpconnect_client::Result<()>>;

/// xpconnect - talk to X-Plane over UDP
#[derive(Parser)]
#[command(name = "xpconnect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Simulator IP address
    #[arg(short = 'H', long, global = true, env = "XPCONNECT_HOST")]
    host: Option<String>,

    /// Simulator UDP port
    #[arg(short, long, global = true, env = "XPCONNECT_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print dataref values as they arrive
    Watch {
        /// Dataref paths
        #[arg(required = true)]
        paths: Vec<String>,

        /// Updates per second requested from the simulator
        #[arg(short, long, default_value = "1")]
        frequency: i32,

        /// Treat each path as a string dataref of this many characters
        #[arg(short, long)]
        string_len: Option<usize>,
    },

    /// Write a dataref
    Set {
        path: String,

        value: String,

        /// Send the value as a string instead of a float
        #[arg(long)]
        string: bool,
    },

    /// Fire a simulator command
    Command {
        name: String,

        /// Keep sending the command for this many milliseconds
        #[arg(long)]
        hold_ms: Option<u64>,
    },

    /// Ask the simulator to quit
    Quit,

    /// Fail a simulated system
    Fail { system: i32 },

    /// Recover a failed system
    Recover { system: i32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs)?;

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let _ = shutdown_tx.send(()).await;
            }
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let settings = config::resolve(cli.config.as_deref(), cli.host, cli.port)?;
    let xp = Arc::new(XPlaneConnector::new(settings).context("Invalid connector settings")?);

    match cli.command {
        Commands::Watch {
            paths,
            frequency,
            string_len,
        } => {
            println!(
                "{} Watching {} dataref(s) on {}",
                "XPCONNECT".cyan().bold(),
                paths.len(),
                xp.remote_addr()
            );
            watch(&xp, &paths, frequency, string_len, &mut shutdown_rx).await?;
        }

        Commands::Set {
            path,
            value,
            string,
        } => {
            let value = if string {
                DataRefValue::String(value)
            } else {
                let v: f32 = value
                    .parse()
                    .with_context(|| format!("{:?} is not a number (use --string)", value))?;
                DataRefValue::Float(v)
            };
            let engine = open(&xp).await?;
            xp.set_dataref_value(&path, value)
                .await
                .with_context(|| format!("Failed to set {}", path))?;
            println!("{} {}", "set".green(), path);
            close(&xp, engine).await?;
        }

        Commands::Command { name, hold_ms } => {
            let command = Command::new(name);
            let engine = open(&xp).await?;
            match hold_ms {
                Some(ms) => {
                    let handle = xp.start_command(&command)?;
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
                        _ = shutdown_rx.recv() => {}
                    }
                    let sent = xp.stop_command(handle).await?;
                    println!("{} {} ({} sends)", "held".green(), command.name(), sent);
                }
                None => {
                    xp.send_command(&command)
                        .await
                        .with_context(|| format!("Failed to send {}", command.name()))?;
                    println!("{} {}", "sent".green(), command.name());
                }
            }
            close(&xp, engine).await?;
        }

        Commands::Quit => {
            let engine = open(&xp).await?;
            xp.quit_simulator().await?;
            close(&xp, engine).await?;
        }

        Commands::Fail { system } => {
            let engine = open(&xp).await?;
            xp.fail(system).await?;
            close(&xp, engine).await?;
        }

        Commands::Recover { system } => {
            let engine = open(&xp).await?;
            xp.recover(system).await?;
            close(&xp, engine).await?;
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

/// Start the connector in the background and wait for its socket
async fn open(xp: &Arc<XPlaneConnector>) -> Result<Engine> {
    let runner = xp.clone();
    let engine = tokio::spawn(async move { runner.start().await });

    let deadline = Instant::now() + READY_TIMEOUT;
    while xp.local_addr().is_none() {
        if engine.is_finished() {
            engine.await.context("Connector task failed")??;
            bail!("Connector stopped before it was ready");
        }
        if Instant::now() >= deadline {
            bail!("Connector did not start within {:?}", READY_TIMEOUT);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Ok(engine)
}

async fn close(xp: &XPlaneConnector, engine: Engine) -> Result<()> {
    xp.stop(STOP_TIMEOUT).await.context("Failed to stop connector")?;
    engine
        .await
        .context("Connector task failed")?
        .context("Connector terminated")?;
    Ok(())
}

async fn watch(
    xp: &Arc<XPlaneConnector>,
    paths: &[String],
    frequency: i32,
    string_len: Option<usize>,
    shutdown_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    for path in paths {
        match string_len {
            Some(len) => {
                xp.subscribe_string_path(path, frequency, len, |element, text| {
                    println!("{} = {:?}", element.path().cyan(), text);
                })?;
            }
            None => {
                xp.subscribe_path(path, frequency, |element, value| {
                    println!("{} = {}", element.path().cyan(), value);
                })?;
            }
        }
    }

    let mut engine = open(xp).await?;

    tokio::select! {
        _ = shutdown_rx.recv() => {}
        joined = &mut engine => {
            joined.context("Connector task failed")?.context("Connector terminated")?;
            return Ok(());
        }
    }

    close(xp, engine).await
}
