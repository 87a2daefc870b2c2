//! ECG Risk Monitor CLI
//!
//! Real-time wearable ECG ingestion and cardiac-risk screening.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ecg_risk_monitor::{
    config::Config,
    core::{HealthAssessment, RiskScorer},
    session::{MonitorSession, SessionState},
    transport::{
        synthetic_ecg, DeviceTransport, ScriptedTransport, StdinTransport, SyntheticEcg, Transport,
    },
    SCREENING_DISCLAIMER, VERSION,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ecg-monitor")]
#[command(version = VERSION)]
#[command(about = "Real-time wearable ECG ingestion and cardiac-risk screening", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a live device stream
    Monitor {
        /// Device or recording to read (defaults to the configured device)
        #[arg(long, conflicts_with = "stdin")]
        device: Option<PathBuf>,

        /// Read the stream from standard input
        #[arg(long)]
        stdin: bool,

        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,

        /// Print assessments as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run the pipeline against a synthetic ECG stream
    Simulate {
        /// Heart rate of the synthetic stream
        #[arg(long, default_value = "72")]
        bpm: u32,

        /// Device-reported irregularity (0-1)
        #[arg(long, default_value = "0.05")]
        irregularity: f64,

        /// Length of the recording in seconds
        #[arg(long, default_value = "10")]
        seconds: u64,

        /// Print assessments as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Score a single heart rate and irregularity
    Score {
        #[arg(long)]
        bpm: u32,

        #[arg(long, default_value = "0.0")]
        irregularity: f64,
    },

    /// Show configuration
    Config,

    /// Display the screening disclaimer
    Disclaimer,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Monitor {
            device,
            stdin,
            seconds,
            json,
        } => cmd_monitor(device, stdin, seconds, json).await,
        Commands::Simulate {
            bpm,
            irregularity,
            seconds,
            json,
        } => cmd_simulate(bpm, irregularity, seconds, json).await,
        Commands::Score { bpm, irregularity } => cmd_score(bpm, irregularity),
        Commands::Config => cmd_config(),
        Commands::Disclaimer => {
            println!("{SCREENING_DISCLAIMER}");
            Ok(())
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the default level.
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("loading {}", Config::config_path().display()))
}

async fn cmd_monitor(
    device: Option<PathBuf>,
    stdin: bool,
    seconds: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;

    if stdin {
        let session = MonitorSession::new(config, StdinTransport::new());
        return run_session(session, seconds.map(Duration::from_secs), json).await;
    }

    let Some(path) = device.or_else(|| config.transport.device_path.clone()) else {
        bail!("no device given; pass --device, --stdin, or set transport.device_path in the config");
    };
    let session = MonitorSession::new(config, DeviceTransport::new(path));
    run_session(session, seconds.map(Duration::from_secs), json).await
}

async fn cmd_simulate(bpm: u32, irregularity: f64, seconds: u64, json: bool) -> Result<()> {
    if bpm == 0 {
        bail!("--bpm must be positive");
    }
    let config = load_config()?;
    let params = SyntheticEcg {
        heart_rate: bpm,
        irregularity,
        duration: Duration::from_secs(seconds),
        ..SyntheticEcg::default()
    };
    let transport = ScriptedTransport::new(synthetic_ecg(&params)).hold_open();
    let session = MonitorSession::new(config, transport);
    run_session(session, Some(Duration::from_secs(seconds)), json).await
}

/// Connect, print one assessment per scoring pass, disconnect on Ctrl+C or timeout.
async fn run_session<T: Transport>(
    mut session: MonitorSession<T>,
    limit: Option<Duration>,
    json: bool,
) -> Result<()> {
    if !json {
        println!("ECG Risk Monitor v{VERSION}");
        println!("The score is a screening heuristic, not a diagnosis.");
        println!("Press Ctrl+C to stop");
        println!();
    }

    let session_id = session.connect().await.context("connecting to device")?;
    info!(session = %session_id, "Session started");

    let mut assessments = session.subscribe_assessments();
    let stop = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !json {
                    println!();
                }
                break;
            }
            _ = &mut stop => break,
            changed = assessments.changed() => {
                if changed.is_err() {
                    break;
                }
                let assessment = assessments.borrow_and_update().clone();
                let state = session.state().await;
                if state == SessionState::Disconnected {
                    warn!("Device disconnected");
                    break;
                }
                print_assessment(state, &assessment, json);
            }
        }
    }

    session.disconnect().await;
    if !json {
        println!();
        println!("{}", session.stats().summary());
    }
    Ok(())
}

fn print_assessment(state: SessionState, assessment: &HealthAssessment, json: bool) {
    if json {
        let line = serde_json::json!({
            "state": state,
            "valid": state.is_monitoring(),
            "assessment": assessment,
        });
        println!("{line}");
        return;
    }

    let now = chrono::Local::now().format("%H:%M:%S");
    if !state.is_monitoring() {
        println!("[{now}] {state}... ({})", assessment.description);
        return;
    }
    if assessment.is_insufficient() {
        println!("[{now}] {}", assessment.description);
        return;
    }

    let hr = assessment
        .heart_rate
        .map(|hr| format!("{hr} bpm"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{now}] HR {hr} | irregularity {:.2} | score {:>3} ({}) | brady {} tachy {} irregular {}",
        assessment.irregularity.unwrap_or(0.0),
        assessment.score,
        assessment.level,
        assessment.breakdown.brady_points,
        assessment.breakdown.tachy_points,
        assessment.breakdown.irregularity_points
    );
}

fn cmd_score(bpm: u32, irregularity: f64) -> Result<()> {
    let config = load_config()?;
    let scorer = RiskScorer::new(config.scoring, config.rhythm);
    let assessment = scorer.score(bpm, irregularity);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
