//! # Event Replay - Main Entry Point
//!
//! Loads a scripted scenario, replays it against an
//! [`EventDispatcher`](event_dispatcher::EventDispatcher) and prints what
//! fired, in order, as JSON on stdout.
//!
//! ## Quick Start
//!
//! ```bash
//! # Replay a scenario with the default configuration
//! event-replay --scenario scenarios/checkout.toml
//!
//! # Custom configuration and verbose dispatcher logs
//! event-replay --config replay.toml --scenario checkout.toml --log-level debug
//!
//! # JSON logs on stderr
//! event-replay --scenario checkout.toml --json-logs
//! ```
//!
//! ## Configuration
//!
//! The host loads configuration from a TOML file (default: `replay.toml`).
//! If the file doesn't exist, a default configuration will be created.

use event_dispatcher::EventDispatcher;
use tracing::{error, info};

pub mod cli;
pub mod config;
pub mod logging;
pub mod scenario;

use cli::CliArgs;
use config::AppConfig;
use scenario::{run_scenario, Scenario};

pub use config::LoggingSettings;
pub use scenario::ReplayReport;

/// Runs the replay host.
///
/// 1. Parse command-line arguments
/// 2. Load the configuration file and apply CLI overrides
/// 3. Initialize logging
/// 4. Load and replay the scenario, then print the report
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path).await?;
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    config.validate()?;
    info!("✅ Configuration loaded from {}", args.config_path.display());

    let scenario = Scenario::load(&args.scenario_path).await?;
    let events = EventDispatcher::with_config(config.dispatcher);

    match run_scenario(&events, &scenario).await {
        Ok(report) => {
            info!(
                "🏁 Replay finished: {} listener calls, {} responses",
                report.fired.len(),
                report.responses.len()
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("❌ Replay failed: {e}");
            Err(e.into())
        }
    }
}
