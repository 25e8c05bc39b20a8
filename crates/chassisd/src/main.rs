//! chassisd entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chassis_device::sim::MAX_SIM_PORTS;
use chassisd::{load_chassis_config, ChassisDaemon, DaemonConfig};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Chassis manager daemon
#[derive(Parser, Debug)]
#[command(name = "chassisd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chassis config file (.yaml, .yml or .json)
    #[arg(short = 'c', long)]
    chassis_config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Verify the chassis config and exit
    #[arg(long)]
    verify_only: bool,

    /// Front-panel ports per unit on the simulated device
    #[arg(long, default_value_t = MAX_SIM_PORTS)]
    sim_port_count: u32,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received ctrl-c");
}

async fn run(args: Args) -> Result<()> {
    let chassis = load_chassis_config(&args.chassis_config)?;
    info!(
        "Loaded chassis config {} (platform {})",
        args.chassis_config.display(),
        chassis.platform()
    );

    let daemon = ChassisDaemon::new(DaemonConfig {
        chassis_config: args.chassis_config,
        verify_only: args.verify_only,
        sim_port_count: args.sim_port_count,
    });
    daemon.run(chassis, shutdown_signal()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, args.json_logs) {
        eprintln!("chassisd: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("--- Starting chassisd ---");

    match run(args).await {
        Ok(()) => {
            info!("chassisd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("chassisd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
