use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use boat_link_runtime::config::BoatConfig;
use boat_link_runtime::link::PeerAddress;
use boat_link_runtime::runtime::{self, BoxError};

#[derive(Parser)]
#[command(name = "boat-link", about = "RC boat radio link and motor runtime")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Control station hardware address (AA:BB:CC:DD:EE:FF)
    #[arg(long, global = true)]
    control_addr: Option<PeerAddress>,

    /// Vehicle hardware address (AA:BB:CC:DD:EE:FF)
    #[arg(long, global = true)]
    vehicle_addr: Option<PeerAddress>,

    /// Silence before the boat stops, in milliseconds
    #[arg(long, global = true)]
    link_timeout_ms: Option<u64>,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand)]
enum RoleCommand {
    /// Run on the boat: receive commands and drive the motors
    Vehicle {
        /// Serial port of the H-bridge bridge (omit to simulate motors)
        #[arg(long)]
        motor_port: Option<String>,
    },
    /// Run the keyboard control station
    Control,
}

fn load_config(cli: &Cli) -> Result<BoatConfig, BoxError> {
    let mut config = match &cli.config {
        Some(path) => BoatConfig::from_file(path)?,
        None => BoatConfig::default(),
    };

    if let Some(addr) = cli.control_addr {
        config.addresses.control = addr;
    }
    if let Some(addr) = cli.vehicle_addr {
        config.addresses.vehicle = addr;
    }
    if let Some(ms) = cli.link_timeout_ms {
        config.link_timeout = Duration::from_millis(ms);
    }
    if let RoleCommand::Vehicle {
        motor_port: Some(port),
    } = &cli.role
    {
        config.motor_port = Some(port.clone());
    }

    Ok(config)
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    let result = match cli.role {
        RoleCommand::Vehicle { .. } => runtime::run_vehicle(&config).await,
        RoleCommand::Control => runtime::run_control(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
