use std::{env, env::VarError};

use clap::Parser;
use log::*;

use crate::{config::ServerConfig, errors::ServerError};

/// Command line overrides for the server. Anything given here wins over the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "loyalty_server")]
#[command(about = "Loyalty points gateway: order submission, accrual reconciliation and withdrawals", long_about = None)]
pub struct Cli {
    #[arg(short = 'a', long = "address", value_name = "HOST:PORT", help = "Address to serve the API on")]
    pub address: Option<String>,
    #[arg(short = 'd', long = "database", value_name = "URL", help = "SQLite database URL")]
    pub database_url: Option<String>,
    #[arg(short = 'r', long = "accrual-address", value_name = "URL", help = "Base URL of the accrual resolver")]
    pub accrual_system_address: Option<String>,
    #[arg(long = "show-env", help = "Print the relevant environment variables and exit")]
    pub show_env: bool,
}

impl Cli {
    /// Applies the command line overrides to `config`.
    pub fn apply(&self, config: &mut ServerConfig) -> Result<(), ServerError> {
        if let Some(address) = &self.address {
            config.set_address(address)?;
            debug!("🪛️ Serving on {}:{} (from the command line)", config.host, config.port);
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(url) = &self.accrual_system_address {
            config.accrual_system_address = url.clone();
        }
        Ok(())
    }
}

/// Parses the command line. Returns `None` if the process should exit without starting the server.
pub fn handle_command_line_args() -> Option<Cli> {
    let cli = Cli::parse();
    if cli.show_env {
        display_envs();
        return None;
    }
    Some(cli)
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "LPG_HOST",
        "LPG_PORT",
        "RUN_ADDRESS",
        "LPG_DATABASE_URL",
        "DATABASE_URI",
        "LPG_DB_MAX_CONNECTIONS",
        "LPG_ACCRUAL_SYSTEM_ADDRESS",
        "ACCRUAL_SYSTEM_ADDRESS",
        "LPG_POLL_INTERVAL_MS",
        "LPG_RESOLVER_TIMEOUT_MS",
        "LPG_TOKEN_EXPIRY_HOURS",
        "LPG_SECURE_COOKIES",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
