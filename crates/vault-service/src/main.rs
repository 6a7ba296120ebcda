//! Main entry point for the leads vault storefront.
//!
//! Runs the storefront either as an HTTP API (`serve`) or as one-shot
//! commands against the configured wallet, contract and leads source.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use vault_config::Config;

mod commands;
mod factory_registry;
mod server;

/// Command-line arguments for the storefront.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "VAULT_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
	/// Serve the storefront HTTP API (default)
	Serve,
	/// Connect the wallet and print the package prices
	Prices,
	/// Print the current leads list
	Leads {
		/// Connect the wallet first so the list reflects its purchases
		#[arg(long)]
		connect: bool,
	},
	/// Buy a lead package
	Buy {
		/// Package id from the catalogue
		#[arg(short, long)]
		package: u32,
		/// Skip the confirmation prompt
		#[arg(short, long)]
		yes: bool,
	},
	/// Print the wallet, balances and purchased leads
	Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.storefront.id);

	let storefront = Arc::new(factory_registry::build_storefront(&config)?);

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => {
			let Some(api_config) = config.api.clone().filter(|api| api.enabled) else {
				return Err("The [api] section is missing or disabled".into());
			};
			server::start_server(api_config, storefront).await?;
			tracing::info!("Stopped storefront API");
		},
		Command::Prices => commands::prices(&storefront).await?,
		Command::Leads { connect } => commands::leads(&storefront, connect).await?,
		Command::Buy { package, yes } => commands::buy(&storefront, package, yes).await?,
		Command::Status => commands::status(&storefront).await?,
	}

	Ok(())
}
