mod cli;
mod config;
mod dns;
mod domains;
mod engine;
mod error;
mod exchange;
mod output;
mod query;
mod stats;
mod stop;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::engine::Stress;
use crate::exchange::UdpExchange;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = cli.run_config();

	// Debug output goes to stderr so it does not mix with the report on stdout
	let default_level = if config.show_debug { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();

	// Validate before touching the network so bad flags fail fast
	config.validate()?;
	let server = config.server_addr()?;

	let engine = Stress::init(config, UdpExchange::new(server))
		.await
		.context("failed to initialize stress run")?;
	let engine = Arc::new(engine);

	output::print_config_summary(engine.config(), engine.source().item_count());
	println!("Running stress...");

	let report = engine.start().await?;
	output::print_report(&report);

	Ok(())
}
