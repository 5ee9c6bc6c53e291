use binder_cli::cli::Cli;
use binder_cli::{commands, config, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let result = match config::load_config(cli.config.as_deref()) {
		Ok(config) => commands::dispatch(cli.command, config).await,
		Err(err) => Err(err),
	};

	if let Err(err) = result {
		error!(target = "binder.cli", error = %err, "command failed");
		std::process::exit(1);
	}
}
