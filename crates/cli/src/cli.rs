use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "binder")]
#[command(about = "Launch live notebook sessions on Binder from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// JSON config file (defaults to ~/.config/binder/config.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Provision a session, open a notebook in it and connect
	Launch(LaunchArgs),

	/// Provision a session and print its URL and token
	Provision {
		/// Binder launch URL, e.g. https://mybinder.org/v2/gh/org/repo/main
		binder_url: String,

		/// Give up after this many milliseconds
		#[arg(long, value_name = "MS")]
		provision_timeout_ms: Option<u64>,
	},

	/// Shut a running session down
	Shutdown {
		/// Session URL as printed by `launch` or `provision`
		session_url: String,
		token: String,
	},
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct LaunchArgs {
	/// Binder launch URL, e.g. https://mybinder.org/v2/gh/org/repo/main
	pub binder_url: String,

	/// Notebook path in the repository, absolute URL, or data: URI
	pub notebook: String,

	/// Subresource integrity string checked against an inline notebook
	#[arg(long, value_name = "SRI")]
	pub integrity: Option<String>,

	/// Address of the page relative notebook paths are resolved against
	#[arg(long, value_name = "URL")]
	pub page_url: Option<String>,

	/// Bound on the live connection attempt (ms)
	#[arg(long, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Bound on provisioning (ms); unbounded by default
	#[arg(long, value_name = "MS")]
	pub provision_timeout_ms: Option<u64>,

	/// Skip the usage counter request
	#[arg(long)]
	pub no_telemetry: bool,

	/// Accept the last open response even when every candidate was refused
	#[arg(long)]
	pub accept_last_open: bool,

	/// Shut the session down once the launch has finished
	#[arg(long)]
	pub shutdown_after: bool,
}
