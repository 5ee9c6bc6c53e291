use std::sync::Arc;

use binder::{BootstrapConfig, HandshakeOutcome, LaunchParams, Launcher, SessionHandle, WebSocketConnector};
use colored::Colorize;
use tracing::{info, warn};
use url::Url;

use crate::cli::LaunchArgs;
use crate::error::{CliError, Result};
use crate::state::{ConsoleNavigator, ConsoleState};

pub async fn execute(args: &LaunchArgs, config: BootstrapConfig) -> Result<()> {
	let page_url = args
		.page_url
		.as_deref()
		.map(Url::parse)
		.transpose()
		.map_err(|e| CliError::InvalidArgument(format!("--page-url: {e}")))?;
	let params = LaunchParams::new(&args.binder_url, &args.notebook)
		.with_integrity(args.integrity.clone())
		.with_page_url(page_url);

	info!(target = "binder.cli", binder_url = %args.binder_url, notebook = %args.notebook, "launching");

	let http = super::http_client(&config)?;
	let state = Arc::new(ConsoleState::new());
	let navigator = ConsoleNavigator::new();
	let launcher = Launcher::with_client(http, config, state, Arc::new(navigator.clone()));

	let launch = match launcher.bootstrap(&params, &WebSocketConnector).await {
		Ok(launch) => launch,
		Err(failure) => {
			if let Some(hook) = failure.shutdown.as_ref().filter(|_| args.shutdown_after) {
				if let Err(err) = hook.shutdown().await {
					warn!(target = "binder.cli", error = %err, "shutdown after failed launch did not succeed");
				}
			}
			return Err(failure.into());
		}
	};

	println!("{} {}", "session:".bold(), SessionHandle::redact(launch.session.session_url()));
	println!("{} {}", "notebook:".bold(), launch.document.document_id);
	if !launch.document.verified {
		println!("{}", "warning: no open request succeeded; notebook id is unverified".yellow());
	}

	match launch.connection {
		HandshakeOutcome::Live(channel) => {
			println!("{} {}", "live:".green().bold(), SessionHandle::redact(channel.url()));
			channel.close().await?;
		}
		HandshakeOutcome::Redirected(url) => {
			println!("{} {}", "editor:".yellow().bold(), url);
		}
	}

	if args.shutdown_after {
		launch.shutdown.shutdown().await?;
		println!("{}", "session shut down".dimmed());
	}
	Ok(())
}
