mod launch;
pub mod provision;
mod shutdown;

use binder::BootstrapConfig;

use crate::cli::Commands;
use crate::config::apply_launch_flags;
use crate::error::Result;

pub async fn dispatch(command: Commands, config: BootstrapConfig) -> Result<()> {
	match command {
		Commands::Launch(args) => {
			let config = apply_launch_flags(config, &args);
			launch::execute(&args, config).await
		}
		Commands::Provision {
			binder_url,
			provision_timeout_ms,
		} => {
			let session = provision::execute(&binder_url, provision_timeout_ms, &config).await?;
			println!("{}", session.session_url());
			println!("{}", session.token());
			Ok(())
		}
		Commands::Shutdown { session_url, token } => shutdown::execute(&session_url, &token, &config).await,
	}
}

pub(crate) fn http_client(config: &BootstrapConfig) -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.connect_timeout(config.connect_timeout())
		.build()
		.map_err(|e| binder::Error::Client(e).into())
}
