use binder::{BootstrapConfig, SessionHandle, ShutdownHook};
use tracing::info;

use crate::error::Result;

pub async fn execute(session_url: &str, token: &str, config: &BootstrapConfig) -> Result<()> {
	let session = SessionHandle::new(session_url, token)?;
	let hook = ShutdownHook::new(super::http_client(config)?, &session);

	info!(target = "binder.cli", url = %SessionHandle::redact(hook.url()), "shutting session down");
	hook.shutdown().await?;
	println!("session shut down");
	Ok(())
}
