use std::time::Duration;

use binder::provision::build_stream_url;
use binder::{BootstrapConfig, ProvisionClient, SessionHandle};
use tracing::info;

use crate::error::Result;

/// Provisions a session; the explicit timeout wins over the configured one.
pub async fn execute(binder_url: &str, provision_timeout_ms: Option<u64>, config: &BootstrapConfig) -> Result<SessionHandle> {
	let http = super::http_client(config)?;
	let client = ProvisionClient::new(http).with_log_repeated_messages(config.log_repeated_messages);
	let build_url = build_stream_url(binder_url);
	let limit = provision_timeout_ms.map(Duration::from_millis).or(config.provision_timeout());

	info!(target = "binder.cli", url = %build_url, "provisioning");
	Ok(client.request_session_within(&build_url, limit).await?)
}
