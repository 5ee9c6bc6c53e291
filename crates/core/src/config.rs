//! Tunables for a launch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::handshake::DEFAULT_HANDSHAKE_TIMEOUT;
use crate::materialize::OpenFallbackPolicy;

/// Counting beacon hit once per bootstrap.
pub const DEFAULT_TELEMETRY_URL: &str = "https://stats.plutojl.org/count";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Launch configuration. Every field has a default, so a partial JSON
/// document deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootstrapConfig {
	/// Bound on the live-connection attempt before falling back to navigation.
	pub handshake_timeout_ms: u64,
	/// Bound on provisioning; `None` waits for the build service indefinitely.
	pub provision_timeout_ms: Option<u64>,
	/// TCP connect timeout for every HTTP request.
	pub connect_timeout_ms: u64,
	pub open_fallback: OpenFallbackPolicy,
	/// Log `message` fields of events that repeat the current phase.
	pub log_repeated_messages: bool,
	/// Beacon URL; `None` disables telemetry.
	pub telemetry_url: Option<String>,
}

impl Default for BootstrapConfig {
	fn default() -> Self {
		Self {
			handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64,
			provision_timeout_ms: None,
			connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
			open_fallback: OpenFallbackPolicy::default(),
			log_repeated_messages: false,
			telemetry_url: Some(DEFAULT_TELEMETRY_URL.to_string()),
		}
	}
}

impl BootstrapConfig {
	pub fn handshake_timeout(&self) -> Duration {
		Duration::from_millis(self.handshake_timeout_ms)
	}

	pub fn provision_timeout(&self) -> Option<Duration> {
		self.provision_timeout_ms.map(Duration::from_millis)
	}

	pub fn connect_timeout(&self) -> Duration {
		Duration::from_millis(self.connect_timeout_ms)
	}

	pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
		self.handshake_timeout_ms = timeout.as_millis() as u64;
		self
	}

	pub fn with_provision_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.provision_timeout_ms = timeout.map(|t| t.as_millis() as u64);
		self
	}

	pub fn with_open_fallback(mut self, policy: OpenFallbackPolicy) -> Self {
		self.open_fallback = policy;
		self
	}

	pub fn with_log_repeated_messages(mut self, enabled: bool) -> Self {
		self.log_repeated_messages = enabled;
		self
	}

	pub fn with_telemetry_url(mut self, url: Option<String>) -> Self {
		self.telemetry_url = url;
		self
	}
}
