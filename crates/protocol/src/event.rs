//! Provisioning stream payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Single JSON payload carried in the `data` field of a build-service event.
///
/// Format as emitted by the build service:
/// ```json
/// { "phase": "ready", "message": "server running", "url": "https://hub/user/x/", "token": "abc" }
/// ```
///
/// Only `phase` drives control flow. `url` and `token` are populated on the
/// terminal `ready` event; `message` is informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionEvent {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phase: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
}

impl ProvisionEvent {
	/// Parses one event-stream `data` payload.
	pub fn from_data(data: &str) -> serde_json::Result<Self> {
		serde_json::from_str(data)
	}

	/// Classified phase, or `None` when the payload carries no phase.
	pub fn kind(&self) -> Option<ProvisionPhase> {
		self.phase.as_deref().map(ProvisionPhase::parse)
	}
}

/// Phase vocabulary of the build service.
///
/// Only the two terminal phases are distinguished; every other value
/// (`waiting`, `fetching`, `building`, `launching`, ...) is kept verbatim in
/// [`ProvisionPhase::Other`] so unrecognized phases stay informational.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProvisionPhase {
	Failed,
	Ready,
	Other(String),
}

impl ProvisionPhase {
	/// Classifies a raw phase string, case-insensitively.
	pub fn parse(raw: &str) -> Self {
		let lowered = raw.trim().to_ascii_lowercase();
		match lowered.as_str() {
			"failed" => ProvisionPhase::Failed,
			"ready" => ProvisionPhase::Ready,
			_ => ProvisionPhase::Other(lowered),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			ProvisionPhase::Failed => "failed",
			ProvisionPhase::Ready => "ready",
			ProvisionPhase::Other(phase) => phase,
		}
	}

	/// Whether this phase ends the stream.
	pub fn is_terminal(&self) -> bool {
		matches!(self, ProvisionPhase::Failed | ProvisionPhase::Ready)
	}
}

impl fmt::Display for ProvisionPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
