//! Error taxonomy for a launch attempt.

use std::time::Duration;

use binder_runtime::RuntimeError;
use thiserror::Error;

use crate::materialize::CandidateFailure;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The provisioning stream could not even be opened.
	#[error("cannot open provisioning stream at {url:?}: {source}")]
	InvalidSourceUrl {
		url: String,
		#[source]
		source: RuntimeError,
	},

	/// The build service reported an explicit failure.
	#[error("provisioning failed: {payload}")]
	ProvisioningFailed { payload: String },

	/// The provisioning stream errored or closed before resolving.
	#[error("lost connection to {url}: {source}")]
	ConnectionLost {
		url: String,
		#[source]
		source: RuntimeError,
	},

	#[error("provisioning did not finish within {0:?}")]
	ProvisioningTimeout(Duration),

	#[error("build service returned an unusable session URL {url:?}: {reason}")]
	InvalidSessionUrl { url: String, reason: String },

	#[error("notebook upload to {url} failed: {source}")]
	Upload {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("notebook upload to {url} rejected with status {status}: {body}")]
	UploadRejected { url: String, status: u16, body: String },

	#[error("request to {url} failed: {source}")]
	Open {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("no open request was accepted ({})", describe_failures(failures))]
	OpenRejected { failures: Vec<CandidateFailure> },

	#[error("invalid notebook source: {reason}")]
	InvalidDocumentSource { reason: String },

	#[error("notebook integrity check failed: expected {expected}, got {actual}")]
	IntegrityMismatch { expected: String, actual: String },

	#[error("state update failed: {0}")]
	State(String),

	#[error("live connection failed: {0}")]
	Connect(String),

	#[error("shutdown request to {url} failed: {reason}")]
	Shutdown { url: String, reason: String },

	#[error("failed to create HTTP client: {0}")]
	Client(#[source] reqwest::Error),

	#[error(transparent)]
	Runtime(#[from] RuntimeError),
}

fn describe_failures(failures: &[CandidateFailure]) -> String {
	if failures.is_empty() {
		return "no candidates".to_string();
	}
	failures
		.iter()
		.map(|f| format!("{}={} -> {}", f.candidate.key, f.candidate.value, f.status))
		.collect::<Vec<_>>()
		.join(", ")
}
