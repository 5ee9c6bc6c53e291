//! Loads the notebook into a freshly provisioned session.
//!
//! Inline `data:` sources are uploaded as a request body. Anything else is a
//! reference the server opens itself, tried as an ordered list of
//! [`OpenCandidate`]s because some servers only resolve one shape.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::inline::{decode_data_uri, is_data_uri, verify_integrity};
use crate::params::LaunchParams;
use crate::session::SessionHandle;

/// Identifier of the notebook opened inside the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOpenResult {
	pub document_id: String,
	/// `false` when the id came from a response that did not report success.
	pub verified: bool,
}

/// What to do when every open candidate is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenFallbackPolicy {
	/// Fail with [`Error::OpenRejected`].
	#[default]
	Strict,
	/// Use the last response body as the document id anyway.
	AcceptLast,
}

/// One shape of the `open` request: `open?<key>=<value>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenCandidate {
	pub key: &'static str,
	pub value: String,
}

impl OpenCandidate {
	/// Source interpreted as a path on the session server.
	pub fn path(value: impl Into<String>) -> Self {
		Self {
			key: "path",
			value: value.into(),
		}
	}

	/// Source interpreted as a URL the server downloads.
	pub fn url(value: impl Into<String>) -> Self {
		Self { key: "url", value: value.into() }
	}
}

/// Candidate refused by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFailure {
	pub candidate: OpenCandidate,
	pub status: u16,
	pub body: String,
}

/// Result of walking the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
	Opened { document_id: String, candidate: OpenCandidate },
	/// Every candidate failed and the policy accepted the last body.
	Unverified { document_id: String, failures: Vec<CandidateFailure> },
	Exhausted { failures: Vec<CandidateFailure> },
}

impl OpenOutcome {
	pub fn into_result(self) -> Result<DocumentOpenResult> {
		match self {
			OpenOutcome::Opened { document_id, .. } => Ok(DocumentOpenResult {
				document_id,
				verified: true,
			}),
			OpenOutcome::Unverified { document_id, .. } => Ok(DocumentOpenResult {
				document_id,
				verified: false,
			}),
			OpenOutcome::Exhausted { failures } => Err(Error::OpenRejected { failures }),
		}
	}
}

/// Ordered `open` candidates for a non-inline source: first the raw path,
/// then the source resolved to an absolute URL against `page_url`.
///
/// The URL candidate is skipped when the source is relative and there is no
/// page URL to resolve it against.
pub fn open_candidates(source: &str, page_url: Option<&Url>) -> Vec<OpenCandidate> {
	let mut candidates = vec![OpenCandidate::path(source)];
	match binder_runtime::url_tools::resolve_reference(source, page_url) {
		Ok(resolved) => candidates.push(OpenCandidate::url(resolved.to_string())),
		Err(err) => debug!(target = "binder.materialize", %source, error = %err, "no absolute URL candidate"),
	}
	candidates
}

/// Issues the REST calls that load a notebook into a session.
pub struct DocumentMaterializer<'a> {
	http: &'a reqwest::Client,
	policy: OpenFallbackPolicy,
}

impl<'a> DocumentMaterializer<'a> {
	pub fn new(http: &'a reqwest::Client, policy: OpenFallbackPolicy) -> Self {
		Self { http, policy }
	}

	/// Warms the session, then uploads or opens the notebook named by `params`.
	pub async fn materialize(&self, session: &SessionHandle, params: &LaunchParams) -> Result<DocumentOpenResult> {
		self.warm(session).await?;

		let result = if is_data_uri(&params.notebook) {
			let bytes = decode_data_uri(&params.notebook)?;
			if let Some(integrity) = params.notebook_integrity.as_deref() {
				verify_integrity(&bytes, integrity)?;
			}
			let document_id = self.upload(session, bytes).await?;
			DocumentOpenResult {
				document_id,
				verified: true,
			}
		} else {
			let candidates = open_candidates(&params.notebook, params.page_url.as_ref());
			self.open(session, &candidates).await?.into_result()?
		};

		info!(target = "binder.materialize", document_id = %result.document_id, verified = result.verified, "notebook opened");
		Ok(result)
	}

	/// `GET` on the session root; only transport failures matter.
	pub async fn warm(&self, session: &SessionHandle) -> Result<()> {
		let url = session.root_url();
		let response = self.http.get(url.clone()).send().await.map_err(|source| Error::Open {
			url: SessionHandle::redact(&url),
			source,
		})?;
		debug!(target = "binder.materialize", status = response.status().as_u16(), "session root reachable");
		Ok(())
	}

	/// `POST notebookupload` with the raw notebook bytes; returns the body.
	pub async fn upload(&self, session: &SessionHandle, bytes: Vec<u8>) -> Result<String> {
		let url = session.upload_url();
		let target = SessionHandle::redact(&url);
		info!(target = "binder.materialize", url = %target, size = bytes.len(), "uploading notebook");

		let response = self.http.post(url).body(bytes).send().await.map_err(|source| Error::Upload {
			url: target.clone(),
			source,
		})?;
		let status = response.status();
		let body = response.text().await.map_err(|source| Error::Upload {
			url: target.clone(),
			source,
		})?;

		if !status.is_success() {
			return Err(Error::UploadRejected {
				url: target,
				status: status.as_u16(),
				body,
			});
		}
		Ok(body)
	}

	/// Tries each candidate in order, stopping at the first success status.
	///
	/// Requests are strictly sequential: the next candidate is only sent once
	/// the previous response has been read.
	pub async fn open(&self, session: &SessionHandle, candidates: &[OpenCandidate]) -> Result<OpenOutcome> {
		let mut failures = Vec::new();

		for candidate in candidates {
			let url = session.open_url(candidate.key, &candidate.value);
			let target = SessionHandle::redact(&url);
			info!(target = "binder.materialize", key = candidate.key, url = %target, "opening notebook");

			let response = self.http.post(url).send().await.map_err(|source| Error::Open {
				url: target.clone(),
				source,
			})?;
			let status = response.status();
			let body = response.text().await.map_err(|source| Error::Open { url: target.clone(), source })?;

			if status.is_success() {
				return Ok(OpenOutcome::Opened {
					document_id: body,
					candidate: candidate.clone(),
				});
			}

			warn!(target = "binder.materialize", key = candidate.key, status = status.as_u16(), "open request refused");
			failures.push(CandidateFailure {
				candidate: candidate.clone(),
				status: status.as_u16(),
				body,
			});
		}

		if self.policy == OpenFallbackPolicy::AcceptLast {
			if let Some(document_id) = failures.last().map(|last| last.body.clone()) {
				warn!(target = "binder.materialize", "accepting last open response without a success status");
				return Ok(OpenOutcome::Unverified { document_id, failures });
			}
		}
		Ok(OpenOutcome::Exhausted { failures })
	}
}
