//! Provisioned session handle and the endpoints derived from it.

use std::fmt;

use binder_runtime::url_tools::{parse_http_url, trailing_slash, with_query_params, ws_address_from_base};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};

/// Path the Pluto server is mounted under inside a Binder session.
pub const PLUTO_MOUNT: &str = "pluto/";

/// Credentials for one provisioned session.
///
/// `session_url` always ends with `/`, so relative endpoint names resolve
/// underneath it.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SessionHandle {
	session_url: Url,
	#[serde(rename = "token")]
	session_token: String,
}

impl SessionHandle {
	/// Builds a handle from an absolute `http(s)` session URL.
	pub fn new(session_url: &str, token: impl Into<String>) -> Result<Self> {
		let normalized = trailing_slash(session_url);
		let url = parse_http_url(&normalized).map_err(|e| Error::InvalidSessionUrl {
			url: session_url.to_string(),
			reason: e.to_string(),
		})?;
		Ok(Self {
			session_url: url,
			session_token: token.into(),
		})
	}

	/// Handle for the Pluto server behind a Binder `ready` event's server URL.
	pub fn from_server_url(server_url: &str, token: impl Into<String>) -> Result<Self> {
		Self::new(&format!("{}{}", trailing_slash(server_url), PLUTO_MOUNT), token)
	}

	pub fn session_url(&self) -> &Url {
		&self.session_url
	}

	pub fn token(&self) -> &str {
		&self.session_token
	}

	/// Copy of `url` carrying the session token.
	pub fn with_token(&self, url: &Url) -> Url {
		with_query_params(url, &[("token", &self.session_token)])
	}

	/// `url` with the token stripped, for logs and error messages.
	pub fn redact(url: &Url) -> String {
		let mut out = url.clone();
		let kept: Vec<(String, String)> = url
			.query_pairs()
			.filter(|(k, _)| k != "token")
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect();
		out.set_query(None);
		if !kept.is_empty() {
			out.query_pairs_mut().extend_pairs(kept);
		}
		out.to_string()
	}

	/// Session root with token, used for the warm-up request.
	pub fn root_url(&self) -> Url {
		self.with_token(&self.session_url)
	}

	pub fn upload_url(&self) -> Url {
		self.with_token(&self.endpoint("notebookupload"))
	}

	/// `open?<key>=<value>&token=...`
	pub fn open_url(&self, key: &str, value: &str) -> Url {
		let open = with_query_params(&self.endpoint("open"), &[(key, value)]);
		self.with_token(&open)
	}

	/// Full-page editor address for `document_id`.
	pub fn edit_url(&self, document_id: &str) -> Url {
		let edit = with_query_params(&self.endpoint("edit"), &[("id", document_id)]);
		self.with_token(&edit)
	}

	/// Websocket address of the session's message channel.
	pub fn channels_url(&self) -> Result<Url> {
		let base = ws_address_from_base(&self.session_url)?;
		Ok(self.with_token(&base.join("channels").unwrap_or(base)))
	}

	/// Shutdown endpoint of the hosting server, one level above the mount.
	pub fn shutdown_url(&self) -> Url {
		self.with_token(&self.endpoint("../api/shutdown"))
	}

	fn endpoint(&self, path: &str) -> Url {
		self.session_url.join(path).unwrap_or_else(|_| self.session_url.clone())
	}
}

impl fmt::Debug for SessionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionHandle")
			.field("session_url", &self.session_url.as_str())
			.field("token", &"<redacted>")
			.finish()
	}
}

/// Capability to shut a provisioned session down.
///
/// Returned from every bootstrap that got as far as provisioning. The launcher
/// never calls it; cleanup is left to whoever holds the hook.
#[derive(Clone)]
pub struct ShutdownHook {
	http: reqwest::Client,
	url: Url,
}

impl ShutdownHook {
	pub fn new(http: reqwest::Client, session: &SessionHandle) -> Self {
		Self {
			http,
			url: session.shutdown_url(),
		}
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Sends `POST /api/shutdown`.
	pub async fn shutdown(&self) -> Result<()> {
		let target = SessionHandle::redact(&self.url);
		info!(target = "binder.session", url = %target, "requesting session shutdown");

		let response = self.http.post(self.url.clone()).send().await.map_err(|e| Error::Shutdown {
			url: target.clone(),
			reason: e.to_string(),
		})?;

		let status = response.status();
		if !status.is_success() {
			warn!(target = "binder.session", url = %target, status = status.as_u16(), "shutdown rejected");
			return Err(Error::Shutdown {
				url: target,
				reason: format!("unexpected status {status}"),
			});
		}
		Ok(())
	}
}

impl fmt::Debug for ShutdownHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ShutdownHook").field("url", &SessionHandle::redact(&self.url)).finish()
	}
}
