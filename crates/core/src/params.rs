//! Externally supplied launch parameters.

use serde::{Deserialize, Serialize};
use url::Url;

/// What to launch and where the notebook comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchParams {
	/// Binder launch link, e.g. `https://mybinder.org/v2/gh/org/repo/HEAD`.
	pub binder_url: String,
	/// Inline `data:` URI, server-local path, or (relative) URL of the notebook.
	pub notebook: String,
	/// Subresource-integrity metadata checked against inline notebook bytes.
	#[serde(default)]
	pub notebook_integrity: Option<String>,
	/// Address of the static page, used to resolve relative notebook URLs.
	#[serde(default)]
	pub page_url: Option<Url>,
}

impl LaunchParams {
	pub fn new(binder_url: impl Into<String>, notebook: impl Into<String>) -> Self {
		Self {
			binder_url: binder_url.into(),
			notebook: notebook.into(),
			notebook_integrity: None,
			page_url: None,
		}
	}

	pub fn with_integrity(mut self, integrity: Option<String>) -> Self {
		self.notebook_integrity = integrity;
		self
	}

	pub fn with_page_url(mut self, page_url: Option<Url>) -> Self {
		self.page_url = page_url;
		self
	}
}
