//! Transport-level errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error("invalid URL {url:?}: {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error("HTTP transport error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("unexpected status {status} from {url}")]
	Status { url: String, status: u16 },

	#[error("unexpected content type {content_type:?} from {url}")]
	ContentType { url: String, content_type: String },

	#[error("event stream from {url} ended")]
	StreamEnded { url: String },

	#[error("websocket error: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl RuntimeError {
	pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
		RuntimeError::InvalidUrl {
			url: url.into(),
			reason: reason.to_string(),
		}
	}
}
