//! Server-sent event stream client.
//!
//! [`EventStreamDecoder`] turns raw `text/event-stream` bytes into
//! [`ServerEvent`]s following the HTML event-stream interpretation rules:
//! `data:` lines accumulate, a blank line dispatches, `:` lines are comments.
//!
//! [`EventSource`] opens the stream over HTTP and yields events one at a time.
//! Unlike a browser `EventSource` it never reconnects; the first transport
//! failure or end of stream is reported and the source is closed.

use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Result, RuntimeError};
use crate::url_tools::parse_http_url;

/// Dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
	/// Event type, `"message"` unless an `event:` field overrode it.
	pub event: String,
	/// `data:` lines joined with `\n`.
	pub data: String,
	/// Last event id seen on the stream, if any.
	pub id: Option<String>,
}

/// Incremental `text/event-stream` parser.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
	buffer: Vec<u8>,
	data: Vec<String>,
	event_type: Option<String>,
	last_id: Option<String>,
	retry_ms: Option<u64>,
	seen_bom: bool,
	/// Last line ended in `\r`; a leading `\n` in the next chunk belongs to it.
	pending_cr: bool,
}

impl EventStreamDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds a chunk and returns every event completed by it.
	pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
		self.buffer.extend_from_slice(chunk);
		let mut events = Vec::new();

		loop {
			if self.pending_cr {
				match self.buffer.first() {
					Some(b'\n') => {
						self.buffer.drain(..1);
						self.pending_cr = false;
					}
					Some(_) => self.pending_cr = false,
					None => break,
				}
			}

			let Some(pos) = self.buffer.iter().position(|b| matches!(b, b'\n' | b'\r')) else {
				break;
			};
			let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
			self.pending_cr = line.pop() == Some(b'\r');
			if !self.seen_bom {
				self.seen_bom = true;
				if line.starts_with(&[0xEF, 0xBB, 0xBF]) {
					line.drain(..3);
				}
			}
			if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
				events.push(event);
			}
		}

		events
	}

	/// Reconnection delay requested by the server, if any.
	pub fn retry_ms(&self) -> Option<u64> {
		self.retry_ms
	}

	fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
		if line.is_empty() {
			return self.dispatch();
		}
		if line.starts_with(':') {
			return None;
		}

		let (field, value) = match line.split_once(':') {
			Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
			None => (line, ""),
		};

		match field {
			"data" => self.data.push(value.to_string()),
			"event" => self.event_type = Some(value.to_string()),
			"id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
			"retry" => {
				if let Ok(ms) = value.parse() {
					self.retry_ms = Some(ms);
				}
			}
			_ => trace!(target = "binder.runtime", field, "ignoring event-stream field"),
		}
		None
	}

	fn dispatch(&mut self) -> Option<ServerEvent> {
		let event_type = self.event_type.take();
		if self.data.is_empty() {
			return None;
		}
		let data = std::mem::take(&mut self.data).join("\n");
		Some(ServerEvent {
			event: event_type.filter(|t| !t.is_empty()).unwrap_or_else(|| "message".to_string()),
			data,
			id: self.last_id.clone(),
		})
	}
}

/// One-directional server-push channel.
pub struct EventSource {
	url: Url,
	body: Option<BoxStream<'static, Result<Vec<u8>>>>,
	decoder: EventStreamDecoder,
	pending: VecDeque<ServerEvent>,
}

impl EventSource {
	/// Opens an event stream at `url`.
	///
	/// Malformed or non-HTTP URLs fail with [`RuntimeError::InvalidUrl`]
	/// before any request is sent. A failed request, a non-success status, or
	/// a response that is not `text/event-stream` fail with the matching
	/// transport error.
	pub async fn open(client: &reqwest::Client, url: &str) -> Result<Self> {
		let url = parse_http_url(url)?;
		debug!(target = "binder.runtime", %url, "opening event stream");

		let response = client
			.get(url.clone())
			.header(ACCEPT, "text/event-stream")
			.header(CACHE_CONTROL, "no-cache")
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(RuntimeError::Status {
				url: url.to_string(),
				status: status.as_u16(),
			});
		}

		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default()
			.to_string();
		if !content_type.starts_with("text/event-stream") {
			return Err(RuntimeError::ContentType {
				url: url.to_string(),
				content_type,
			});
		}

		let body = response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()).map_err(RuntimeError::from));
		Ok(Self::from_byte_stream(url, body))
	}

	/// Wraps an already-open byte stream.
	pub fn from_byte_stream<S>(url: Url, body: S) -> Self
	where
		S: Stream<Item = Result<Vec<u8>>> + Send + 'static,
	{
		Self {
			url,
			body: Some(body.boxed()),
			decoder: EventStreamDecoder::new(),
			pending: VecDeque::new(),
		}
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn is_closed(&self) -> bool {
		self.body.is_none() && self.pending.is_empty()
	}

	/// Waits for the next dispatched event.
	///
	/// Returns `Some(Err(_))` once when the transport fails or the stream ends,
	/// then `None` forever after.
	pub async fn next_event(&mut self) -> Option<Result<ServerEvent>> {
		loop {
			if let Some(event) = self.pending.pop_front() {
				return Some(Ok(event));
			}

			let body = self.body.as_mut()?;
			match body.next().await {
				Some(Ok(chunk)) => {
					self.pending.extend(self.decoder.feed(&chunk));
				}
				Some(Err(err)) => {
					self.body = None;
					return Some(Err(err));
				}
				None => {
					self.body = None;
					return Some(Err(RuntimeError::StreamEnded { url: self.url.to_string() }));
				}
			}
		}
	}

	/// Closes the stream, discarding anything still buffered.
	pub fn close(&mut self) {
		if self.body.take().is_some() {
			debug!(target = "binder.runtime", url = %self.url, "event stream closed");
		}
		self.pending.clear();
	}

	/// Adapts the source into a [`Stream`] of events.
	pub fn into_stream(self) -> impl Stream<Item = Result<ServerEvent>> + Send + 'static {
		stream::unfold(self, |mut source| async move { source.next_event().await.map(|item| (item, source)) })
	}
}
