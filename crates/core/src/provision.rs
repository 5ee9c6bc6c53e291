//! Provisioning event client.
//!
//! Watches the build service's event stream until it announces a terminal
//! phase and turns that announcement into a [`SessionHandle`] or an error.
//!
//! # Protocol
//!
//! Every event's `data` is a [`ProvisionEvent`] JSON object. Only a change of
//! phase is acted on; a repeated phase is dropped, message included, unless
//! repeated messages are configured to be logged.
//!
//! | phase    | action                                      |
//! |----------|---------------------------------------------|
//! | `failed` | close, reject with the raw payload           |
//! | `ready`  | close, resolve with `url` + `pluto/`, `token`|
//! | other    | log only                                     |

use std::time::Duration;

use async_trait::async_trait;
use binder_protocol::{ProvisionEvent, ProvisionPhase};
use binder_runtime::{EventSource, RuntimeError, ServerEvent};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::session::SessionHandle;

/// Only the build endpoint exposes the progress stream; `v2` launch links
/// are rewritten to it.
pub fn build_stream_url(binder_url: &str) -> String {
	binder_url.replace("mybinder.org/v2/", "mybinder.org/build/")
}

/// Pull-based source of server events that can be closed early.
#[async_trait]
pub trait EventChannel: Send {
	async fn next_event(&mut self) -> Option<std::result::Result<ServerEvent, RuntimeError>>;

	fn close(&mut self);
}

#[async_trait]
impl EventChannel for EventSource {
	async fn next_event(&mut self) -> Option<std::result::Result<ServerEvent, RuntimeError>> {
		EventSource::next_event(self).await
	}

	fn close(&mut self) {
		EventSource::close(self)
	}
}

/// Requests sessions from a build service.
#[derive(Debug, Clone)]
pub struct ProvisionClient {
	http: reqwest::Client,
	log_repeated_messages: bool,
}

impl ProvisionClient {
	pub fn new(http: reqwest::Client) -> Self {
		Self {
			http,
			log_repeated_messages: false,
		}
	}

	/// Also logs `message` fields of events whose phase did not change.
	pub fn with_log_repeated_messages(mut self, enabled: bool) -> Self {
		self.log_repeated_messages = enabled;
		self
	}

	/// Opens the event stream at `build_url` and waits for a terminal phase.
	///
	/// No timeout is applied here; a stalled build service keeps this pending.
	pub async fn request_session(&self, build_url: &str) -> Result<SessionHandle> {
		info!(target = "binder.provision", url = %build_url, "starting binder connection");

		let mut source = EventSource::open(&self.http, build_url).await.map_err(|source| match source {
			RuntimeError::InvalidUrl { .. } => Error::InvalidSourceUrl {
				url: build_url.to_string(),
				source,
			},
			other => {
				error!(target = "binder.provision", url = %build_url, error = %other, "lost connection to build service");
				Error::ConnectionLost {
					url: build_url.to_string(),
					source: other,
				}
			}
		})?;

		self.resolve(build_url, &mut source).await
	}

	/// [`request_session`](Self::request_session) bounded by `limit`, when given.
	pub async fn request_session_within(&self, build_url: &str, limit: Option<Duration>) -> Result<SessionHandle> {
		match limit {
			Some(limit) => tokio::time::timeout(limit, self.request_session(build_url))
				.await
				.map_err(|_| Error::ProvisioningTimeout(limit))?,
			None => self.request_session(build_url).await,
		}
	}

	/// Message of `payload` worth logging; messages of a repeated phase are
	/// only logged when configured.
	fn loggable_message<'p>(&self, repeated: bool, payload: &'p ProvisionEvent) -> Option<&'p str> {
		if repeated && !self.log_repeated_messages {
			return None;
		}
		payload.message.as_deref()
	}

	/// Consumes `channel` until a terminal phase, closing it before returning.
	pub async fn resolve<C>(&self, url: &str, channel: &mut C) -> Result<SessionHandle>
	where
		C: EventChannel + ?Sized,
	{
		let mut last_phase: Option<ProvisionPhase> = None;

		while let Some(item) = channel.next_event().await {
			let event = match item {
				Ok(event) => event,
				Err(source) => {
					error!(target = "binder.provision", %url, error = %source, "lost connection to build service");
					channel.close();
					return Err(Error::ConnectionLost { url: url.to_string(), source });
				}
			};

			let payload = match ProvisionEvent::from_data(&event.data) {
				Ok(payload) => payload,
				Err(err) => {
					debug!(target = "binder.provision", error = %err, data = %event.data, "skipping unparseable event");
					continue;
				}
			};

			let Some(phase) = payload.kind() else {
				debug!(target = "binder.provision", data = %event.data, "skipping event without phase");
				continue;
			};

			let repeated = last_phase.as_ref() == Some(&phase);
			if !repeated {
				info!(target = "binder.provision", phase = %phase, "binder subphase");
			}
			if let Some(message) = self.loggable_message(repeated, &payload) {
				info!(target = "binder.provision", message = %message.trim_end(), "binder message");
			}
			if repeated {
				continue;
			}
			last_phase = Some(phase.clone());

			match phase {
				ProvisionPhase::Failed => {
					error!(target = "binder.provision", %url, payload = %event.data, "build failed");
					channel.close();
					return Err(Error::ProvisioningFailed { payload: event.data });
				}
				ProvisionPhase::Ready => {
					channel.close();
					return session_from_ready(&payload, &event.data);
				}
				ProvisionPhase::Other(_) => {}
			}
		}

		channel.close();
		Err(Error::ConnectionLost {
			url: url.to_string(),
			source: RuntimeError::StreamEnded { url: url.to_string() },
		})
	}
}


fn session_from_ready(payload: &ProvisionEvent, raw: &str) -> Result<SessionHandle> {
	let (Some(url), Some(token)) = (payload.url.as_deref(), payload.token.as_deref()) else {
		return Err(Error::ProvisioningFailed {
			payload: format!("ready event without url and token: {raw}"),
		});
	};
	let session = SessionHandle::from_server_url(url, token)?;
	info!(target = "binder.provision", url = %session.session_url(), "binder session ready");
	Ok(session)
}

#[cfg(test)]
mod tests {
	use std::collections::VecDeque;

	use serde_json::json;

	use super::*;

	/// Channel replaying a fixed script and recording how far it was read.
	struct ScriptedChannel {
		script: VecDeque<std::result::Result<ServerEvent, RuntimeError>>,
		consumed: usize,
		closed: bool,
	}

	impl ScriptedChannel {
		fn new(payloads: Vec<serde_json::Value>) -> Self {
			Self {
				script: payloads.into_iter().map(|p| Ok(event(&p.to_string()))).collect(),
				consumed: 0,
				closed: false,
			}
		}

		fn push_error(&mut self) {
			self.script.push_back(Err(RuntimeError::StreamEnded { url: "http://build".into() }));
		}
	}

	fn event(data: &str) -> ServerEvent {
		ServerEvent {
			event: "message".into(),
			data: data.into(),
			id: None,
		}
	}

	#[async_trait]
	impl EventChannel for ScriptedChannel {
		async fn next_event(&mut self) -> Option<std::result::Result<ServerEvent, RuntimeError>> {
			if self.closed {
				return None;
			}
			let item = self.script.pop_front()?;
			self.consumed += 1;
			Some(item)
		}

		fn close(&mut self) {
			self.closed = true;
		}
	}

	fn client() -> ProvisionClient {
		ProvisionClient::new(reqwest::Client::new())
	}

	#[test]
	fn v2_links_are_rewritten_to_build() {
		assert_eq!(
			build_stream_url("https://mybinder.org/v2/gh/fonsp/pluto-on-binder/HEAD"),
			"https://mybinder.org/build/gh/fonsp/pluto-on-binder/HEAD"
		);
		assert_eq!(build_stream_url("https://hub.example/build/x"), "https://hub.example/build/x");
	}

	#[tokio::test]
	async fn duplicate_phase_is_ignored_and_ready_resolves() {
		let mut channel = ScriptedChannel::new(vec![
			json!({"phase": "building"}),
			json!({"phase": "building"}),
			json!({"phase": "ready", "url": "https://x/", "token": "T"}),
		]);

		let session = client().resolve("http://build", &mut channel).await.unwrap();
		assert_eq!(session.session_url().as_str(), "https://x/pluto/");
		assert_eq!(session.token(), "T");
		assert!(channel.closed);
		assert_eq!(channel.consumed, 3);
	}

	#[tokio::test]
	async fn failed_rejects_and_stops_reading() {
		let mut channel = ScriptedChannel::new(vec![
			json!({"phase": "failed", "message": "boom"}),
			json!({"phase": "ready", "url": "https://x/", "token": "T"}),
		]);

		let err = client().resolve("http://build", &mut channel).await.unwrap_err();
		match err {
			Error::ProvisioningFailed { payload } => assert!(payload.contains("boom")),
			other => panic!("unexpected error: {other}"),
		}
		assert!(channel.closed);
		assert_eq!(channel.consumed, 1);
		assert_eq!(channel.script.len(), 1, "queued ready event must stay unread");
	}

	#[tokio::test]
	async fn transport_error_is_connection_lost() {
		let mut channel = ScriptedChannel::new(vec![json!({"phase": "launching"})]);
		channel.push_error();

		let err = client().resolve("http://build", &mut channel).await.unwrap_err();
		assert!(matches!(err, Error::ConnectionLost { .. }));
		assert!(channel.closed);
	}

	#[tokio::test]
	async fn stream_end_without_terminal_phase_is_connection_lost() {
		let mut channel = ScriptedChannel::new(vec![json!({"phase": "waiting"}), json!({"phase": "building"})]);
		let err = client().resolve("http://build", &mut channel).await.unwrap_err();
		assert!(matches!(err, Error::ConnectionLost { .. }));
	}

	#[tokio::test]
	async fn garbage_and_phaseless_events_are_skipped() {
		let mut channel = ScriptedChannel::new(vec![json!({"message": "no phase here"})]);
		channel.script.push_front(Ok(event("not json at all")));
		channel
			.script
			.push_back(Ok(event(&json!({"phase": "READY", "url": "https://x", "token": "T"}).to_string())));

		let session = client().resolve("http://build", &mut channel).await.unwrap();
		assert_eq!(session.session_url().as_str(), "https://x/pluto/");
	}

	#[tokio::test]
	async fn ready_without_token_is_a_failure() {
		let mut channel = ScriptedChannel::new(vec![json!({"phase": "ready", "url": "https://x/"})]);
		let err = client().resolve("http://build", &mut channel).await.unwrap_err();
		assert!(matches!(err, Error::ProvisioningFailed { .. }));
	}

	#[test]
	fn repeated_phase_messages_are_logged_only_when_enabled() {
		let payload = ProvisionEvent {
			phase: Some("building".into()),
			message: Some("step 2\n".into()),
			..Default::default()
		};
		assert_eq!(client().loggable_message(false, &payload), Some("step 2\n"));
		assert_eq!(client().loggable_message(true, &payload), None);
		assert_eq!(
			client().with_log_repeated_messages(true).loggable_message(true, &payload),
			Some("step 2\n")
		);
	}

	#[tokio::test]
	async fn logged_repeats_do_not_advance_the_phase() {
		let client = client().with_log_repeated_messages(true);
		let mut channel = ScriptedChannel::new(vec![
			json!({"phase": "building", "message": "step 1"}),
			json!({"phase": "building", "message": "step 2"}),
			json!({"phase": "ready", "url": "https://x/", "token": "T"}),
		]);

		let session = client.resolve("http://build", &mut channel).await.unwrap();
		assert_eq!(session.token(), "T");
		assert_eq!(channel.consumed, 3);

		let mut channel = ScriptedChannel::new(vec![
			json!({"phase": "failed", "message": "first"}),
			json!({"phase": "failed", "message": "second"}),
		]);
		let err = client.resolve("http://build", &mut channel).await.unwrap_err();
		match err {
			Error::ProvisioningFailed { payload } => assert!(payload.contains("first")),
			other => panic!("unexpected error: {other}"),
		}
		assert_eq!(channel.consumed, 1);
	}

	#[tokio::test]
	async fn malformed_build_url_is_invalid_source() {
		let err = client().request_session("not a url").await.unwrap_err();
		assert!(matches!(err, Error::InvalidSourceUrl { .. }));
	}
}
