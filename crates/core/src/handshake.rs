//! Timeout-guarded upgrade to a live session connection.

use std::time::Duration;

use async_trait::async_trait;
use binder_runtime::WebSocketChannel;
use tracing::{info, warn};
use url::Url;

use crate::error::Result;
use crate::session::SessionHandle;

/// Default bound on the live connection attempt.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

/// Establishes the persistent connection to a session.
#[async_trait]
pub trait LiveConnector: Send + Sync {
	type Connection: Send;

	async fn connect(&self, address: Url) -> Result<Self::Connection>;
}

/// Full top-level page navigation.
#[async_trait]
pub trait Navigator: Send + Sync {
	async fn navigate(&self, url: &Url);
}

/// Connects over a plain websocket channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl LiveConnector for WebSocketConnector {
	type Connection = WebSocketChannel;

	async fn connect(&self, address: Url) -> Result<WebSocketChannel> {
		Ok(WebSocketChannel::connect(&address).await?)
	}
}

/// How the handshake converged.
#[derive(Debug)]
pub enum HandshakeOutcome<C> {
	Live(C),
	/// The page was sent to the session's editor instead.
	Redirected(Url),
}

impl<C> HandshakeOutcome<C> {
	pub fn is_live(&self) -> bool {
		matches!(self, HandshakeOutcome::Live(_))
	}

	pub fn redirect_url(&self) -> Option<&Url> {
		match self {
			HandshakeOutcome::Redirected(url) => Some(url),
			HandshakeOutcome::Live(_) => None,
		}
	}
}

/// Races the live connection against a fixed bound.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeSupervisor {
	timeout: Duration,
}

impl Default for HandshakeSupervisor {
	fn default() -> Self {
		Self::new(DEFAULT_HANDSHAKE_TIMEOUT)
	}
}

impl HandshakeSupervisor {
	pub fn new(timeout: Duration) -> Self {
		Self { timeout }
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Connects to the session's `channels` endpoint or, failing that within
	/// the bound, navigates to the editor for `document_id`.
	///
	/// Never fails: every error path ends in exactly one navigation.
	pub async fn upgrade<C>(
		&self,
		session: &SessionHandle,
		document_id: &str,
		connector: &C,
		navigator: &dyn Navigator,
	) -> HandshakeOutcome<C::Connection>
	where
		C: LiveConnector + ?Sized,
	{
		let failure = match session.channels_url() {
			Ok(address) => {
				info!(target = "binder.handshake", url = %SessionHandle::redact(&address), "connecting websocket");
				match tokio::time::timeout(self.timeout, connector.connect(address)).await {
					Ok(Ok(connection)) => {
						info!(target = "binder.handshake", "live connection established");
						return HandshakeOutcome::Live(connection);
					}
					Ok(Err(err)) => err.to_string(),
					Err(_) => format!("no connection within {:?}", self.timeout),
				}
			}
			Err(err) => err.to_string(),
		};

		let edit_url = session.edit_url(document_id);
		warn!(
			target = "binder.handshake",
			reason = %failure,
			url = %SessionHandle::redact(&edit_url),
			"failed to establish connection; navigating to the edit URL directly"
		);
		navigator.navigate(&edit_url).await;
		HandshakeOutcome::Redirected(edit_url)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fake::{ConnectBehavior, RecordingNavigator, ScriptedConnector};

	fn session() -> SessionHandle {
		SessionHandle::from_server_url("https://hub.example/user/abc/", "T").unwrap()
	}

	#[tokio::test(start_paused = true)]
	async fn fast_connection_skips_navigation() {
		let connector = ScriptedConnector::new(ConnectBehavior::AcceptAfter(Duration::from_secs(3)));
		let navigator = RecordingNavigator::new();

		let outcome = HandshakeSupervisor::default().upgrade(&session(), "nb-1", &connector, &navigator).await;

		assert!(outcome.is_live());
		assert!(navigator.visited().is_empty());
		assert_eq!(
			connector.addresses()[0].as_str(),
			"wss://hub.example/user/abc/pluto/channels?token=T"
		);
	}

	#[tokio::test(start_paused = true)]
	async fn hung_connection_navigates_once_after_the_bound() {
		let connector = ScriptedConnector::new(ConnectBehavior::Hang);
		let navigator = RecordingNavigator::new();
		let started = tokio::time::Instant::now();

		let outcome = HandshakeSupervisor::default().upgrade(&session(), "nb-1", &connector, &navigator).await;

		let elapsed = started.elapsed();
		assert!(elapsed >= DEFAULT_HANDSHAKE_TIMEOUT && elapsed < DEFAULT_HANDSHAKE_TIMEOUT + Duration::from_secs(1));
		let visited = navigator.visited();
		assert_eq!(visited.len(), 1);
		assert_eq!(visited[0].as_str(), "https://hub.example/user/abc/pluto/edit?id=nb-1&token=T");
		assert_eq!(outcome.redirect_url(), Some(&visited[0]));
	}

	#[tokio::test(start_paused = true)]
	async fn slow_connection_past_the_bound_is_abandoned() {
		let connector = ScriptedConnector::new(ConnectBehavior::AcceptAfter(Duration::from_secs(21)));
		let navigator = RecordingNavigator::new();

		let outcome = HandshakeSupervisor::default().upgrade(&session(), "nb-1", &connector, &navigator).await;

		assert!(!outcome.is_live());
		assert_eq!(navigator.visited().len(), 1);
	}

	#[tokio::test]
	async fn rejected_connection_navigates_immediately() {
		let connector = ScriptedConnector::new(ConnectBehavior::Reject("handshake refused".into()));
		let navigator = RecordingNavigator::new();

		let outcome = HandshakeSupervisor::new(Duration::from_secs(60))
			.upgrade(&session(), "nb-2", &connector, &navigator)
			.await;

		assert!(outcome.redirect_url().unwrap().as_str().contains("id=nb-2"));
		assert_eq!(navigator.visited().len(), 1);
		assert_eq!(connector.attempts(), 1);
	}
}
