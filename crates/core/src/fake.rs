//! In-memory collaborators for exercising a launch without a UI or browser.
//!
//! # Example
//!
//! ```ignore
//! let state = RecordingState::new();
//! let navigator = RecordingNavigator::new();
//! let connector = ScriptedConnector::new(ConnectBehavior::Accept);
//!
//! let launcher = Launcher::new(BootstrapConfig::default(), Arc::new(state.clone()), Arc::new(navigator.clone()))?;
//! let launch = launcher.bootstrap(&params, &connector).await?;
//! assert_eq!(state.last_phase(), Some(LaunchPhase::Ready));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use binder_protocol::LaunchPhase;
use parking_lot::Mutex;
use url::Url;

use crate::error::{Error, Result};
use crate::handshake::{LiveConnector, Navigator};
use crate::phase::{StateSink, StateUpdate};

/// State container that records every update and alert.
#[derive(Clone, Default)]
pub struct RecordingState {
	updates: Arc<Mutex<Vec<StateUpdate>>>,
	alerts: Arc<Mutex<Vec<String>>>,
	fail_writes: Arc<AtomicBool>,
	rejected_phase: Arc<Mutex<Option<LaunchPhase>>>,
}

impl RecordingState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes subsequent writes fail with [`Error::State`].
	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	/// Makes writes carrying `phase` fail with [`Error::State`].
	pub fn reject_phase(&self, phase: Option<LaunchPhase>) {
		*self.rejected_phase.lock() = phase;
	}

	pub fn updates(&self) -> Vec<StateUpdate> {
		self.updates.lock().clone()
	}

	/// Phases in the order they were written.
	pub fn phases(&self) -> Vec<LaunchPhase> {
		self.updates.lock().iter().filter_map(|u| u.phase).collect()
	}

	pub fn last_phase(&self) -> Option<LaunchPhase> {
		self.phases().last().copied()
	}

	pub fn alerts(&self) -> Vec<String> {
		self.alerts.lock().clone()
	}
}

#[async_trait]
impl StateSink for RecordingState {
	async fn apply(&self, update: StateUpdate) -> Result<()> {
		let rejected = *self.rejected_phase.lock();
		if self.fail_writes.load(Ordering::SeqCst) || (update.phase.is_some() && update.phase == rejected) {
			return Err(Error::State("state container rejected the write".into()));
		}
		self.updates.lock().push(update);
		Ok(())
	}

	async fn alert(&self, message: &str) {
		self.alerts.lock().push(message.to_string());
	}
}

/// Navigator that records targets instead of leaving the page.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
	visited: Arc<Mutex<Vec<Url>>>,
}

impl RecordingNavigator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn visited(&self) -> Vec<Url> {
		self.visited.lock().clone()
	}
}

#[async_trait]
impl Navigator for RecordingNavigator {
	async fn navigate(&self, url: &Url) {
		self.visited.lock().push(url.clone());
	}
}

/// How a [`ScriptedConnector`] answers a connection attempt.
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
	Accept,
	AcceptAfter(Duration),
	Reject(String),
	Hang,
}

/// Connector whose outcome is fixed up front.
///
/// A successful connection yields the address it was asked to connect to.
#[derive(Clone)]
pub struct ScriptedConnector {
	behavior: ConnectBehavior,
	attempts: Arc<AtomicUsize>,
	addresses: Arc<Mutex<Vec<Url>>>,
}

impl ScriptedConnector {
	pub fn new(behavior: ConnectBehavior) -> Self {
		Self {
			behavior,
			attempts: Arc::new(AtomicUsize::new(0)),
			addresses: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn addresses(&self) -> Vec<Url> {
		self.addresses.lock().clone()
	}
}

#[async_trait]
impl LiveConnector for ScriptedConnector {
	type Connection = Url;

	async fn connect(&self, address: Url) -> Result<Url> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		self.addresses.lock().push(address.clone());

		match &self.behavior {
			ConnectBehavior::Accept => Ok(address),
			ConnectBehavior::AcceptAfter(delay) => {
				tokio::time::sleep(*delay).await;
				Ok(address)
			}
			ConnectBehavior::Reject(reason) => Err(Error::Connect(reason.clone())),
			ConnectBehavior::Hang => std::future::pending().await,
		}
	}
}
