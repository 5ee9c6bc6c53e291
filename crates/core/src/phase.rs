//! Launch phase tracking and publication into the UI state container.

use async_trait::async_trait;
use binder_protocol::LaunchPhase;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::SessionHandle;

/// One atomic write into the state container.
///
/// Fields left as `None` are untouched by the update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phase: Option<LaunchPhase>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub disable_ui: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session: Option<SessionHandle>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub document_id: Option<String>,
}

impl StateUpdate {
	pub fn phase(phase: LaunchPhase) -> Self {
		Self {
			phase: Some(phase),
			..Default::default()
		}
	}

	pub fn with_session(mut self, session: SessionHandle) -> Self {
		self.session = Some(session);
		self
	}

	pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
		self.document_id = Some(document_id.into());
		self
	}
}

/// External state container the launch progress is written into.
#[async_trait]
pub trait StateSink: Send + Sync {
	/// Applies `update`; resolves once the write is acknowledged.
	async fn apply(&self, update: StateUpdate) -> Result<()>;

	/// Surfaces a user-facing failure notice.
	async fn alert(&self, message: &str);
}

/// Holds the current phase and publishes each advance.
///
/// Regressions are not rejected here; callers are expected to advance in
/// order and a lower phase only produces a warning.
pub struct PhaseTracker<'a> {
	sink: &'a dyn StateSink,
	current: Mutex<LaunchPhase>,
}

impl<'a> PhaseTracker<'a> {
	pub fn new(sink: &'a dyn StateSink) -> Self {
		Self {
			sink,
			current: Mutex::new(LaunchPhase::WaitingForUser),
		}
	}

	pub fn current(&self) -> LaunchPhase {
		*self.current.lock()
	}

	/// Sets `phase` with no other payload.
	pub async fn advance(&self, phase: LaunchPhase) -> Result<()> {
		self.publish(StateUpdate::phase(phase)).await
	}

	/// Sets the phase carried by `update` together with its payload.
	///
	/// Entering [`LaunchPhase::Requesting`] also clears the blocking-UI flag.
	pub async fn publish(&self, mut update: StateUpdate) -> Result<()> {
		if let Some(phase) = update.phase {
			let previous = self.current();
			if phase < previous {
				warn!(target = "binder.phase", from = %previous, to = %phase, "launch phase moved backwards");
			}
			if phase == LaunchPhase::Requesting && update.disable_ui.is_none() {
				update.disable_ui = Some(false);
			}
		}

		self.sink.apply(update.clone()).await?;

		if let Some(phase) = update.phase {
			*self.current.lock() = phase;
			debug!(target = "binder.phase", phase = %phase, progress = phase.value(), "launch phase advanced");
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fake::RecordingState;

	#[tokio::test]
	async fn requesting_clears_blocking_ui() {
		let state = RecordingState::new();
		let tracker = PhaseTracker::new(&state);
		tracker.advance(LaunchPhase::Requesting).await.unwrap();

		let updates = state.updates();
		assert_eq!(updates.len(), 1);
		assert_eq!(updates[0].disable_ui, Some(false));
		assert_eq!(tracker.current(), LaunchPhase::Requesting);
	}

	#[tokio::test]
	async fn later_phases_leave_ui_flag_alone() {
		let state = RecordingState::new();
		let tracker = PhaseTracker::new(&state);
		tracker.advance(LaunchPhase::Created).await.unwrap();
		assert_eq!(state.updates()[0].disable_ui, None);
	}

	#[tokio::test]
	async fn regression_is_applied_but_not_blocked() {
		let state = RecordingState::new();
		let tracker = PhaseTracker::new(&state);
		tracker.advance(LaunchPhase::NotebookRunning).await.unwrap();
		tracker.advance(LaunchPhase::Created).await.unwrap();
		assert_eq!(tracker.current(), LaunchPhase::Created);
		assert_eq!(state.phases(), vec![LaunchPhase::NotebookRunning, LaunchPhase::Created]);
	}

	#[tokio::test]
	async fn failed_write_keeps_previous_phase() {
		let state = RecordingState::new();
		state.fail_writes(true);
		let tracker = PhaseTracker::new(&state);
		assert!(tracker.advance(LaunchPhase::Requesting).await.is_err());
		assert_eq!(tracker.current(), LaunchPhase::WaitingForUser);
	}
}
