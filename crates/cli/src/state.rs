//! Terminal renditions of the launch collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use binder::{LaunchPhase, Navigator, Result, SessionHandle, StateSink, StateUpdate};
use colored::Colorize;
use parking_lot::Mutex;
use url::Url;

/// Prints each phase change as a progress line on stderr.
#[derive(Debug, Default)]
pub struct ConsoleState {
	last: Mutex<Option<LaunchPhase>>,
}

impl ConsoleState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn last_phase(&self) -> Option<LaunchPhase> {
		*self.last.lock()
	}
}

/// `[ 60%] created`
pub fn progress_line(phase: LaunchPhase) -> String {
	format!("[{:>3.0}%] {}", phase.value() * 100.0, phase.label())
}

#[async_trait]
impl StateSink for ConsoleState {
	async fn apply(&self, update: StateUpdate) -> Result<()> {
		let Some(phase) = update.phase else {
			return Ok(());
		};
		*self.last.lock() = Some(phase);

		let line = progress_line(phase);
		let line = if phase == LaunchPhase::Ready { line.green().bold() } else { line.cyan() };
		eprintln!("{line}");

		if let Some(session) = &update.session {
			eprintln!("        {}", SessionHandle::redact(session.session_url()).dimmed());
		}
		Ok(())
	}

	async fn alert(&self, message: &str) {
		eprintln!("{}", message.red().bold());
	}
}

/// Prints the editor address the launch would have sent the page to.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNavigator {
	visited: Arc<Mutex<Option<Url>>>,
}

impl ConsoleNavigator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn target(&self) -> Option<Url> {
		self.visited.lock().clone()
	}
}

#[async_trait]
impl Navigator for ConsoleNavigator {
	async fn navigate(&self, url: &Url) {
		eprintln!("{} {}", "open in browser:".yellow().bold(), url);
		*self.visited.lock() = Some(url.clone());
	}
}
