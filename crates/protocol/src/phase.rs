//! Launch progress phases.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// How far a bootstrap attempt has advanced.
///
/// Variants are declared in progress order, so the derived ordering matches
/// the ordering of [`LaunchPhase::value`]. The value doubles as a progress-bar
/// fraction and is what goes over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LaunchPhase {
	#[default]
	WaitingForUser,
	Requesting,
	Created,
	NotebookRunning,
	Ready,
}

impl LaunchPhase {
	/// All phases in progress order.
	pub const ALL: [LaunchPhase; 5] = [
		LaunchPhase::WaitingForUser,
		LaunchPhase::Requesting,
		LaunchPhase::Created,
		LaunchPhase::NotebookRunning,
		LaunchPhase::Ready,
	];

	/// Progress weight in `0.0..=1.0`.
	pub fn value(self) -> f64 {
		match self {
			LaunchPhase::WaitingForUser => 0.0,
			LaunchPhase::Requesting => 0.4,
			LaunchPhase::Created => 0.6,
			LaunchPhase::NotebookRunning => 0.9,
			LaunchPhase::Ready => 1.0,
		}
	}

	/// Maps a progress weight back to its phase.
	pub fn from_value(value: f64) -> Option<Self> {
		Self::ALL.into_iter().find(|phase| (phase.value() - value).abs() < f64::EPSILON)
	}

	/// Short lowercase label used in logs and terminal output.
	pub fn label(self) -> &'static str {
		match self {
			LaunchPhase::WaitingForUser => "waiting",
			LaunchPhase::Requesting => "requesting",
			LaunchPhase::Created => "created",
			LaunchPhase::NotebookRunning => "notebook-running",
			LaunchPhase::Ready => "ready",
		}
	}
}

impl fmt::Display for LaunchPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl Serialize for LaunchPhase {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_f64(self.value())
	}
}

impl<'de> Deserialize<'de> for LaunchPhase {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = f64::deserialize(deserializer)?;
		LaunchPhase::from_value(value).ok_or_else(|| de::Error::custom(format!("unknown launch phase weight {value}")))
	}
}
