//! Config file loading and flag overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use binder::{BootstrapConfig, OpenFallbackPolicy};
use tracing::debug;

use crate::cli::LaunchArgs;
use crate::error::{CliError, Result};

/// `<config dir>/binder/config.json`, e.g. `~/.config/binder/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("binder").join("config.json"))
}

/// Reads `explicit`, or the default location when it exists.
///
/// A missing default file yields [`BootstrapConfig::default`]; a missing
/// explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<BootstrapConfig> {
	let path = match explicit {
		Some(path) => path.to_path_buf(),
		None => match default_config_path() {
			Some(path) if path.is_file() => path,
			_ => return Ok(BootstrapConfig::default()),
		},
	};

	debug!(target = "binder.cli", path = %path.display(), "loading config");
	let raw = std::fs::read_to_string(&path).map_err(|source| CliError::ConfigRead { path: path.clone(), source })?;
	serde_json::from_str(&raw).map_err(|source| CliError::ConfigParse { path, source })
}

/// Layers `launch` flags over a loaded config.
pub fn apply_launch_flags(mut config: BootstrapConfig, args: &LaunchArgs) -> BootstrapConfig {
	if let Some(ms) = args.timeout_ms {
		config = config.with_handshake_timeout(Duration::from_millis(ms));
	}
	if let Some(ms) = args.provision_timeout_ms {
		config = config.with_provision_timeout(Some(Duration::from_millis(ms)));
	}
	if args.no_telemetry {
		config = config.with_telemetry_url(None);
	}
	if args.accept_last_open {
		config = config.with_open_fallback(OpenFallbackPolicy::AcceptLast);
	}
	config
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_file_is_read() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{"handshakeTimeoutMs": 5000, "logRepeatedMessages": true}"#)?;

		let config = load_config(Some(&path))?;
		assert_eq!(config.handshake_timeout(), Duration::from_secs(5));
		assert!(config.log_repeated_messages);
		assert_eq!(config.open_fallback, OpenFallbackPolicy::Strict);
		Ok(())
	}

	#[test]
	fn missing_explicit_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
		assert!(matches!(err, CliError::ConfigRead { .. }));
	}

	#[test]
	fn malformed_file_reports_its_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, "{ nope").unwrap();

		let err = load_config(Some(&path)).unwrap_err();
		assert!(err.to_string().contains("config.json"));
	}

	#[test]
	fn flags_override_file_values() {
		let file = BootstrapConfig::default()
			.with_handshake_timeout(Duration::from_secs(5))
			.with_provision_timeout(Some(Duration::from_secs(60)));
		let args = LaunchArgs {
			timeout_ms: Some(1500),
			no_telemetry: true,
			accept_last_open: true,
			..Default::default()
		};

		let config = apply_launch_flags(file, &args);
		assert_eq!(config.handshake_timeout(), Duration::from_millis(1500));
		assert_eq!(config.provision_timeout(), Some(Duration::from_secs(60)));
		assert_eq!(config.telemetry_url, None);
		assert_eq!(config.open_fallback, OpenFallbackPolicy::AcceptLast);
	}
}
