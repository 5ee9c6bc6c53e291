use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read config {path}: {source}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error(transparent)]
	Launch(#[from] binder::LaunchFailure),

	#[error(transparent)]
	Binder(#[from] binder::Error),

	#[error(transparent)]
	Runtime(#[from] binder_runtime::RuntimeError),
}

pub type Result<T> = std::result::Result<T, CliError>;
