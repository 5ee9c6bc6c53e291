//! Fire-and-forget usage counter.

use binder_runtime::url_tools::with_query_params;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

/// Hits `beacon` with `p=/<page>` on a background task.
///
/// Nothing about the request is awaited or reported; the handle is only
/// returned so callers that care can wait for it.
pub fn count_stat(http: &reqwest::Client, beacon: &str, page: &str) -> Option<JoinHandle<()>> {
	let base = match Url::parse(beacon) {
		Ok(url) => url,
		Err(err) => {
			debug!(target = "binder.telemetry", %beacon, error = %err, "ignoring invalid beacon URL");
			return None;
		}
	};
	let url = with_query_params(&base, &[("p", &format!("/{page}"))]);
	let http = http.clone();

	Some(tokio::spawn(async move {
		if let Err(err) = http.get(url).header(reqwest::header::CACHE_CONTROL, "no-cache").send().await {
			debug!(target = "binder.telemetry", error = %err, "beacon failed");
		}
	}))
}
