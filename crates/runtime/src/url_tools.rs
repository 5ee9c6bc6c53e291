//! URL helpers for session endpoints.

use url::Url;

use crate::error::{Result, RuntimeError};

/// Appends `/` unless `s` already ends with one.
pub fn trailing_slash(s: &str) -> String {
	if s.ends_with('/') { s.to_string() } else { format!("{s}/") }
}

/// Returns a copy of `url` with each `(key, value)` set as a query parameter.
///
/// Existing parameters with the same key are replaced; unrelated parameters
/// keep their order and the new ones are appended.
pub fn with_query_params(url: &Url, params: &[(&str, &str)]) -> Url {
	let mut out = url.clone();
	let kept: Vec<(String, String)> = url
		.query_pairs()
		.filter(|(key, _)| !params.iter().any(|(k, _)| k == key))
		.map(|(k, v)| (k.into_owned(), v.into_owned()))
		.collect();

	out.set_query(None);
	if kept.is_empty() && params.is_empty() {
		return out;
	}

	{
		let mut pairs = out.query_pairs_mut();
		for (k, v) in &kept {
			pairs.append_pair(k, v);
		}
		for (k, v) in params {
			pairs.append_pair(k, v);
		}
	}
	out
}

/// Websocket base address for an HTTP(S) session base URL.
///
/// The result points at the directory of `base` with `http` swapped for `ws`
/// (and `https` for `wss`); query and fragment are dropped.
pub fn ws_address_from_base(base: &Url) -> Result<Url> {
	let mut ws = base.join("./").map_err(|e| RuntimeError::invalid_url(base.as_str(), e))?;
	let scheme = match ws.scheme() {
		"http" => "ws",
		"https" => "wss",
		"ws" | "wss" => return Ok(strip_query(ws)),
		other => return Err(RuntimeError::invalid_url(base.as_str(), format!("unsupported scheme {other}"))),
	};
	ws.set_scheme(scheme)
		.map_err(|()| RuntimeError::invalid_url(base.as_str(), format!("cannot switch scheme to {scheme}")))?;
	Ok(strip_query(ws))
}

/// Resolves `reference` as an absolute URL, or relative to `base` when given.
pub fn resolve_reference(reference: &str, base: Option<&Url>) -> Result<Url> {
	match Url::parse(reference) {
		Ok(url) => Ok(url),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			let base = base.ok_or_else(|| RuntimeError::invalid_url(reference, "relative reference without a base URL"))?;
			base.join(reference).map_err(|e| RuntimeError::invalid_url(reference, e))
		}
		Err(e) => Err(RuntimeError::invalid_url(reference, e)),
	}
}

/// Parses an absolute `http`/`https` URL.
pub fn parse_http_url(raw: &str) -> Result<Url> {
	let url = Url::parse(raw).map_err(|e| RuntimeError::invalid_url(raw, e))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(RuntimeError::invalid_url(raw, format!("unsupported scheme {other}"))),
	}
}

fn strip_query(mut url: Url) -> Url {
	url.set_query(None);
	url.set_fragment(None);
	url
}
