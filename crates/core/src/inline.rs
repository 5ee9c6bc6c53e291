//! Inline `data:` notebook sources and subresource-integrity checks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

/// Whether `source` is a self-contained `data:` reference.
pub fn is_data_uri(source: &str) -> bool {
	source.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Decodes the payload of a `data:[<mediatype>][;base64],<data>` URI.
pub fn decode_data_uri(source: &str) -> Result<Vec<u8>> {
	if !is_data_uri(source) {
		return Err(invalid("not a data: URI"));
	}
	let (header, payload) = source[5..].split_once(',').ok_or_else(|| invalid("data: URI without a comma"))?;
	let payload = payload.split('#').next().unwrap_or_default();

	let is_base64 = header.trim_end().to_ascii_lowercase().ends_with(";base64");

	let bytes = urlencoding::decode_binary(payload.as_bytes()).into_owned();
	if !is_base64 {
		return Ok(bytes);
	}

	let compact: Vec<u8> = bytes.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
	STANDARD.decode(&compact).map_err(|e| invalid(&format!("bad base64 payload: {e}")))
}

/// Checks `bytes` against an SRI metadata string such as `sha256-<base64>`.
///
/// As in browsers, only the strongest listed algorithm is considered and any
/// one matching digest of that algorithm passes. Metadata naming no supported
/// algorithm passes unchecked.
pub fn verify_integrity(bytes: &[u8], integrity: &str) -> Result<()> {
	let entries: Vec<(Algorithm, &str)> = integrity
		.split_whitespace()
		.filter_map(|token| {
			let (alg, rest) = token.split_once('-')?;
			let digest = rest.split('?').next().unwrap_or(rest);
			Some((Algorithm::parse(alg)?, digest))
		})
		.collect();

	let Some(strongest) = entries.iter().map(|(alg, _)| *alg).max() else {
		return Ok(());
	};

	let actual = STANDARD.encode(strongest.digest(bytes));
	if entries.iter().any(|(alg, expected)| *alg == strongest && *expected == actual) {
		return Ok(());
	}

	let expected = entries
		.iter()
		.filter(|(alg, _)| *alg == strongest)
		.map(|(alg, digest)| format!("{}-{}", alg.name(), digest))
		.collect::<Vec<_>>()
		.join(" ");
	Err(Error::IntegrityMismatch {
		expected,
		actual: format!("{}-{}", strongest.name(), actual),
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Algorithm {
	Sha256,
	Sha384,
	Sha512,
}

impl Algorithm {
	fn parse(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"sha256" => Some(Algorithm::Sha256),
			"sha384" => Some(Algorithm::Sha384),
			"sha512" => Some(Algorithm::Sha512),
			_ => None,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Algorithm::Sha256 => "sha256",
			Algorithm::Sha384 => "sha384",
			Algorithm::Sha512 => "sha512",
		}
	}

	fn digest(self, bytes: &[u8]) -> Vec<u8> {
		match self {
			Algorithm::Sha256 => Sha256::digest(bytes).to_vec(),
			Algorithm::Sha384 => Sha384::digest(bytes).to_vec(),
			Algorithm::Sha512 => Sha512::digest(bytes).to_vec(),
		}
	}
}

fn invalid(reason: &str) -> Error {
	Error::InvalidDocumentSource { reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	const NOTEBOOK: &str = "### A Pluto.jl notebook ###\n";

	fn sri(alg: &str, bytes: &[u8]) -> String {
		let digest = match alg {
			"sha256" => Sha256::digest(bytes).to_vec(),
			"sha384" => Sha384::digest(bytes).to_vec(),
			_ => Sha512::digest(bytes).to_vec(),
		};
		format!("{alg}-{}", STANDARD.encode(digest))
	}

	#[test]
	fn decodes_base64_payload() {
		let uri = format!("data:text/julia;base64,{}", STANDARD.encode(NOTEBOOK));
		assert_eq!(decode_data_uri(&uri).unwrap(), NOTEBOOK.as_bytes());
	}

	#[test]
	fn decodes_percent_encoded_payload() {
		let uri = "data:text/plain,%23%23%23%20A%20Pluto.jl%20notebook%20%23%23%23%0A";
		assert_eq!(decode_data_uri(uri).unwrap(), NOTEBOOK.as_bytes());
	}

	#[test]
	fn base64_needs_its_own_parameter() {
		assert_eq!(decode_data_uri("data:base64,SGk=").unwrap(), b"SGk=");
		assert_eq!(decode_data_uri("data:;BASE64,SGk=").unwrap(), b"Hi");
	}

	#[test]
	fn detects_scheme_case_insensitively() {
		assert!(is_data_uri("DATA:,x"));
		assert!(!is_data_uri("notebooks/data:x.jl"));
		assert!(!is_data_uri("dat"));
	}

	#[test]
	fn rejects_malformed_uris() {
		assert!(matches!(decode_data_uri("data:text/plain"), Err(Error::InvalidDocumentSource { .. })));
		assert!(decode_data_uri("data:;base64,@@@").is_err());
	}

	#[test]
	fn integrity_accepts_matching_digest() {
		let bytes = NOTEBOOK.as_bytes();
		verify_integrity(bytes, &sri("sha256", bytes)).unwrap();
		verify_integrity(bytes, &format!("{} {}", sri("sha256", b"other"), sri("sha384", bytes))).unwrap();
	}

	#[test]
	fn integrity_uses_strongest_algorithm_only() {
		let bytes = NOTEBOOK.as_bytes();
		let metadata = format!("{} {}", sri("sha256", bytes), sri("sha512", b"tampered"));
		assert!(matches!(verify_integrity(bytes, &metadata), Err(Error::IntegrityMismatch { .. })));
	}

	#[test]
	fn integrity_ignores_unknown_algorithms() {
		verify_integrity(b"anything", "md5-abcdef").unwrap();
	}
}
