//! Unguessable share tokens and their redacting wrapper.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
// self
use crate::_prelude::*;

/// Raw entropy per token before encoding; 32 bytes gives 256 bits.
pub const TOKEN_RAW_BYTES: usize = 32;

/// Opaque, URL-safe capability string granting public access to a shared resource.
///
/// The token is the whole credential, so formatters redact it the same way secrets
/// are redacted elsewhere; call [`expose`](Self::expose) to embed it in a URL.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareToken(String);
impl ShareToken {
	/// Draws a fresh token from the thread-local CSPRNG.
	///
	/// 32 random bytes encoded with the URL-safe base64 alphabet (no padding) yield a
	/// 43-character value; enumeration guessing is computationally infeasible.
	pub fn generate() -> Self {
		let mut raw = [0_u8; TOKEN_RAW_BYTES];

		rand::rng().fill_bytes(&mut raw);

		Self(URL_SAFE_NO_PAD.encode(raw))
	}

	/// Wraps an existing token value (e.g. one received from a public URL).
	pub fn from_value(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ShareToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ShareToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ShareToken").field(&"<redacted>").finish()
	}
}
impl Display for ShareToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
