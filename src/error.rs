//! Crate-level error types shared across the registry, limiter, ledger, and gateway.

// self
use crate::{_prelude::*, domain::OperationClass, gateway::OperationError, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// [`Error::NotFound`] deliberately carries no detail: missing, revoked, and expired
/// share tokens all collapse to the same value so an unauthenticated prober cannot
/// distinguish them.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Caller is not the recorded owner of the resource.
	#[error("Caller does not own the shared resource.")]
	NotOwner,
	/// Share token is unresolved; used uniformly for missing, revoked, and expired links.
	#[error("Share link not found.")]
	NotFound,
	/// Quota exceeded for an operation class; carries the wait until the window rolls over.
	#[error("Rate limit exceeded for `{class}`; retry after {retry_after}.")]
	RateLimited {
		/// Operation class that denied the invocation.
		class: OperationClass,
		/// Remaining duration of the current window.
		retry_after: Duration,
	},
	/// The gated external operation itself errored; always still ledgered.
	#[error(transparent)]
	Operation(#[from] OperationError),
	/// The audit write failed and the class policy blocks on ledger failures.
	#[error("Usage ledger is unavailable.")]
	LedgerUnavailable(#[source] StoreError),
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Converted error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn not_found_carries_no_detail() {
		assert_eq!(Error::NotFound.to_string(), "Share link not found.");
	}

	#[test]
	fn rate_limited_surfaces_the_wait() {
		let error = Error::RateLimited {
			class: OperationClass::ai_generation(),
			retry_after: Duration::seconds(90),
		};
		let rendered = error.to_string();

		assert!(rendered.contains("ai_generation"));
		assert!(rendered.contains("retry after"));
	}
}
