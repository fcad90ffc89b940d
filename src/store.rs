//! Storage contracts and built-in backends for links, windows, and usage records.

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::{MemoryLedger, MemoryShareStore, MemoryWindowStore};

// self
use crate::{
	_prelude::*,
	domain::{OperationClass, PrincipalId, ResourceRef},
	ledger::{RecordFilter, UsageRecord},
	share::ShareLink,
};

/// Boxed future returned by every storage contract.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Error type produced by storage backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Persistence contract for share links.
///
/// The backend must hold the "at most one active link per resource" invariant:
/// [`insert_if_vacant`](Self::insert_if_vacant) is a single atomic create-if-absent,
/// not a check-then-insert pair, so concurrent creates cannot both mint live tokens.
pub trait ShareStore
where
	Self: Send + Sync,
{
	/// Atomically inserts `link` unless an active link already occupies its resource
	/// slot or its token collides with any stored row.
	fn insert_if_vacant(&self, link: ShareLink, now: OffsetDateTime) -> StoreFuture<'_, InsertOutcome>;

	/// Fetches the link bearing the provided token, regardless of status.
	fn find_by_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<ShareLink>>;

	/// Fetches the active link for a resource at the provided instant, if any.
	fn find_active<'a>(
		&'a self,
		resource: &'a ResourceRef,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<ShareLink>>;

	/// Marks every active link for the resource as revoked; returns the last one
	/// affected, or `None` when nothing was active.
	fn revoke_active<'a>(
		&'a self,
		resource: &'a ResourceRef,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<ShareLink>>;

	/// Stamps the last-accessed instant on the link bearing the provided token.
	fn touch_access<'a>(&'a self, token: &'a str, instant: OffsetDateTime) -> StoreFuture<'a, ()>;
}

/// Result of a share link create-if-absent attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
	/// The slot was vacant and the link is now stored.
	Inserted,
	/// An active link already exists for the resource; the caller should reuse it.
	ActiveExists(ShareLink),
	/// The generated token collided with an existing row; re-generate and retry.
	TokenCollision,
}

/// Key identifying one rate-limit window.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowKey {
	/// Principal whose quota is being counted.
	pub principal: PrincipalId,
	/// Operation class the quota applies to.
	pub class: OperationClass,
}
impl WindowKey {
	/// Builds a key for the provided principal and class.
	pub fn new(principal: PrincipalId, class: OperationClass) -> Self {
		Self { principal, class }
	}
}

/// Persistence contract for rate-limit windows.
pub trait WindowStore
where
	Self: Send + Sync,
{
	/// Atomically consumes one quota slot from the window identified by `key`.
	///
	/// The whole observe-reset-increment sequence is a single read-modify-write per
	/// key; two concurrent calls must never both be admitted past `ceiling`.
	fn try_acquire<'a>(
		&'a self,
		key: &'a WindowKey,
		ceiling: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> StoreFuture<'a, AcquireOutcome>;
}

/// Result of a window acquire attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquireOutcome {
	/// A slot was consumed; `count` is the new total within the window.
	Admitted {
		/// Consumed slots in the current window, this one included.
		count: u32,
	},
	/// The window is full; retry once `retry_after` has elapsed.
	Exhausted {
		/// Remaining duration of the current window.
		retry_after: Duration,
	},
}

/// Persistence contract for the append-only usage ledger.
pub trait LedgerStore
where
	Self: Send + Sync,
{
	/// Appends one usage record. Records are never mutated or deleted afterwards.
	fn append(&self, record: UsageRecord) -> StoreFuture<'_, ()>;

	/// Lists records matching the filter, newest first (admin read path).
	fn list<'a>(&'a self, filter: &'a RecordFilter) -> StoreFuture<'a, Vec<UsageRecord>>;
}
