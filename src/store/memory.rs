//! Thread-safe in-memory store implementations for local development and tests.

// self
use crate::{
	_prelude::*,
	domain::ResourceRef,
	ledger::{RecordFilter, UsageRecord},
	share::{LinkStatus, ShareLink},
	store::{
		AcquireOutcome, InsertOutcome, LedgerStore, ShareStore, StoreFuture, WindowKey, WindowStore,
	},
};

type LinkMap = Arc<RwLock<HashMap<String, ShareLink>>>;

/// In-process share link store keyed by token.
#[derive(Clone, Debug, Default)]
pub struct MemoryShareStore(LinkMap);
impl MemoryShareStore {
	fn insert_now(map: LinkMap, link: ShareLink, now: OffsetDateTime) -> InsertOutcome {
		// One write lock covers the vacancy check and the insert, so two concurrent
		// creates for the same resource cannot both mint live tokens.
		let mut guard = map.write();

		if let Some(existing) =
			guard.values().find(|row| row.resource == link.resource && row.is_active_at(now))
		{
			return InsertOutcome::ActiveExists(existing.clone());
		}

		let key = link.token.expose().to_owned();

		if guard.contains_key(&key) {
			return InsertOutcome::TokenCollision;
		}

		guard.insert(key, link);

		InsertOutcome::Inserted
	}

	fn find_by_token_now(map: LinkMap, token: String) -> Option<ShareLink> {
		map.read().get(&token).cloned()
	}

	fn find_active_now(
		map: LinkMap,
		resource: ResourceRef,
		now: OffsetDateTime,
	) -> Option<ShareLink> {
		map.read().values().find(|row| row.resource == resource && row.is_active_at(now)).cloned()
	}

	fn revoke_now(
		map: LinkMap,
		resource: ResourceRef,
		instant: OffsetDateTime,
	) -> Option<ShareLink> {
		let mut guard = map.write();
		let mut revoked = None;

		for row in guard.values_mut() {
			if row.resource == resource && row.status_at(instant) == LinkStatus::Active {
				row.revoke(instant);

				revoked = Some(row.clone());
			}
		}

		revoked
	}

	fn touch_now(map: LinkMap, token: String, instant: OffsetDateTime) {
		if let Some(row) = map.write().get_mut(&token) {
			row.touch(instant);
		}
	}
}
impl ShareStore for MemoryShareStore {
	fn insert_if_vacant(
		&self,
		link: ShareLink,
		now: OffsetDateTime,
	) -> StoreFuture<'_, InsertOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_now(map, link, now)) })
	}

	fn find_by_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<ShareLink>> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move { Ok(Self::find_by_token_now(map, token)) })
	}

	fn find_active<'a>(
		&'a self,
		resource: &'a ResourceRef,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<ShareLink>> {
		let map = self.0.clone();
		let resource = resource.to_owned();

		Box::pin(async move { Ok(Self::find_active_now(map, resource, now)) })
	}

	fn revoke_active<'a>(
		&'a self,
		resource: &'a ResourceRef,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<ShareLink>> {
		let map = self.0.clone();
		let resource = resource.to_owned();

		Box::pin(async move { Ok(Self::revoke_now(map, resource, instant)) })
	}

	fn touch_access<'a>(&'a self, token: &'a str, instant: OffsetDateTime) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move {
			Self::touch_now(map, token, instant);

			Ok(())
		})
	}
}

#[derive(Clone, Debug)]
struct WindowState {
	window_start: OffsetDateTime,
	count: u32,
}

type WindowMap = Arc<Mutex<HashMap<WindowKey, WindowState>>>;

/// In-process rate-limit window store with per-call atomic check-and-increment.
#[derive(Clone, Debug, Default)]
pub struct MemoryWindowStore(WindowMap);
impl MemoryWindowStore {
	fn try_acquire_now(
		map: WindowMap,
		key: WindowKey,
		ceiling: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> AcquireOutcome {
		// The lock is held for the whole observe-reset-increment sequence.
		let mut guard = map.lock();
		let state =
			guard.entry(key).or_insert(WindowState { window_start: now, count: 0 });

		if now >= state.window_start + window {
			state.window_start = now;
			state.count = 0;
		}

		if state.count < ceiling {
			state.count += 1;

			AcquireOutcome::Admitted { count: state.count }
		} else {
			AcquireOutcome::Exhausted { retry_after: state.window_start + window - now }
		}
	}
}
impl WindowStore for MemoryWindowStore {
	fn try_acquire<'a>(
		&'a self,
		key: &'a WindowKey,
		ceiling: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> StoreFuture<'a, AcquireOutcome> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::try_acquire_now(map, key, ceiling, window, now)) })
	}
}

type RecordLog = Arc<RwLock<Vec<UsageRecord>>>;

/// In-process append-only usage ledger.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger(RecordLog);
impl MemoryLedger {
	fn list_now(log: RecordLog, filter: RecordFilter) -> Vec<UsageRecord> {
		log.read().iter().rev().filter(|record| filter.matches(record)).cloned().collect()
	}
}
impl LedgerStore for MemoryLedger {
	fn append(&self, record: UsageRecord) -> StoreFuture<'_, ()> {
		let log = self.0.clone();

		Box::pin(async move {
			log.write().push(record);

			Ok(())
		})
	}

	fn list<'a>(&'a self, filter: &'a RecordFilter) -> StoreFuture<'a, Vec<UsageRecord>> {
		let log = self.0.clone();
		let filter = filter.clone();

		Box::pin(async move { Ok(Self::list_now(log, filter)) })
	}
}
