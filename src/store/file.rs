//! Simple file-backed [`LedgerStore`] for lightweight single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	ledger::{RecordFilter, UsageRecord},
	store::{LedgerStore, StoreError, StoreFuture},
};

/// Persists the usage ledger to a JSON snapshot after each append.
///
/// The snapshot is rewritten through a temp file + rename so a crash mid-write never
/// truncates the audit trail.
#[derive(Clone, Debug)]
pub struct FileLedger {
	path: PathBuf,
	inner: Arc<RwLock<Vec<UsageRecord>>>,
}
impl FileLedger {
	/// Opens (or creates) a ledger at the provided path, eagerly loading existing records.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { Vec::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Vec<UsageRecord>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Vec::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create ledger directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, records: &[UsageRecord]) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(records).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize ledger snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl LedgerStore for FileLedger {
	fn append(&self, record: UsageRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.push(record);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn list<'a>(&'a self, filter: &'a RecordFilter) -> StoreFuture<'a, Vec<UsageRecord>> {
		Box::pin(async move {
			Ok(self
				.inner
				.read()
				.iter()
				.rev()
				.filter(|record| filter.matches(record))
				.cloned()
				.collect())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{
		domain::{OperationClass, PrincipalId},
		ledger::{CostUnits, Outcome},
	};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"share_gate_file_ledger_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record() -> UsageRecord {
		UsageRecord::new(
			PrincipalId::new("user-demo").expect("Failed to build principal fixture."),
			OperationClass::ai_generation(),
			Outcome::Success,
			CostUnits::tokens(100, 350),
		)
	}

	#[test]
	fn append_and_reload_round_trip() {
		let path = temp_path();
		let ledger = FileLedger::open(&path).expect("Failed to open file ledger snapshot.");
		let record = build_record();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file ledger test.");

		rt.block_on(ledger.append(record.clone()))
			.expect("Failed to append fixture record to file ledger.");
		drop(ledger);

		let reopened = FileLedger::open(&path).expect("Failed to reopen file ledger snapshot.");
		let listed = rt
			.block_on(reopened.list(&RecordFilter::new()))
			.expect("Failed to list records from reopened file ledger.");

		assert_eq!(listed, vec![record]);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary ledger snapshot {}: {e}", path.display())
		});
	}
}
