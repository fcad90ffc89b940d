//! Token-based sharing and usage-governance core: mint unguessable share links,
//! govern quota through CAS-smart rate windows, and audit every gated attempt.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(test)] use share_gate as _;
#[cfg(test)] use tokio as _;

pub mod domain;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod limit;
pub mod obs;
pub mod share;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Canned collaborators and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	// std
	use std::sync::atomic::{AtomicU32, Ordering};

	pub use crate::_prelude::*;

	// self
	use crate::{
		domain::{PrincipalId, ResourceId, ResourceRef},
		gateway::{Completion, Operation, OperationError, OperationFuture},
		ledger::{CostUnits, RecordFilter, UsageRecord},
		share::{DirectoryFuture, ResourceDirectory, ShareRegistry},
		store::{LedgerStore, StoreError, StoreFuture, memory::MemoryShareStore},
	};

	/// In-memory resource directory with a fixed ownership table.
	#[derive(Clone, Debug, Default)]
	pub struct StaticDirectory {
		owners: HashMap<ResourceId, PrincipalId>,
	}
	impl StaticDirectory {
		/// Creates an empty directory.
		pub fn new() -> Self {
			Self::default()
		}

		/// Registers a resource together with its recorded owner.
		pub fn with_resource(mut self, id: ResourceId, owner: PrincipalId) -> Self {
			self.owners.insert(id, owner);

			self
		}
	}
	impl ResourceDirectory for StaticDirectory {
		fn exists<'a>(&'a self, id: &'a ResourceId) -> DirectoryFuture<'a, bool> {
			Box::pin(async move { Ok(self.owners.contains_key(id)) })
		}

		fn owner_of<'a>(&'a self, id: &'a ResourceId) -> DirectoryFuture<'a, Option<PrincipalId>> {
			Box::pin(async move { Ok(self.owners.get(id).cloned()) })
		}
	}

	/// Builds a registry backed by a memory store and a single-resource directory.
	pub fn build_test_registry(resource: &ResourceRef, owner: &PrincipalId) -> ShareRegistry {
		let directory =
			StaticDirectory::new().with_resource(resource.resource_id.clone(), owner.clone());

		ShareRegistry::new(Arc::new(MemoryShareStore::default()))
			.with_directory(resource.resource_type, Arc::new(directory))
	}

	/// Gated operation that succeeds with a fixed payload and cost, counting invocations.
	#[derive(Debug, Default)]
	pub struct ScriptedSuccess {
		/// Payload returned on every invocation.
		pub output: String,
		/// Cost reported alongside the payload.
		pub cost: CostUnits,
		calls: AtomicU32,
	}
	impl ScriptedSuccess {
		/// Creates an operation returning `output` with the provided cost.
		pub fn new(output: impl Into<String>, cost: CostUnits) -> Self {
			Self { output: output.into(), cost, calls: AtomicU32::new(0) }
		}

		/// Number of times the operation has run to completion.
		pub fn call_count(&self) -> u32 {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl Operation for ScriptedSuccess {
		type Output = String;

		fn invoke(&self) -> OperationFuture<'_, Self::Output> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);

				Ok(Completion { output: self.output.clone(), cost: self.cost })
			})
		}
	}

	/// Gated operation that always fails, optionally reporting partial cost.
	#[derive(Clone, Debug)]
	pub struct ScriptedFailure {
		/// Error detail propagated to the gateway.
		pub detail: String,
		/// Cost consumed before the failure surfaced.
		pub cost_incurred: CostUnits,
	}
	impl ScriptedFailure {
		/// Creates a zero-cost failure with the provided detail.
		pub fn new(detail: impl Into<String>) -> Self {
			Self { detail: detail.into(), cost_incurred: CostUnits::ZERO }
		}

		/// Attaches the cost consumed before the operation failed.
		pub fn with_cost(mut self, cost: CostUnits) -> Self {
			self.cost_incurred = cost;

			self
		}
	}
	impl Operation for ScriptedFailure {
		type Output = String;

		fn invoke(&self) -> OperationFuture<'_, Self::Output> {
			Box::pin(async move {
				Err(OperationError::new(self.detail.clone()).with_cost(self.cost_incurred))
			})
		}
	}

	/// Ledger store whose writes always fail; exercises the gateway fail policies.
	#[derive(Clone, Copy, Debug, Default)]
	pub struct FailingLedger;
	impl LedgerStore for FailingLedger {
		fn append(&self, _record: UsageRecord) -> StoreFuture<'_, ()> {
			Box::pin(async move { Err(StoreError::Backend { message: "ledger offline".into() }) })
		}

		fn list<'a>(&'a self, _filter: &'a RecordFilter) -> StoreFuture<'a, Vec<UsageRecord>> {
			Box::pin(async move { Err(StoreError::Backend { message: "ledger offline".into() }) })
		}
	}

	/// Builds a principal fixture, panicking on invalid labels.
	pub fn principal(label: &str) -> PrincipalId {
		PrincipalId::new(label).expect("Principal fixture should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use url;
