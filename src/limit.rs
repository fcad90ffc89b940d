//! Fixed-window rate limiting keyed by principal × operation class.

// self
use crate::{
	_prelude::*,
	domain::{OperationClass, PrincipalId},
	store::{AcquireOutcome, WindowKey, WindowStore},
};

/// Behavior when the window store is unavailable.
///
/// Billed classes should fail closed to bound cost exposure; the general request
/// class may fail open so an infrastructure hiccup does not lock everyone out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
	/// Deny the attempt on storage failure.
	Closed,
	/// Permit the attempt on storage failure.
	Open,
}

/// Per-class rate-limit configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPolicy {
	/// Maximum admitted attempts per window.
	pub ceiling: u32,
	/// Window length.
	pub window: Duration,
	/// Behavior when the window store is unavailable.
	pub fail_mode: FailMode,
}
impl ClassPolicy {
	/// Creates a fail-closed policy admitting `ceiling` attempts per hour.
	pub fn per_hour(ceiling: u32) -> Self {
		Self { ceiling, window: Duration::hours(1), fail_mode: FailMode::Closed }
	}

	/// Overrides the window length.
	pub fn with_window(mut self, window: Duration) -> Self {
		self.window = window;

		self
	}

	/// Overrides the storage-failure behavior.
	pub fn with_fail_mode(mut self, fail_mode: FailMode) -> Self {
		self.fail_mode = fail_mode;

		self
	}
}

/// Result of a rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
	/// The attempt may proceed; one quota slot has been consumed.
	Allowed {
		/// Slots left in the current window (zero when admitted via fail-open).
		remaining: u32,
	},
	/// The attempt must wait for the window to roll over.
	Denied {
		/// Remaining duration of the current window; always positive.
		retry_after: Duration,
	},
}
impl Decision {
	/// Returns `true` for [`Decision::Allowed`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allowed { .. })
	}
}

/// Fixed-window rate limiter over a keyed window store.
///
/// Each `(principal, class)` pair owns an independent counter; the check consumes a
/// quota slot through a single atomic read-modify-write in the store, so concurrent
/// requests from one principal can never be admitted past the ceiling. Quota is
/// reserved before any downstream suspension point.
pub struct RateLimiter {
	policies: HashMap<OperationClass, ClassPolicy>,
	default_policy: ClassPolicy,
	windows: Arc<dyn WindowStore>,
}
impl RateLimiter {
	/// Creates a limiter over the provided window store with the stock policy table:
	/// `ai_generation` 10/hour, `ai_rewrite` 30/hour (both fail-closed), and `user`
	/// 100/hour fail-open. Unknown classes fall back to 100/hour fail-closed.
	pub fn new(windows: Arc<dyn WindowStore>) -> Self {
		let policies = HashMap::from_iter([
			(OperationClass::ai_generation(), ClassPolicy::per_hour(10)),
			(OperationClass::ai_rewrite(), ClassPolicy::per_hour(30)),
			(OperationClass::user(), ClassPolicy::per_hour(100).with_fail_mode(FailMode::Open)),
		]);

		Self { policies, default_policy: ClassPolicy::per_hour(100), windows }
	}

	/// Sets or replaces the policy for one class.
	pub fn with_policy(mut self, class: OperationClass, policy: ClassPolicy) -> Self {
		self.policies.insert(class, policy);

		self
	}

	/// Replaces the fallback policy applied to classes without explicit configuration.
	pub fn with_default_policy(mut self, policy: ClassPolicy) -> Self {
		self.default_policy = policy;

		self
	}

	/// Returns the effective policy for a class.
	pub fn policy_for(&self, class: &OperationClass) -> &ClassPolicy {
		self.policies.get(class).unwrap_or(&self.default_policy)
	}

	/// Consumes one quota slot for the pair using the current UTC instant.
	pub async fn check(&self, principal: &PrincipalId, class: &OperationClass) -> Decision {
		self.check_at(principal, class, OffsetDateTime::now_utc()).await
	}

	/// Consumes one quota slot for the pair at the provided instant.
	pub async fn check_at(
		&self,
		principal: &PrincipalId,
		class: &OperationClass,
		now: OffsetDateTime,
	) -> Decision {
		let policy = self.policy_for(class);
		let key = WindowKey::new(principal.clone(), class.clone());

		match self.windows.try_acquire(&key, policy.ceiling, policy.window, now).await {
			Ok(AcquireOutcome::Admitted { count }) =>
				Decision::Allowed { remaining: policy.ceiling.saturating_sub(count) },
			Ok(AcquireOutcome::Exhausted { retry_after }) => Decision::Denied { retry_after },
			Err(_error) => match policy.fail_mode {
				FailMode::Open => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						class = class.as_str(),
						error = %_error,
						"window store unavailable; admitting via fail-open policy",
					);

					Decision::Allowed { remaining: 0 }
				},
				FailMode::Closed => Decision::Denied { retry_after: policy.window },
			},
		}
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("policies", &self.policies)
			.field("default_policy", &self.default_policy)
			.finish()
	}
}
