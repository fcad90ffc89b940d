//! Usage ledger records: the immutable audit trail behind every gated operation.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	domain::{OperationClass, PrincipalId},
};

/// Error detail stored in a record's metadata is capped to this many characters.
pub const ERROR_DETAIL_MAX_LEN: usize = 1000;

const RECORD_ID_RAW_BYTES: usize = 16;

/// Random identifier of one usage record.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);
impl RecordId {
	/// Draws a fresh identifier from the thread-local CSPRNG.
	pub fn generate() -> Self {
		let mut raw = [0_u8; RECORD_ID_RAW_BYTES];

		rand::rng().fill_bytes(&mut raw);

		Self(URL_SAFE_NO_PAD.encode(raw))
	}

	/// Returns the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RecordId({})", self.0)
	}
}
impl Display for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Outcome labels recorded for each gated attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
	/// The operation executed and completed.
	Success,
	/// The operation executed and errored.
	Failure,
	/// The attempt was rejected by the rate limiter before executing.
	RateLimited,
}
impl Outcome {
	/// Returns a stable label suitable for filters and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Failure => "failure",
			Self::RateLimited => "rate_limited",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cost/volume metrics reported by a gated operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostUnits {
	/// Tokens consumed by the prompt side of a provider call.
	pub tokens_in: u64,
	/// Tokens produced by the completion side of a provider call.
	pub tokens_out: u64,
	/// Estimated monetary cost in thousandths of a cent.
	pub estimated_milli_cents: u64,
}
impl CostUnits {
	/// No cost; recorded for rate-limited rejections.
	pub const ZERO: Self = Self { tokens_in: 0, tokens_out: 0, estimated_milli_cents: 0 };

	/// Creates a cost report from raw token counts.
	pub fn tokens(tokens_in: u64, tokens_out: u64) -> Self {
		Self { tokens_in, tokens_out, estimated_milli_cents: 0 }
	}

	/// Attaches the provider's own monetary estimate.
	pub fn with_estimated_milli_cents(mut self, estimated_milli_cents: u64) -> Self {
		self.estimated_milli_cents = estimated_milli_cents;

		self
	}

	/// Returns `true` when every metric is zero.
	pub fn is_zero(&self) -> bool {
		*self == Self::ZERO
	}
}

/// One immutable entry in the usage ledger.
///
/// Exactly one record is appended per gateway invocation attempt, including attempts
/// the rate limiter rejects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
	/// Record identifier.
	pub id: RecordId,
	/// Principal that attempted the operation.
	pub principal: PrincipalId,
	/// Operation class the attempt was billed against.
	pub class: OperationClass,
	/// Instant the attempt was recorded.
	pub recorded_at: OffsetDateTime,
	/// How the attempt ended.
	pub outcome: Outcome,
	/// Cost metrics; zero for rate-limited rejections.
	pub cost: CostUnits,
	/// Operation-specific payload, opaque to the core (model name, prompt
	/// fingerprint, truncated error detail, ...).
	pub metadata: serde_json::Value,
}
impl UsageRecord {
	/// Creates a record stamped with the current UTC instant and empty metadata.
	pub fn new(
		principal: PrincipalId,
		class: OperationClass,
		outcome: Outcome,
		cost: CostUnits,
	) -> Self {
		Self {
			id: RecordId::generate(),
			principal,
			class,
			recorded_at: OffsetDateTime::now_utc(),
			outcome,
			cost,
			metadata: serde_json::Value::Null,
		}
	}

	/// Overrides the recording instant.
	pub fn recorded_at(mut self, instant: OffsetDateTime) -> Self {
		self.recorded_at = instant;

		self
	}

	/// Attaches operation-specific metadata.
	pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = metadata;

		self
	}
}

/// Filter for the admin read path over ledger records. Empty filters match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
	/// Restricts results to one principal.
	pub principal: Option<PrincipalId>,
	/// Restricts results to one operation class.
	pub class: Option<OperationClass>,
	/// Restricts results to one outcome.
	pub outcome: Option<Outcome>,
}
impl RecordFilter {
	/// Creates a filter matching every record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Restricts the filter to the provided principal.
	pub fn by_principal(mut self, principal: PrincipalId) -> Self {
		self.principal = Some(principal);

		self
	}

	/// Restricts the filter to the provided class.
	pub fn by_class(mut self, class: OperationClass) -> Self {
		self.class = Some(class);

		self
	}

	/// Restricts the filter to the provided outcome.
	pub fn by_outcome(mut self, outcome: Outcome) -> Self {
		self.outcome = Some(outcome);

		self
	}

	/// Returns `true` when the record passes every populated criterion.
	pub fn matches(&self, record: &UsageRecord) -> bool {
		self.principal.as_ref().is_none_or(|principal| *principal == record.principal)
			&& self.class.as_ref().is_none_or(|class| *class == record.class)
			&& self.outcome.is_none_or(|outcome| outcome == record.outcome)
	}
}

/// Stable fingerprint of a prompt for ledger metadata.
///
/// A base64 (no padding) SHA-256 digest lets records correlate identical prompts
/// without retaining the prompt text itself.
pub fn prompt_fingerprint(prompt: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(prompt.as_bytes());

	STANDARD_NO_PAD.encode(hasher.finalize())
}

/// Truncates provider error detail to [`ERROR_DETAIL_MAX_LEN`] characters on a
/// character boundary.
pub fn truncate_error_detail(detail: &str) -> String {
	detail.chars().take(ERROR_DETAIL_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn make_record(outcome: Outcome) -> UsageRecord {
		UsageRecord::new(
			PrincipalId::new("user-1").expect("Principal fixture should be valid."),
			OperationClass::ai_generation(),
			outcome,
			CostUnits::tokens(120, 480),
		)
	}

	#[test]
	fn fingerprint_is_stable_and_prompt_free() {
		let first = prompt_fingerprint("Write a summary for a backend engineer.");
		let second = prompt_fingerprint("Write a summary for a backend engineer.");

		assert_eq!(first, second);
		assert_ne!(first, prompt_fingerprint("Write a different summary."));
		assert!(!first.contains("summary"));
	}

	#[test]
	fn error_detail_truncates_on_character_boundaries() {
		let oversized = "é".repeat(ERROR_DETAIL_MAX_LEN + 50);
		let truncated = truncate_error_detail(&oversized);

		assert_eq!(truncated.chars().count(), ERROR_DETAIL_MAX_LEN);

		let short = truncate_error_detail("provider timeout");

		assert_eq!(short, "provider timeout");
	}

	#[test]
	fn filters_match_on_every_populated_criterion() {
		let record = make_record(Outcome::Success);

		assert!(RecordFilter::new().matches(&record));
		assert!(RecordFilter::new().by_class(OperationClass::ai_generation()).matches(&record));
		assert!(!RecordFilter::new().by_outcome(Outcome::RateLimited).matches(&record));
		assert!(
			!RecordFilter::new()
				.by_principal(PrincipalId::new("someone-else").expect("Fixture should be valid."))
				.matches(&record)
		);
	}

	#[test]
	fn record_ids_are_unique_per_record() {
		let first = make_record(Outcome::Success);
		let second = make_record(Outcome::Success);

		assert_ne!(first.id, second.id);
	}

	#[test]
	fn zero_cost_is_detectable() {
		assert!(CostUnits::ZERO.is_zero());
		assert!(!CostUnits::tokens(1, 0).is_zero());
	}
}
