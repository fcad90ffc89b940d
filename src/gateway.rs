//! Gateway composing the rate limiter, a gated operation, and the usage ledger.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	domain::{OperationClass, PrincipalId},
	ledger::{self, CostUnits, Outcome, UsageRecord},
	limit::{Decision, RateLimiter},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::LedgerStore,
};

/// Boxed future returned by [`Operation`] implementations.
pub type OperationFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<Completion<T>, OperationError>> + 'a + Send>>;

/// Output of a successful gated operation together with its reported cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion<T> {
	/// Operation payload released to the caller.
	pub output: T,
	/// Cost the operation reports for this invocation.
	pub cost: CostUnits,
}

/// A billable unit of work executed under the gateway's governance.
///
/// Implementations wrap the actual provider call (document generation, rewrite,
/// export, ...) and report the cost they incurred; the gateway owns quota and
/// audit bookkeeping around them.
pub trait Operation
where
	Self: Send + Sync,
{
	/// Payload produced on success.
	type Output;

	/// Runs the operation once.
	fn invoke(&self) -> OperationFuture<'_, Self::Output>;
}

/// Failure reported by a gated operation.
///
/// Carries the cost consumed before the failure surfaced, so partial provider
/// spend still lands in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{detail}")]
pub struct OperationError {
	/// Human-readable failure detail.
	pub detail: String,
	/// Cost consumed before the failure surfaced.
	pub cost_incurred: CostUnits,
}
impl OperationError {
	/// Creates a zero-cost failure with the provided detail.
	pub fn new(detail: impl Into<String>) -> Self {
		Self { detail: detail.into(), cost_incurred: CostUnits::ZERO }
	}

	/// Attaches the cost consumed before the failure.
	pub fn with_cost(mut self, cost: CostUnits) -> Self {
		self.cost_incurred = cost;

		self
	}
}

/// Behavior when a ledger append fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
	/// Fail the whole invocation; billed classes must never release unaudited results.
	Blocking,
	/// Release the result anyway and log the lost record.
	Degrade,
}

/// One governed invocation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatedRequest {
	/// Principal the attempt is billed to.
	pub principal: PrincipalId,
	/// Primary operation class; the usage record is filed under it.
	pub class: OperationClass,
	/// Additional classes that must also grant quota.
	pub extra_classes: Vec<OperationClass>,
	/// Operation-specific metadata copied into the usage record.
	pub metadata: Value,
}
impl GatedRequest {
	/// Creates a request with no extra classes and empty metadata.
	pub fn new(principal: PrincipalId, class: OperationClass) -> Self {
		Self { principal, class, extra_classes: Vec::new(), metadata: Value::Null }
	}

	/// Adds a class that must also grant quota before the operation runs.
	pub fn with_extra_class(mut self, class: OperationClass) -> Self {
		self.extra_classes.push(class);

		self
	}

	/// Attaches metadata copied into the usage record.
	pub fn with_metadata(mut self, metadata: Value) -> Self {
		self.metadata = metadata;

		self
	}

	/// Every class the attempt must satisfy, primary class first.
	pub fn required_classes(&self) -> impl Iterator<Item = &OperationClass> {
		[&self.class].into_iter().chain(&self.extra_classes)
	}
}

/// Composes the rate limiter, a gated [`Operation`], and the usage ledger.
///
/// Every invocation attempt appends exactly one [`UsageRecord`], including attempts
/// the limiter rejects. For classes in [`LedgerMode::Blocking`] the record is durable
/// before the result is released.
///
/// The crate does not spawn tasks, so hosts that cancel callers mid-flight should
/// drive [`invoke`](Self::invoke) on a detached task; dropping the future between
/// the operation completing and the ledger append loses the record.
#[derive(Clone)]
pub struct Gateway {
	limiter: Arc<RateLimiter>,
	ledger: Arc<dyn LedgerStore>,
	ledger_modes: HashMap<OperationClass, LedgerMode>,
	default_ledger_mode: LedgerMode,
}
impl Gateway {
	/// Creates a gateway; every class blocks on ledger failures until configured otherwise.
	pub fn new(limiter: Arc<RateLimiter>, ledger: Arc<dyn LedgerStore>) -> Self {
		Self {
			limiter,
			ledger,
			ledger_modes: HashMap::new(),
			default_ledger_mode: LedgerMode::Blocking,
		}
	}

	/// Sets the ledger-failure behavior for one class.
	pub fn with_ledger_mode(mut self, class: OperationClass, mode: LedgerMode) -> Self {
		self.ledger_modes.insert(class, mode);

		self
	}

	/// Replaces the fallback ledger-failure behavior.
	pub fn with_default_ledger_mode(mut self, mode: LedgerMode) -> Self {
		self.default_ledger_mode = mode;

		self
	}

	/// Returns the effective ledger-failure behavior for a class.
	pub fn ledger_mode_for(&self, class: &OperationClass) -> LedgerMode {
		self.ledger_modes.get(class).copied().unwrap_or(self.default_ledger_mode)
	}

	/// Runs one governed invocation using the current UTC instant.
	pub async fn invoke<O>(&self, request: &GatedRequest, operation: &O) -> Result<O::Output>
	where
		O: Operation,
	{
		self.invoke_at(request, operation, OffsetDateTime::now_utc()).await
	}

	/// Runs one governed invocation at the provided instant.
	///
	/// Quota is consumed for every required class before the operation starts; a denial
	/// by any class rejects the attempt, records it with zero cost, and reports the
	/// denying class together with its remaining window.
	pub async fn invoke_at<O>(
		&self,
		request: &GatedRequest,
		operation: &O,
		now: OffsetDateTime,
	) -> Result<O::Output>
	where
		O: Operation,
	{
		const KIND: OpKind = OpKind::Invoke;

		let span = OpSpan::new(KIND, "invoke");

		obs::record_op(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				for class in request.required_classes() {
					if let Decision::Denied { retry_after } =
						self.limiter.check_at(&request.principal, class, now).await
					{
						let record = self.build_record(request, Outcome::RateLimited, CostUnits::ZERO, now);

						self.write_record(&request.class, record).await?;

						return Err(Error::RateLimited { class: class.clone(), retry_after });
					}
				}

				match operation.invoke().await {
					Ok(completion) => {
						let record =
							self.build_record(request, Outcome::Success, completion.cost, now);

						// The audit row lands before the payload leaves the gateway.
						self.write_record(&request.class, record).await?;

						Ok(completion.output)
					},
					Err(error) => {
						let record = self
							.build_record(request, Outcome::Failure, error.cost_incurred, now)
							.with_metadata(failure_metadata(&request.metadata, &error.detail));

						self.write_record(&request.class, record).await?;

						Err(Error::Operation(error))
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op(KIND, OpOutcome::Success),
			Err(Error::RateLimited { .. }) => obs::record_op(KIND, OpOutcome::RateLimited),
			Err(_) => obs::record_op(KIND, OpOutcome::Failure),
		}

		result
	}

	fn build_record(
		&self,
		request: &GatedRequest,
		outcome: Outcome,
		cost: CostUnits,
		now: OffsetDateTime,
	) -> UsageRecord {
		UsageRecord::new(request.principal.clone(), request.class.clone(), outcome, cost)
			.recorded_at(now)
			.with_metadata(request.metadata.clone())
	}

	async fn write_record(&self, class: &OperationClass, record: UsageRecord) -> Result<()> {
		match self.ledger.append(record).await {
			Ok(()) => Ok(()),
			Err(_error) => match self.ledger_mode_for(class) {
				LedgerMode::Blocking => Err(Error::LedgerUnavailable(_error)),
				LedgerMode::Degrade => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						class = class.as_str(),
						error = %_error,
						"usage record lost; class degrades on ledger failure",
					);

					Ok(())
				},
			},
		}
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("limiter", &self.limiter)
			.field("ledger_modes", &self.ledger_modes)
			.field("default_ledger_mode", &self.default_ledger_mode)
			.finish()
	}
}

/// Merges the truncated failure detail into the request metadata.
fn failure_metadata(base: &Value, detail: &str) -> Value {
	let detail = Value::String(ledger::truncate_error_detail(detail));

	match base {
		Value::Object(fields) => {
			let mut fields = fields.clone();

			fields.insert("error".into(), detail);

			Value::Object(fields)
		},
		Value::Null => {
			let mut fields = serde_json::Map::new();

			fields.insert("error".into(), detail);

			Value::Object(fields)
		},
		other => {
			let mut fields = serde_json::Map::new();

			fields.insert("context".into(), other.clone());
			fields.insert("error".into(), detail);

			Value::Object(fields)
		},
	}
}
