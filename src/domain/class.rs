//! Operation class labels used to select rate-limit and ledger policies.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

const CLASS_MAX_LEN: usize = 64;

/// Validation failures raised when constructing an [`OperationClass`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ClassError {
	/// Class labels cannot be empty.
	#[error("Operation class label cannot be empty.")]
	Empty,
	/// Class labels are lowercase ASCII words joined by underscores.
	#[error("Operation class label `{label}` contains characters outside [a-z0-9_].")]
	InvalidCharacter {
		/// The offending label.
		label: String,
	},
	/// Class labels are capped to keep metric and storage keys small.
	#[error("Operation class label exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Named category of gated operation with its own rate-limit configuration.
///
/// Labels follow the `snake_case` convention of throttle scopes (`ai_generation`,
/// `ai_rewrite`, `user`). Well-known classes have dedicated constructors; deployments
/// may mint additional classes through [`OperationClass::new`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationClass(String);
impl OperationClass {
	/// Creates a class label after validation.
	pub fn new(label: impl AsRef<str>) -> Result<Self, ClassError> {
		let view = label.as_ref();

		if view.is_empty() {
			return Err(ClassError::Empty);
		}
		if view.len() > CLASS_MAX_LEN {
			return Err(ClassError::TooLong { max: CLASS_MAX_LEN });
		}
		if !view.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
			return Err(ClassError::InvalidCharacter { label: view.to_owned() });
		}

		Ok(Self(view.to_owned()))
	}

	/// Expensive generative operations (summaries, full documents).
	pub fn ai_generation() -> Self {
		Self("ai_generation".into())
	}

	/// Cheaper generative rewrites of existing text.
	pub fn ai_rewrite() -> Self {
		Self("ai_rewrite".into())
	}

	/// General per-principal request budget.
	pub fn user() -> Self {
		Self("user".into())
	}

	/// Returns the label as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for OperationClass {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for OperationClass {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<OperationClass> for String {
	fn from(value: OperationClass) -> Self {
		value.0
	}
}
impl TryFrom<String> for OperationClass {
	type Error = ClassError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(&value)
	}
}
impl FromStr for OperationClass {
	type Err = ClassError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for OperationClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "OperationClass({})", self.0)
	}
}
impl Display for OperationClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
