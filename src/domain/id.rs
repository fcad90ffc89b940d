//! Strongly typed identifiers enforced across the sharing and governance domain.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

const ID_MAX_LEN: usize = 120;

/// Validation failure raised when constructing a domain identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
#[error("{kind} identifier is invalid: {reason}")]
pub struct IdError {
	/// Kind of identifier (principal, resource).
	pub kind: &'static str,
	/// Which validation rule the value violated.
	pub reason: IdErrorReason,
}

/// Validation rules an identifier can violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IdErrorReason {
	/// The value was empty.
	Empty,
	/// The value contains whitespace characters.
	ContainsWhitespace,
	/// The value exceeds the permitted character count.
	TooLong,
}
impl Display for IdErrorReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Empty => f.write_str("value is empty."),
			Self::ContainsWhitespace => f.write_str("value contains whitespace."),
			Self::TooLong => write!(f, "value exceeds {ID_MAX_LEN} characters."),
		}
	}
}

fn validate(kind: &'static str, view: &str) -> Result<(), IdError> {
	let reason = if view.is_empty() {
		IdErrorReason::Empty
	} else if view.chars().any(char::is_whitespace) {
		IdErrorReason::ContainsWhitespace
	} else if view.len() > ID_MAX_LEN {
		IdErrorReason::TooLong
	} else {
		return Ok(());
	};

	Err(IdError { kind, reason })
}

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdError> {
				let view = value.as_ref();

				validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! { PrincipalId, "Identifier of the authenticated actor an operation runs on behalf of.", "Principal" }
def_id! { ResourceId, "Identifier of an ownable, shareable resource.", "Resource" }

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate_on_construction() {
		assert!(PrincipalId::new("").is_err());
		assert!(PrincipalId::new("user 42").is_err());
		assert!(PrincipalId::new(" user-42").is_err());

		let principal = PrincipalId::new("user-42").expect("Principal fixture should be valid.");

		assert_eq!(principal.as_str(), "user-42");
	}

	#[test]
	fn length_limit_is_enforced() {
		let exact = "a".repeat(120);

		ResourceId::new(&exact).expect("Exact-length identifier should be accepted.");

		let err = ResourceId::new("a".repeat(121)).expect_err("Oversized identifier must fail.");

		assert_eq!(err.reason, IdErrorReason::TooLong);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let resource: ResourceId = serde_json::from_str("\"resume-7\"")
			.expect("Valid identifier should deserialize successfully.");

		assert_eq!(resource.as_str(), "resume-7");
		assert!(serde_json::from_str::<ResourceId>("\"with space\"").is_err());
	}

	#[test]
	fn borrow_supports_map_lookup_by_str() {
		let map: HashMap<_, _> = HashMap::from_iter([(
			PrincipalId::new("user-7").expect("Principal used for lookup should be valid."),
			1_u8,
		)]);

		assert_eq!(map.get("user-7"), Some(&1));
	}
}
