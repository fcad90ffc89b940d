//! Shareable resource kinds and references.

// self
use crate::{_prelude::*, domain::ResourceId};

/// Resource kinds that can be shared publicly.
///
/// A closed set by design: each variant is wired to its own
/// [`ResourceDirectory`](crate::share::ResourceDirectory) collaborator in the
/// registry's lookup table, so there is no open-ended runtime type dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
	/// A resume document.
	Resume,
	/// A cover letter document.
	CoverLetter,
}
impl ResourceType {
	/// All supported resource kinds.
	pub const ALL: [Self; 2] = [Self::Resume, Self::CoverLetter];

	/// Returns a stable label suitable for storage and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Resume => "resume",
			Self::CoverLetter => "cover_letter",
		}
	}
}
impl Display for ResourceType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Reference to one ownable, shareable resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
	/// Kind of the referenced resource.
	pub resource_type: ResourceType,
	/// Identifier of the referenced resource.
	pub resource_id: ResourceId,
}
impl ResourceRef {
	/// Creates a reference for the provided kind and identifier.
	pub fn new(resource_type: ResourceType, resource_id: ResourceId) -> Self {
		Self { resource_type, resource_id }
	}
}
impl Display for ResourceRef {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.resource_type, self.resource_id)
	}
}
