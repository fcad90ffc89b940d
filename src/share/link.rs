//! Share link records and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	domain::{PrincipalId, ResourceRef, ShareToken},
};

/// Current lifecycle status for a share link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
	/// Link is currently resolvable.
	Active,
	/// Link exceeded its expiry instant.
	Expired,
	/// Link has been revoked by its owner or an admin.
	Revoked,
}

/// Public share link tying an unguessable token to one owned resource.
///
/// Links are never physically deleted: revocation stamps `revoked_at` and expiry is
/// derived from `expires_at` against the registry clock, so the full history stays
/// available for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
	/// Capability token; redacted by its own formatters.
	pub token: ShareToken,
	/// The shared resource.
	pub resource: ResourceRef,
	/// Principal that created the link; only the owner (or an admin) may revoke.
	pub owner: PrincipalId,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Expiry instant; `None` means the link never expires.
	pub expires_at: Option<OffsetDateTime>,
	/// Revocation instant, set at most once; irreversible.
	pub revoked_at: Option<OffsetDateTime>,
	/// Last successful public resolution, for audit.
	pub last_accessed_at: Option<OffsetDateTime>,
}
impl ShareLink {
	/// Returns a builder for the provided token, resource, and owner.
	pub fn builder(token: ShareToken, resource: ResourceRef, owner: PrincipalId) -> ShareLinkBuilder {
		ShareLinkBuilder { token, resource, owner, created_at: None, expires_at: None }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> LinkStatus {
		if self.revoked_at.is_some() {
			return LinkStatus::Revoked;
		}
		if let Some(expires_at) = self.expires_at
			&& instant >= expires_at
		{
			return LinkStatus::Expired;
		}

		LinkStatus::Active
	}

	/// Computes the lifecycle status using the current UTC instant.
	pub fn status(&self) -> LinkStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the link is resolvable at the provided instant.
	pub fn is_active_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), LinkStatus::Active)
	}

	/// Returns `true` if the link is currently resolvable.
	pub fn is_active(&self) -> bool {
		matches!(self.status(), LinkStatus::Active)
	}

	/// Returns `true` if the link has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Marks the link as revoked. Idempotent: the first revocation instant wins.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at.get_or_insert(instant);
	}

	/// Stamps the last successful public access.
	pub fn touch(&mut self, instant: OffsetDateTime) {
		self.last_accessed_at = Some(instant);
	}
}

/// Builder for [`ShareLink`].
#[derive(Clone, Debug)]
pub struct ShareLinkBuilder {
	token: ShareToken,
	resource: ResourceRef,
	owner: PrincipalId,
	created_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
}
impl ShareLinkBuilder {
	/// Sets the creation instant (defaults to now).
	pub fn created_at(mut self, instant: OffsetDateTime) -> Self {
		self.created_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets an optional absolute expiry; `None` leaves the link without expiry.
	pub fn maybe_expires_at(mut self, instant: Option<OffsetDateTime>) -> Self {
		self.expires_at = instant;

		self
	}

	/// Consumes the builder and produces a [`ShareLink`].
	pub fn build(self) -> ShareLink {
		ShareLink {
			token: self.token,
			resource: self.resource,
			owner: self.owner,
			created_at: self.created_at.unwrap_or_else(OffsetDateTime::now_utc),
			expires_at: self.expires_at,
			revoked_at: None,
			last_accessed_at: None,
		}
	}
}
