//! Share registry: issuing, resolving, and revoking public access tokens.

pub mod link;

pub use link::*;

// crates.io
use url::Url;
// self
use crate::{
	_prelude::*,
	domain::{PrincipalId, ResourceId, ResourceRef, ResourceType, ShareToken},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{InsertOutcome, ShareStore, StoreError},
};

/// Boxed future returned by [`ResourceDirectory`] implementations.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// External collaborator answering existence and ownership questions for one
/// resource kind.
///
/// The registry holds one implementation per [`ResourceType`] variant in a lookup
/// table; resource business logic stays entirely on the collaborator's side.
pub trait ResourceDirectory
where
	Self: Send + Sync,
{
	/// Returns `true` if the resource exists.
	fn exists<'a>(&'a self, id: &'a ResourceId) -> DirectoryFuture<'a, bool>;

	/// Returns the recorded owner of the resource, if any.
	fn owner_of<'a>(&'a self, id: &'a ResourceId) -> DirectoryFuture<'a, Option<PrincipalId>>;
}

/// Lifetime granted to a new share link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareTtl {
	/// The link never expires.
	Unlimited,
	/// The link expires this long after creation.
	After(Duration),
}
impl ShareTtl {
	/// Convenience constructor for day-granular lifetimes.
	pub fn days(days: i64) -> Self {
		Self::After(Duration::days(days))
	}

	/// Computes the expiry instant for a link created at `from`.
	pub fn expires_at(self, from: OffsetDateTime) -> Option<OffsetDateTime> {
		match self {
			Self::Unlimited => None,
			Self::After(ttl) => Some(from + ttl),
		}
	}
}

/// Registry-wide configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
	/// Lifetime applied when the caller does not request one.
	pub default_ttl: ShareTtl,
}
impl Default for ShareConfig {
	fn default() -> Self {
		Self { default_ttl: ShareTtl::days(30) }
	}
}

/// Issues, resolves, and revokes unguessable public share links.
///
/// The registry owns every [`ShareLink`] row. Rows are soft-revoked and never
/// physically deleted, and at most one link per resource is active at any instant:
/// creation is an idempotent create-or-get backed by a per-resource singleflight
/// guard plus the store's atomic create-if-vacant.
#[derive(Clone)]
pub struct ShareRegistry {
	store: Arc<dyn ShareStore>,
	directories: HashMap<ResourceType, Arc<dyn ResourceDirectory>>,
	config: ShareConfig,
	create_guards: Arc<Mutex<HashMap<ResourceRef, Arc<AsyncMutex<()>>>>>,
}
impl ShareRegistry {
	/// Creates a registry over the provided link store with default configuration.
	pub fn new(store: Arc<dyn ShareStore>) -> Self {
		Self {
			store,
			directories: HashMap::new(),
			config: ShareConfig::default(),
			create_guards: Default::default(),
		}
	}

	/// Wires the directory collaborator for one resource kind.
	pub fn with_directory(
		mut self,
		resource_type: ResourceType,
		directory: Arc<dyn ResourceDirectory>,
	) -> Self {
		self.directories.insert(resource_type, directory);

		self
	}

	/// Overrides the registry configuration.
	pub fn with_config(mut self, config: ShareConfig) -> Self {
		self.config = config;

		self
	}

	/// Creates a share link for the resource, or returns the existing active one.
	///
	/// `ttl` defaults to the configured lifetime. Fails with [`Error::NotOwner`] when
	/// `owner` does not match the directory's recorded owner, and [`Error::NotFound`]
	/// when the resource does not exist.
	pub async fn create_or_get(
		&self,
		resource: &ResourceRef,
		owner: &PrincipalId,
		ttl: Option<ShareTtl>,
	) -> Result<ShareLink> {
		self.create_or_get_at(resource, owner, ttl, OffsetDateTime::now_utc()).await
	}

	/// [`create_or_get`](Self::create_or_get) against an explicit clock instant.
	pub async fn create_or_get_at(
		&self,
		resource: &ResourceRef,
		owner: &PrincipalId,
		ttl: Option<ShareTtl>,
		now: OffsetDateTime,
	) -> Result<ShareLink> {
		const KIND: OpKind = OpKind::ShareCreate;

		let span = OpSpan::new(KIND, "create_or_get");

		obs::record_op(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_owner(resource, owner).await?;

				// Serialize concurrent creates for the same resource; the store's
				// create-if-vacant still guards against racing registries sharing a
				// backend.
				let guard = self.create_guard(resource);
				let _singleflight = guard.lock().await;
				let expires_at = ttl.unwrap_or(self.config.default_ttl).expires_at(now);

				loop {
					let link =
						ShareLink::builder(ShareToken::generate(), resource.clone(), owner.clone())
							.created_at(now)
							.maybe_expires_at(expires_at)
							.build();

					match self.store.insert_if_vacant(link.clone(), now).await? {
						InsertOutcome::Inserted => return Ok(link),
						InsertOutcome::ActiveExists(existing) => return Ok(existing),
						InsertOutcome::TokenCollision => continue,
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op(KIND, OpOutcome::Success),
			Err(_) => obs::record_op(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Resolves a public token to its resource reference.
	///
	/// Missing, revoked, and expired tokens all yield the same [`Error::NotFound`]
	/// so an unauthenticated prober learns nothing about link state.
	pub async fn resolve(&self, token: &str) -> Result<ResourceRef> {
		self.resolve_at(token, OffsetDateTime::now_utc()).await
	}

	/// [`resolve`](Self::resolve) against an explicit clock instant.
	pub async fn resolve_at(&self, token: &str, now: OffsetDateTime) -> Result<ResourceRef> {
		const KIND: OpKind = OpKind::ShareResolve;

		let span = OpSpan::new(KIND, "resolve");

		obs::record_op(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let link = self.store.find_by_token(token).await?.ok_or(Error::NotFound)?;

				if !link.is_active_at(now) {
					return Err(Error::NotFound);
				}

				// Best effort: a failed access stamp must not break the read path.
				if self.store.touch_access(token, now).await.is_err() {
					#[cfg(feature = "tracing")]
					tracing::warn!("failed to stamp last access on share link");
				}

				Ok(link.resource)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op(KIND, OpOutcome::Success),
			Err(_) => obs::record_op(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Revokes the active link for a resource.
	///
	/// Idempotent: revoking an already-revoked or never-shared resource is a no-op
	/// success. Fails with [`Error::NotOwner`] when `owner` does not match the
	/// directory's recorded owner.
	pub async fn revoke(&self, resource: &ResourceRef, owner: &PrincipalId) -> Result<()> {
		self.revoke_at(resource, owner, OffsetDateTime::now_utc()).await
	}

	/// [`revoke`](Self::revoke) against an explicit clock instant.
	pub async fn revoke_at(
		&self,
		resource: &ResourceRef,
		owner: &PrincipalId,
		now: OffsetDateTime,
	) -> Result<()> {
		const KIND: OpKind = OpKind::ShareRevoke;

		let span = OpSpan::new(KIND, "revoke");

		obs::record_op(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_owner(resource, owner).await?;

				let _revoked = self.store.revoke_active(resource, now).await?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op(KIND, OpOutcome::Success),
			Err(_) => obs::record_op(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Returns the active link for a resource, if any (owner dashboards).
	pub async fn active_link(&self, resource: &ResourceRef) -> Result<Option<ShareLink>> {
		self.active_link_at(resource, OffsetDateTime::now_utc()).await
	}

	/// [`active_link`](Self::active_link) against an explicit clock instant.
	pub async fn active_link_at(
		&self,
		resource: &ResourceRef,
		now: OffsetDateTime,
	) -> Result<Option<ShareLink>> {
		Ok(self.store.find_active(resource, now).await?)
	}

	async fn ensure_owner(&self, resource: &ResourceRef, owner: &PrincipalId) -> Result<()> {
		let directory =
			self.directories.get(&resource.resource_type).ok_or(Error::NotFound)?;

		if !directory.exists(&resource.resource_id).await? {
			return Err(Error::NotFound);
		}

		match directory.owner_of(&resource.resource_id).await? {
			Some(recorded) if recorded == *owner => Ok(()),
			_ => Err(Error::NotOwner),
		}
	}

	fn create_guard(&self, resource: &ResourceRef) -> Arc<AsyncMutex<()>> {
		self.create_guards.lock().entry(resource.clone()).or_default().clone()
	}
}
impl Debug for ShareRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ShareRegistry")
			.field("config", &self.config)
			.field("directories", &self.directories.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Renders the public URL for a token under the provided base.
pub fn public_url(base: &Url, token: &ShareToken) -> Result<Url, url::ParseError> {
	base.join(&format!("share/{}", token.expose()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ttl_arithmetic_matches_the_calendar() {
		let from = OffsetDateTime::UNIX_EPOCH;

		assert_eq!(ShareTtl::Unlimited.expires_at(from), None);
		assert_eq!(ShareTtl::days(30).expires_at(from), Some(from + Duration::days(30)));
	}

	#[test]
	fn default_config_grants_thirty_days() {
		assert_eq!(ShareConfig::default().default_ttl, ShareTtl::days(30));
	}

	#[test]
	fn public_url_embeds_the_token() {
		let base = Url::parse("https://example.com/public/").expect("Base URL should parse.");
		let token = ShareToken::from_value("tok-123");
		let rendered = public_url(&base, &token).expect("Public URL should render.");

		assert_eq!(rendered.as_str(), "https://example.com/public/share/tok-123");
	}
}
