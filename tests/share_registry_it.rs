// crates.io
use time::macros;
// self
use share_gate::{
	_preludet::*,
	domain::{ResourceId, ResourceRef, ResourceType},
	share::ShareTtl,
};

fn make_resource(id: &str) -> ResourceRef {
	ResourceRef::new(
		ResourceType::Resume,
		ResourceId::new(id).expect("Resource fixture should be valid."),
	)
}

#[tokio::test]
async fn create_or_get_returns_the_same_link_twice() {
	let resource = make_resource("resume-1");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let now = macros::datetime!(2025-06-01 10:00 UTC);

	let first = registry
		.create_or_get_at(&resource, &owner, None, now)
		.await
		.expect("First create should succeed.");
	let second = registry
		.create_or_get_at(&resource, &owner, None, now + Duration::minutes(5))
		.await
		.expect("Second create should succeed.");

	assert_eq!(first.token, second.token, "The second call reuses the active link.");
}

#[tokio::test]
async fn concurrent_creates_mint_exactly_one_active_link() {
	let resource = make_resource("resume-2");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let now = macros::datetime!(2025-06-01 10:00 UTC);

	let (left, right) = tokio::join!(
		registry.create_or_get_at(&resource, &owner, None, now),
		registry.create_or_get_at(&resource, &owner, None, now),
	);
	let left = left.expect("Concurrent create should succeed.");
	let right = right.expect("Concurrent create should succeed.");

	assert_eq!(left.token, right.token, "Both racers observe the same link.");

	let active = registry
		.active_link_at(&resource, now)
		.await
		.expect("Active lookup should succeed.")
		.expect("One link should be active.");

	assert_eq!(active.token, left.token);
}

#[tokio::test]
async fn links_expire_on_schedule() {
	let resource = make_resource("resume-3");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let created = macros::datetime!(2025-06-01 10:00 UTC);

	let link = registry
		.create_or_get_at(&resource, &owner, Some(ShareTtl::After(Duration::hours(1))), created)
		.await
		.expect("Create should succeed.");
	let token = link.token.expose().to_owned();

	let resolved = registry
		.resolve_at(&token, created + Duration::minutes(30))
		.await
		.expect("Resolution inside the lifetime should succeed.");

	assert_eq!(resolved, resource);
	assert!(matches!(
		registry.resolve_at(&token, created + Duration::minutes(61)).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn default_lifetime_is_thirty_days() {
	let resource = make_resource("resume-4");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let created = macros::datetime!(2025-06-01 10:00 UTC);

	let link = registry
		.create_or_get_at(&resource, &owner, None, created)
		.await
		.expect("Create should succeed.");

	assert_eq!(link.expires_at, Some(created + Duration::days(30)));
}

#[tokio::test]
async fn missing_revoked_and_expired_tokens_are_indistinguishable() {
	let resource = make_resource("resume-5");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let created = macros::datetime!(2025-06-01 10:00 UTC);

	let revoked = registry
		.create_or_get_at(&resource, &owner, None, created)
		.await
		.expect("Create should succeed.");
	let revoked_token = revoked.token.expose().to_owned();

	registry
		.revoke_at(&resource, &owner, created + Duration::minutes(1))
		.await
		.expect("Revocation should succeed.");

	let expired = registry
		.create_or_get_at(
			&resource,
			&owner,
			Some(ShareTtl::After(Duration::minutes(5))),
			created + Duration::minutes(2),
		)
		.await
		.expect("Create after revocation should succeed.");
	let expired_token = expired.token.expose().to_owned();
	let probe = created + Duration::hours(1);

	for token in ["never-issued-token", &revoked_token, &expired_token] {
		let error = registry
			.resolve_at(token, probe)
			.await
			.expect_err("Unresolvable tokens should be rejected.");

		assert!(matches!(error, Error::NotFound));
		assert_eq!(error.to_string(), "Share link not found.");
	}
}

#[tokio::test]
async fn revocation_is_idempotent_and_owner_checked() {
	let resource = make_resource("resume-6");
	let owner = principal("user-1");
	let stranger = principal("user-2");
	let registry = build_test_registry(&resource, &owner);
	let now = macros::datetime!(2025-06-01 10:00 UTC);

	registry
		.create_or_get_at(&resource, &owner, None, now)
		.await
		.expect("Create should succeed.");

	assert!(matches!(
		registry.revoke_at(&resource, &stranger, now).await,
		Err(Error::NotOwner)
	));

	registry.revoke_at(&resource, &owner, now).await.expect("First revocation should succeed.");
	registry
		.revoke_at(&resource, &owner, now + Duration::minutes(1))
		.await
		.expect("Second revocation should be a no-op success.");

	let never_shared = make_resource("resume-7");
	let registry = build_test_registry(&never_shared, &owner);

	registry
		.revoke_at(&never_shared, &owner, now)
		.await
		.expect("Revoking a never-shared resource should be a no-op success.");
}

#[tokio::test]
async fn creation_requires_the_recorded_owner_and_an_existing_resource() {
	let resource = make_resource("resume-8");
	let owner = principal("user-1");
	let stranger = principal("user-2");
	let registry = build_test_registry(&resource, &owner);
	let now = macros::datetime!(2025-06-01 10:00 UTC);

	assert!(matches!(
		registry.create_or_get_at(&resource, &stranger, None, now).await,
		Err(Error::NotOwner)
	));
	assert!(matches!(
		registry.create_or_get_at(&make_resource("resume-ghost"), &owner, None, now).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn a_fresh_token_is_minted_after_revocation() {
	let resource = make_resource("resume-9");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let now = macros::datetime!(2025-06-01 10:00 UTC);

	let first = registry
		.create_or_get_at(&resource, &owner, None, now)
		.await
		.expect("Create should succeed.");

	registry
		.revoke_at(&resource, &owner, now + Duration::minutes(1))
		.await
		.expect("Revocation should succeed.");

	let second = registry
		.create_or_get_at(&resource, &owner, None, now + Duration::minutes(2))
		.await
		.expect("Create after revocation should succeed.");

	assert_ne!(first.token, second.token, "Revoked tokens are never reissued.");

	let resolved = registry
		.resolve_at(second.token.expose(), now + Duration::minutes(3))
		.await
		.expect("The fresh token should resolve.");

	assert_eq!(resolved, resource);
}

#[tokio::test]
async fn expired_links_are_superseded_by_new_creates() {
	let resource = make_resource("resume-10");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let created = macros::datetime!(2025-06-01 10:00 UTC);

	let short_lived = registry
		.create_or_get_at(&resource, &owner, Some(ShareTtl::After(Duration::hours(1))), created)
		.await
		.expect("Create should succeed.");
	let after_expiry = created + Duration::hours(2);
	let replacement = registry
		.create_or_get_at(&resource, &owner, None, after_expiry)
		.await
		.expect("Create after expiry should mint a replacement.");

	assert_ne!(short_lived.token, replacement.token);
	assert!(matches!(
		registry.resolve_at(short_lived.token.expose(), after_expiry).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn resolution_stamps_the_last_access_instant() {
	let resource = make_resource("resume-11");
	let owner = principal("user-1");
	let registry = build_test_registry(&resource, &owner);
	let created = macros::datetime!(2025-06-01 10:00 UTC);
	let accessed = created + Duration::minutes(42);

	let link = registry
		.create_or_get_at(&resource, &owner, None, created)
		.await
		.expect("Create should succeed.");

	assert!(link.last_accessed_at.is_none());

	registry
		.resolve_at(link.token.expose(), accessed)
		.await
		.expect("Resolution should succeed.");

	let stamped = registry
		.active_link_at(&resource, accessed)
		.await
		.expect("Active lookup should succeed.")
		.expect("The link should still be active.");

	assert_eq!(stamped.last_accessed_at, Some(accessed));
}
