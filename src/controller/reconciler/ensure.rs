//! # Ensure
//!
//! Create-if-absent for one managed sub-resource.
//!
//! An existing object is accepted as-is: drift is tolerated, never patched.
//! A created object carries a controller owner reference back to the
//! Wordpress object so the garbage collector removes it with its owner.

use crate::controller::reconciler::types::ReconcileError;
use crate::crd::{Tier, Wordpress};
use crate::observability;
use crate::store::{ManagedResource, ObjectKey, ResourceStore};
use kube::Resource;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What ensure found in the store
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureResult {
    /// The object was absent and has just been created under this key
    Created(ObjectKey),
    /// The object already existed, as currently stored
    Existing(ManagedResource),
}

/// Run a store call unless `token` is cancelled first
pub(crate) async fn cancellable<F, T>(token: &CancellationToken, call: F) -> Result<T, ReconcileError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(ReconcileError::Cancelled),
        output = call => Ok(output),
    }
}

/// Make sure `desired` exists, creating it when absent
///
/// Lookup failures other than "not found" and failed creates abort the pass.
pub async fn ensure(
    store: &dyn ResourceStore,
    owner: &Wordpress,
    tier: Tier,
    mut desired: ManagedResource,
    token: &CancellationToken,
) -> Result<EnsureResult, ReconcileError> {
    let kind = desired.kind();
    let key = desired.key().ok_or_else(|| {
        ReconcileError::InvalidObject(format!("{kind} template has no name or namespace"))
    })?;

    match cancellable(token, store.get_managed(kind, &key)).await? {
        Ok(existing) => {
            debug!(kind = kind.as_str(), key = %key, "ensure.existing");
            return Ok(EnsureResult::Existing(existing));
        }
        Err(e) if e.is_not_found() => {}
        Err(source) => {
            return Err(ReconcileError::Store {
                kind: kind.as_str(),
                key,
                source,
            })
        }
    }

    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        ReconcileError::InvalidObject(format!(
            "Wordpress {} has no uid, cannot own {kind} {key}",
            owner.meta().name.as_deref().unwrap_or("unknown")
        ))
    })?;
    desired.metadata_mut().owner_references = Some(vec![owner_ref]);

    cancellable(token, store.create_managed(&desired))
        .await?
        .map_err(|source| ReconcileError::CreateFailed {
            kind: kind.as_str(),
            key: key.clone(),
            source,
        })?;

    info!(kind = kind.as_str(), key = %key, tier = %tier, "Created {} {}", kind, key);
    observability::metrics::increment_subresources_created(tier, kind);
    Ok(EnsureResult::Created(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, ManagedKind};
    use crate::templates::{desired, fixtures, resource_key};

    #[tokio::test]
    async fn test_absent_object_is_created_with_owner() {
        let store = InMemoryStore::new();
        let owner = fixtures::wordpress("blog");
        let token = CancellationToken::new();

        let result = ensure(
            &store,
            &owner,
            Tier::Mysql,
            desired(ManagedKind::StorageClaim, Tier::Mysql, &owner),
            &token,
        )
        .await
        .unwrap();
        let key = resource_key(&owner, Tier::Mysql, ManagedKind::StorageClaim);
        assert_eq!(result, EnsureResult::Created(key.clone()));

        let created = store.get(ManagedKind::StorageClaim, &key).await.unwrap();
        let refs = created.metadata().owner_references.clone().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, "Wordpress");
        assert_eq!(refs[0].name, "blog");
        assert_eq!(refs[0].uid, owner.metadata.uid.clone().unwrap());
        assert_eq!(refs[0].controller, Some(true));
    }

    #[tokio::test]
    async fn test_existing_object_is_left_alone() {
        let store = InMemoryStore::new();
        let owner = fixtures::wordpress("blog");
        let token = CancellationToken::new();
        let mut drifted = desired(ManagedKind::Service, Tier::Wordpress, &owner);
        drifted.metadata_mut().labels = None;
        store.insert_managed(drifted.clone()).await;

        let result = ensure(
            &store,
            &owner,
            Tier::Wordpress,
            desired(ManagedKind::Service, Tier::Wordpress, &owner),
            &token,
        )
        .await
        .unwrap();

        assert_eq!(result, EnsureResult::Existing(drifted));
        assert!(store.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_owner_without_uid_is_rejected() {
        let store = InMemoryStore::new();
        let mut owner = fixtures::wordpress("blog");
        owner.metadata.uid = None;

        let err = ensure(
            &store,
            &owner,
            Tier::Mysql,
            desired(ManagedKind::StorageClaim, Tier::Mysql, &owner),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReconcileError::InvalidObject(_)));
        assert!(store.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_lookup() {
        let store = InMemoryStore::new();
        let owner = fixtures::wordpress("blog");
        let token = CancellationToken::new();
        token.cancel();

        let err = ensure(
            &store,
            &owner,
            Tier::Mysql,
            desired(ManagedKind::StorageClaim, Tier::Mysql, &owner),
            &token,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReconcileError::Cancelled));
        assert!(store.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_template_without_namespace_is_rejected() {
        let store = InMemoryStore::new();
        let owner = fixtures::wordpress("blog");
        let mut orphan = desired(ManagedKind::Deployment, Tier::Mysql, &owner);
        orphan.metadata_mut().namespace = None;

        let err = ensure(&store, &owner, Tier::Mysql, orphan, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ReconcileError::InvalidObject(message) => {
                assert_eq!(message, "Deployment template has no name or namespace");
            }
            other => panic!("expected an invalid object error, got {other:?}"),
        }
        assert!(store.created().await.is_empty());
    }
}
