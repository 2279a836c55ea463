//! The resource service contract

use async_trait::async_trait;
use bridgeline_core::{CollectionQuery, CollectionResult, Entity, Payload, ResourceDef, Result};
use std::sync::Arc;

/// CRUD operations for one managed resource
///
/// Implementations make exactly one attempt per call and return every
/// failure to the caller; retries and notifications are the caller's job.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Definition of the resource this service manages
    fn def(&self) -> &ResourceDef;

    /// Fetch one page of the collection
    ///
    /// Fails with `Network` or `Server`.
    async fn list(&self, query: &CollectionQuery) -> Result<CollectionResult>;

    /// Fetch a single entity
    ///
    /// Fails with `NotFound` when the id does not exist.
    async fn get_one(&self, id: &str) -> Result<Entity>;

    /// Create an entity
    ///
    /// Fails with `Validation` when the backend rejects the payload shape.
    async fn create(&self, payload: Payload) -> Result<Entity>;

    /// Update an entity
    ///
    /// Fails like [`ResourceService::create`], plus `NotFound`.
    async fn update(&self, id: &str, payload: Payload) -> Result<Entity>;

    /// Delete an entity
    ///
    /// Fails with `Conflict` when other records depend on it and `NotFound`
    /// when it is already gone.
    async fn remove(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<T: ResourceService + ?Sized> ResourceService for Arc<T> {
    fn def(&self) -> &ResourceDef {
        (**self).def()
    }

    async fn list(&self, query: &CollectionQuery) -> Result<CollectionResult> {
        (**self).list(query).await
    }

    async fn get_one(&self, id: &str) -> Result<Entity> {
        (**self).get_one(id).await
    }

    async fn create(&self, payload: Payload) -> Result<Entity> {
        (**self).create(payload).await
    }

    async fn update(&self, id: &str, payload: Payload) -> Result<Entity> {
        (**self).update(id, payload).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        (**self).remove(id).await
    }
}
