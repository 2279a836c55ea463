//! REST implementation of [`ResourceService`]

use crate::api_client::HttpClient;
use crate::service::ResourceService;
use async_trait::async_trait;
use bridgeline_core::{
    CollectionQuery, CollectionResult, Entity, Payload, ResourceDef, Result, UpdateMethod,
};
use http::Method;
use tracing::{debug, info, instrument};

/// Resource service backed by the REST API
///
/// Maps the operations onto `GET /{path}`, `GET /{path}/{id}`,
/// `POST /{path}`, `PATCH|PUT /{path}/{id}` and `DELETE /{path}/{id}`.
#[derive(Debug, Clone)]
pub struct RestResource {
    http: HttpClient,
    def: ResourceDef,
}

impl RestResource {
    /// Create a service for one resource
    pub const fn new(http: HttpClient, def: ResourceDef) -> Self {
        Self { http, def }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.def.path, urlencoding::encode(id))
    }

    const fn update_method(&self) -> Method {
        match self.def.update_method {
            UpdateMethod::Patch => Method::PATCH,
            UpdateMethod::Put => Method::PUT,
        }
    }
}

#[async_trait]
impl ResourceService for RestResource {
    fn def(&self) -> &ResourceDef {
        &self.def
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &CollectionQuery) -> Result<CollectionResult> {
        debug!(page = query.page, limit = query.limit, "Fetching collection");
        self.http.get_collection(self.def.path, query).await
    }

    #[instrument(skip(self))]
    async fn get_one(&self, id: &str) -> Result<Entity> {
        self.http.get_entity(&self.item_path(id)).await
    }

    #[instrument(skip(self, payload))]
    async fn create(&self, payload: Payload) -> Result<Entity> {
        let entity = self
            .http
            .send_payload(Method::POST, self.def.path, payload)
            .await?;
        info!(id = %entity.id, "Created {}", self.def.label);
        Ok(entity)
    }

    #[instrument(skip(self, payload))]
    async fn update(&self, id: &str, payload: Payload) -> Result<Entity> {
        let entity = self
            .http
            .send_payload(self.update_method(), &self.item_path(id), payload)
            .await?;
        info!(id = %entity.id, "Updated {}", self.def.label);
        Ok(entity)
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<()> {
        self.http.delete(&self.item_path(id)).await?;
        info!(id, "Deleted {}", self.def.label);
        Ok(())
    }
}
