//! HTTP client for the Bridgeline REST backend
//!
//! Every response is read as the `{success, data, message?, meta?}` envelope.
//! Non-success statuses are mapped onto [`Error`] variants, with field errors
//! taken from `errorSources` or `errors` when the backend provides them.

use crate::auth::AuthContext;
use bridgeline_core::config::ApiConfig;
use bridgeline_core::payload::{DATA_PART, FilePart, Payload};
use bridgeline_core::types::{ApiEnvelope, CollectionQuery, CollectionResult, Entity, PageMeta};
use bridgeline_core::utils::sanitize_filename;
use bridgeline_core::{Error, FieldErrors, Result};
use http::{Method, StatusCode};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Authenticated client for one backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpClient {
    /// Create a client from API settings and shared auth state
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the underlying client cannot be built.
    pub fn new(config: &ApiConfig, auth: AuthContext) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared auth state
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Absolute URL for a path relative to the base
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.auth.apply(self.client.request(method, self.url(path)))
    }

    /// `GET /{path}?page&limit&searchTerm&...` returning one page
    ///
    /// Pagination metadata missing from the response is derived from the
    /// query and the number of rows.
    pub async fn get_collection(&self, path: &str, query: &CollectionQuery) -> Result<CollectionResult> {
        let request = self.request(Method::GET, path).query(&query.to_pairs());
        let envelope: ApiEnvelope<Vec<Entity>> = self.execute(request, path).await?;

        let data = envelope.data.unwrap_or_default();
        let meta = envelope.meta.unwrap_or_else(|| {
            let before = u64::from(query.page.saturating_sub(1)) * u64::from(query.limit);
            PageMeta::new(query.page, query.limit, before + data.len() as u64)
        });
        Ok(CollectionResult { data, meta })
    }

    /// `GET /{path}` returning one entity
    pub async fn get_entity(&self, path: &str) -> Result<Entity> {
        let request = self.request(Method::GET, path);
        let envelope: ApiEnvelope<Entity> = self.execute(request, path).await?;
        envelope
            .data
            .ok_or_else(|| Error::not_found(path.to_string()))
    }

    /// Send a payload with `method` and return the stored entity
    pub async fn send_payload(&self, method: Method, path: &str, payload: Payload) -> Result<Entity> {
        let request = self.request(method, path);
        let request = match payload {
            Payload::Json(data) => request.json(&data),
            Payload::Multipart { data, files } => {
                request.multipart(multipart_form(&serde_json::to_string(&data)?, files)?)
            }
        };
        let envelope: ApiEnvelope<Entity> = self.execute(request, path).await?;
        envelope
            .data
            .ok_or_else(|| Error::server(200, "response did not include the stored record"))
    }

    /// `DELETE /{path}`
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, path);
        let _: ApiEnvelope<Value> = self.execute(request, path).await?;
        Ok(())
    }

    async fn execute<T>(&self, request: RequestBuilder, path: &str) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "Request failed");
            Error::network(format!("request to /{} failed: {e}", path.trim_start_matches('/')))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let error = error_from_response(status, &body, path);
            warn!(path, status = status.as_u16(), error = %error, "Backend rejected request");
            return Err(error);
        }

        if body.trim().is_empty() {
            return Ok(ApiEnvelope {
                success: true,
                data: None,
                message: None,
                meta: None,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| Error::server(status.as_u16(), format!("malformed response: {e}")))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string());
            return Err(Error::server(status.as_u16(), message));
        }

        debug!(path, status = status.as_u16(), "Request succeeded");
        Ok(envelope)
    }
}

/// Build the multipart body: JSON under `data`, then one part per file
fn multipart_form(data_json: &str, files: Vec<FilePart>) -> Result<Form> {
    let mut form = Form::new().text(DATA_PART, data_json.to_string());
    for FilePart { key, file } in files {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(sanitize_filename(&file.file_name))
            .mime_str(&file.mime)
            .map_err(|e| Error::field(key.clone(), format!("invalid file type '{}': {e}", file.mime)))?;
        form = form.part(key, part);
    }
    Ok(form)
}

/// Map a non-success response onto the error taxonomy
pub fn error_from_response(status: StatusCode, body: &str, path: &str) -> Error {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| status.canonical_reason().map(ToString::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    let field_errors = parsed.as_ref().map(extract_field_errors).unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::auth(status.as_u16(), message),
        StatusCode::NOT_FOUND => Error::not_found(path.trim_start_matches('/').to_string()),
        StatusCode::CONFLICT => Error::conflict(message),
        _ if !field_errors.is_empty() => Error::validation(field_errors),
        _ => Error::server(status.as_u16(), message),
    }
}

/// Read `errorSources: [{path, message}]` or `errors: {field: message}`
pub fn extract_field_errors(body: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(sources) = body.get("errorSources").and_then(Value::as_array) {
        for source in sources {
            let path = source.get("path").and_then(Value::as_str).unwrap_or_default();
            let message = source.get("message").and_then(Value::as_str).unwrap_or_default();
            if !path.is_empty() && !message.is_empty() {
                errors
                    .entry(path.to_string())
                    .or_insert_with(|| message.to_string());
            }
        }
    }

    if let Some(map) = body.get("errors").and_then(Value::as_object) {
        for (field, value) in map {
            let message = match value {
                Value::String(message) => Some(message.as_str()),
                Value::Object(inner) => inner.get("message").and_then(Value::as_str),
                _ => None,
            };
            if let Some(message) = message {
                errors
                    .entry(field.clone())
                    .or_insert_with(|| message.to_string());
            }
        }
    }

    errors
}
