//! Read-only view of one entity

use crate::notify::Notifier;
use bridgeline_client::ResourceService;
use bridgeline_core::schema::FieldKind;
use bridgeline_core::{Entity, ResourceDef, Result, TrustedHtml};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of a detail view
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Fetch in flight or not started
    Loading,
    /// Fetch failed
    Error(String),
    /// Entity available
    Loaded(Entity),
}

/// Display form of one field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DisplayValue {
    /// Not set
    Empty,
    /// Plain text, numbers and dates
    Text(String),
    /// Sanitized rich text
    Html(TrustedHtml),
    /// Checkbox
    Flag(bool),
    /// Tags
    List(Vec<String>),
    /// Uploaded file URLs
    Files(Vec<String>),
    /// Nested object, pretty-printed
    Json(String),
}

/// One row of the projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    /// Backend field name
    pub name: &'static str,
    /// Human-readable label
    pub label: &'static str,
    /// Display value
    pub value: DisplayValue,
}

/// Project an entity onto its schema, in field order
///
/// Rich text is cleaned again here so markup written by other clients is
/// never displayed raw. Password fields are never shown.
pub fn project(def: &ResourceDef, entity: &Entity) -> Vec<DisplayField> {
    def.schema
        .fields()
        .iter()
        .filter(|field| field.kind != FieldKind::Password)
        .map(|field| DisplayField {
            name: field.name,
            label: field.label,
            value: display_value(field.kind, entity.get(field.name)),
        })
        .collect()
}

fn display_value(kind: FieldKind, value: Option<&Value>) -> DisplayValue {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return DisplayValue::Empty;
    };
    match (kind, value) {
        (FieldKind::RichText, Value::String(html)) => DisplayValue::Html(TrustedHtml::sanitize(html)),
        (FieldKind::File { .. }, Value::String(url)) => DisplayValue::Files(vec![url.clone()]),
        (FieldKind::File { .. }, Value::Array(urls)) => DisplayValue::Files(strings(urls)),
        (FieldKind::Tags, Value::Array(items)) => DisplayValue::List(strings(items)),
        (_, Value::Bool(flag)) => DisplayValue::Flag(*flag),
        (_, Value::String(text)) => DisplayValue::Text(text.clone()),
        (_, Value::Number(n)) => DisplayValue::Text(n.to_string()),
        (_, other) => DisplayValue::Json(
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        ),
    }
}

fn strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(ToString::to_string)
        .collect()
}

/// Detail controller for one entity
pub struct DetailView {
    service: Arc<dyn ResourceService>,
    id: String,
    state: Mutex<DetailState>,
    notifier: Notifier,
}

impl std::fmt::Debug for DetailView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailView")
            .field("resource", &self.service.def().path)
            .field("id", &self.id)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl DetailView {
    /// Create a view in the `Loading` state
    pub fn new(service: Arc<dyn ResourceService>, id: impl Into<String>, notifier: Notifier) -> Self {
        Self {
            service,
            id: id.into(),
            state: Mutex::new(DetailState::Loading),
            notifier,
        }
    }

    /// Fetch the entity
    pub async fn load(&self) -> Result<()> {
        *self.state.lock() = DetailState::Loading;
        debug!(resource = self.service.def().path, id = %self.id, "Loading detail");

        match self.service.get_one(&self.id).await {
            Ok(entity) => {
                *self.state.lock() = DetailState::Loaded(entity);
                Ok(())
            }
            Err(e) => {
                let message = e.user_message();
                self.notifier.error(message.clone());
                *self.state.lock() = DetailState::Error(message);
                Err(e)
            }
        }
    }

    /// Current state
    pub fn state(&self) -> DetailState {
        self.state.lock().clone()
    }

    /// Projection of the loaded entity
    pub fn fields(&self) -> Option<Vec<DisplayField>> {
        match &*self.state.lock() {
            DetailState::Loaded(entity) => Some(project(self.service.def(), entity)),
            _ => None,
        }
    }
}
