//! Entity, collection and envelope types shared by every managed resource

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of an entity, in backend order
pub type Fields = Map<String, Value>;

/// A single record of a managed resource
///
/// On the wire an entity is a flat JSON object. The identifier is read from
/// `id` or `_id` and the timestamps from `createdAt`/`updatedAt`; everything
/// else is kept in [`Entity::fields`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Fields", into = "Fields")]
pub struct Entity {
    /// Opaque server-assigned identifier
    pub id: String,

    /// All remaining fields
    pub fields: Fields,

    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create an entity without timestamps
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            created_at: None,
            updated_at: None,
        }
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field, if it is a string
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Boolean value of a field; absent or non-boolean reads as `false`
    pub fn flag(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Short label for tables and messages
    pub fn display_name(&self) -> String {
        ["title", "name", "question", "email"]
            .iter()
            .find_map(|key| self.str_field(key))
            .map_or_else(|| self.id.clone(), ToString::to_string)
    }
}

impl TryFrom<Fields> for Entity {
    type Error = String;

    fn try_from(mut fields: Fields) -> Result<Self, Self::Error> {
        let id = match fields.shift_remove("_id").or_else(|| fields.shift_remove("id")) {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            Some(other) => return Err(format!("entity id must be a string, got {other}")),
            None => return Err("entity is missing an id".to_string()),
        };
        // a payload may carry both keys; keep only one identifier
        fields.shift_remove("id");

        let created_at = take_timestamp(&mut fields, "createdAt")?;
        let updated_at = take_timestamp(&mut fields, "updatedAt")?;

        Ok(Self {
            id,
            fields,
            created_at,
            updated_at,
        })
    }
}

impl From<Entity> for Fields {
    fn from(entity: Entity) -> Self {
        let mut map = Self::new();
        map.insert("id".to_string(), Value::String(entity.id));
        map.extend(entity.fields);
        if let Some(created_at) = entity.created_at {
            map.insert("createdAt".to_string(), Value::String(created_at.to_rfc3339()));
        }
        if let Some(updated_at) = entity.updated_at {
            map.insert("updatedAt".to_string(), Value::String(updated_at.to_rfc3339()));
        }
        map
    }
}

fn take_timestamp(fields: &mut Fields, key: &str) -> Result<Option<DateTime<Utc>>, String> {
    match fields.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| format!("invalid {key} timestamp '{raw}': {e}")),
        Some(other) => Err(format!("{key} must be an RFC 3339 string, got {other}")),
    }
}

/// Paginated, searchable, filterable collection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionQuery {
    /// Page number (1-based)
    pub page: u32,

    /// Items per page
    pub limit: u32,

    /// Free-text search term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,

    /// Exact-match filters
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filters: IndexMap<String, String>,
}

impl CollectionQuery {
    /// Create a query for the first page
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            search_term: None,
            filters: IndexMap::new(),
        }
    }

    /// Set the page (values below 1 become 1)
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the search term
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Search term with surrounding whitespace removed, if non-empty
    pub fn effective_search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Query-string pairs in backend order: `page`, `limit`, `searchTerm`, filters
    ///
    /// Empty search terms and empty filter values are omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("limit".to_string(), self.limit.max(1).to_string()),
        ];
        if let Some(term) = self.effective_search() {
            pairs.push(("searchTerm".to_string(), term.to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        pairs
    }
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Pagination metadata returned with a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page (1-based)
    pub page: u32,

    /// Items per page
    pub limit: u32,

    /// Total number of items
    pub total: u64,

    /// Total number of pages, `ceil(total / limit)`
    pub total_page: u32,
}

impl PageMeta {
    /// Build metadata, deriving `total_page` from `total` and `limit`
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_page: total_pages(total, limit),
        }
    }

    /// Highest page a caller may request; never below 1
    pub fn last_page(&self) -> u32 {
        self.total_page.max(1)
    }

    /// Clamp a requested page to `[1, last_page]`
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.last_page())
    }

    /// Whether there's a next page
    pub const fn has_next(&self) -> bool {
        self.page < self.total_page
    }

    /// Whether there's a previous page
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// `ceil(total / limit)`, treating a zero limit as 1
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
}

/// One page of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionResult {
    /// Rows in backend order
    pub data: Vec<Entity>,

    /// Pagination metadata
    pub meta: PageMeta,
}

impl CollectionResult {
    /// Whether the page holds no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Response envelope used by every backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Success status
    #[serde(default = "default_success")]
    pub success: bool,

    /// Payload
    pub data: Option<T>,

    /// Optional message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Pagination info (for collection responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

const fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Create a successful envelope
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: None,
        }
    }

    /// Create a successful collection envelope
    pub const fn paginated(data: T, meta: PageMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(meta),
        }
    }
}
