//! In-process resource backend
//!
//! [`MemoryResource`] honors the same contract as the REST backend:
//! paginated and searchable listing, uploaded files stored as URLs,
//! `Conflict` for records with dependents and `NotFound` for missing ids.
//! Latency can be injected per search term to reproduce out-of-order
//! responses, and every call is counted.

use crate::service::ResourceService;
use async_trait::async_trait;
use bridgeline_core::schema::{FieldKind, Requirement};
use bridgeline_core::utils::sanitize_filename;
use bridgeline_core::{
    CollectionQuery, CollectionResult, Entity, Error, FieldErrors, Fields, FilePart, PageMeta,
    Payload, ResourceDef, Result,
};
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Host used for URLs of files uploaded to the in-memory backend
pub const UPLOAD_HOST: &str = "https://uploads.bridgeline.local";

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `list` calls
    pub list: usize,
    /// `get_one` calls
    pub get_one: usize,
    /// `create` calls
    pub create: usize,
    /// `update` calls
    pub update: usize,
    /// `remove` calls
    pub remove: usize,
}

#[derive(Debug, Default)]
struct Counters {
    list: AtomicUsize,
    get_one: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    remove: AtomicUsize,
}

#[derive(Debug, Default)]
struct Store {
    rows: IndexMap<String, Entity>,
    dependents: HashSet<String>,
    queries: Vec<CollectionQuery>,
    fail_next: Option<Error>,
}

/// Resource service that keeps records in memory
#[derive(Debug)]
pub struct MemoryResource {
    def: ResourceDef,
    store: Mutex<Store>,
    latency: Duration,
    search_latency: HashMap<String, Duration>,
    counters: Counters,
}

impl MemoryResource {
    /// Empty backend for one resource
    pub fn new(def: ResourceDef) -> Self {
        Self {
            def,
            store: Mutex::new(Store::default()),
            latency: Duration::ZERO,
            search_latency: HashMap::new(),
            counters: Counters::default(),
        }
    }

    /// Delay every call by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay `list` calls whose search term is `term`
    #[must_use]
    pub fn with_search_latency(mut self, term: impl Into<String>, latency: Duration) -> Self {
        self.search_latency.insert(term.into(), latency);
        self
    }

    /// Insert a record as-is, returning its id
    pub fn insert(&self, fields: Fields) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let mut entity = Entity::new(id.clone(), fields);
        let now = Utc::now();
        entity.created_at = Some(now);
        entity.updated_at = Some(now);
        self.store.lock().rows.insert(id.clone(), entity);
        id
    }

    /// Insert a stored entity under its own id
    pub fn insert_entity(&self, entity: Entity) {
        self.store.lock().rows.insert(entity.id.clone(), entity);
    }

    /// Make `remove(id)` fail with `Conflict`
    pub fn add_dependent(&self, id: impl Into<String>) {
        self.store.lock().dependents.insert(id.into());
    }

    /// Fail the next call of any kind with `error`
    pub fn fail_next(&self, error: Error) {
        self.store.lock().fail_next = Some(error);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.store.lock().rows.len()
    }

    /// Whether no records are stored
    pub fn is_empty(&self) -> bool {
        self.store.lock().rows.is_empty()
    }

    /// Stored record by id, without counting a call
    pub fn peek(&self, id: &str) -> Option<Entity> {
        self.store.lock().rows.get(id).cloned()
    }

    /// Calls made so far
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.counters.list.load(Ordering::SeqCst),
            get_one: self.counters.get_one.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            remove: self.counters.remove.load(Ordering::SeqCst),
        }
    }

    /// Every query passed to `list`, oldest first
    pub fn queries(&self) -> Vec<CollectionQuery> {
        self.store.lock().queries.clone()
    }

    async fn delay(&self, extra: Option<Duration>) {
        let total = self.latency + extra.unwrap_or(Duration::ZERO);
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }

    fn take_failure(&self) -> Result<()> {
        self.store.lock().fail_next.take().map_or(Ok(()), Err)
    }

    /// Reject payloads missing backend-required scalar fields
    fn check_required(&self, data: &Fields) -> Result<()> {
        let errors: FieldErrors = self
            .def
            .schema
            .fields()
            .iter()
            .filter(|field| field.requirement == Requirement::Required && !field.kind.is_file())
            .filter(|field| data.get(field.name).is_none_or(is_blank_value))
            .map(|field| (field.name.to_string(), format!("{} is required", field.label)))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(errors))
        }
    }

    /// Store uploaded parts as URLs on the matching schema fields
    fn apply_files(&self, fields: &mut Fields, data: &Fields, files: Vec<FilePart>) {
        let mut uploaded: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for part in files {
            let Some(field) = self.def.schema.file_fields().find(
                |field| matches!(field.kind, FieldKind::File { key, .. } if key == part.key),
            ) else {
                debug!(key = %part.key, "Ignoring file part with unknown key");
                continue;
            };
            let url = format!(
                "{UPLOAD_HOST}/{}/{}-{}",
                self.def.path,
                Uuid::new_v4().simple(),
                sanitize_filename(&part.file.file_name)
            );
            uploaded.entry(field.name).or_default().push(Value::String(url));
        }

        for (name, mut urls) in uploaded {
            let multiple = self
                .def
                .schema
                .field(name)
                .is_some_and(|field| matches!(field.kind, FieldKind::File { multiple: true, .. }));
            if multiple {
                let mut list = match data.get(name).or_else(|| fields.get(name)) {
                    Some(Value::Array(existing)) => existing.clone(),
                    _ => Vec::new(),
                };
                list.append(&mut urls);
                fields.insert(name.to_string(), Value::Array(list));
            } else if let Some(url) = urls.pop() {
                fields.insert(name.to_string(), url);
            }
        }
    }
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn matches_search(entity: &Entity, term: &str) -> bool {
    let term = term.to_lowercase();
    entity.fields.values().any(|value| match value {
        Value::String(text) => text.to_lowercase().contains(&term),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|item| item.to_lowercase().contains(&term)),
        _ => false,
    })
}

fn matches_filter(entity: &Entity, key: &str, expected: &str) -> bool {
    match entity.get(key) {
        Some(Value::String(text)) => text == expected,
        Some(Value::Bool(flag)) => flag.to_string() == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

#[async_trait]
impl ResourceService for MemoryResource {
    fn def(&self) -> &ResourceDef {
        &self.def
    }

    async fn list(&self, query: &CollectionQuery) -> Result<CollectionResult> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        self.store.lock().queries.push(query.clone());
        let extra = query
            .effective_search()
            .and_then(|term| self.search_latency.get(term).copied());
        self.delay(extra).await;
        self.take_failure()?;

        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let store = self.store.lock();
        let matching: Vec<&Entity> = store
            .rows
            .values()
            .rev()
            .filter(|entity| {
                query
                    .effective_search()
                    .is_none_or(|term| matches_search(entity, term))
            })
            .filter(|entity| {
                query
                    .filters
                    .iter()
                    .filter(|(_, value)| !value.trim().is_empty())
                    .all(|(key, value)| matches_filter(entity, key, value))
            })
            .collect();

        let total = matching.len() as u64;
        let skip = usize::try_from((page - 1) * limit).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(CollectionResult {
            data,
            meta: PageMeta::new(page, limit, total),
        })
    }

    async fn get_one(&self, id: &str) -> Result<Entity> {
        self.counters.get_one.fetch_add(1, Ordering::SeqCst);
        self.delay(None).await;
        self.take_failure()?;
        self.peek(id)
            .ok_or_else(|| Error::not_found(format!("{} {id}", self.def.label)))
    }

    async fn create(&self, payload: Payload) -> Result<Entity> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        self.delay(None).await;
        self.take_failure()?;

        let (data, files) = match payload {
            Payload::Json(data) => (data, Vec::new()),
            Payload::Multipart { data, files } => (data, files),
        };
        self.check_required(&data)?;

        let mut fields = data.clone();
        self.apply_files(&mut fields, &data, files);
        let id = self.insert(fields);
        debug!(resource = self.def.path, %id, "Created record in memory");
        self.peek(&id)
            .ok_or_else(|| Error::not_found(format!("{} {id}", self.def.label)))
    }

    async fn update(&self, id: &str, payload: Payload) -> Result<Entity> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        self.delay(None).await;
        self.take_failure()?;

        let (data, files) = match payload {
            Payload::Json(data) => (data, Vec::new()),
            Payload::Multipart { data, files } => (data, files),
        };

        let mut store = self.store.lock();
        let entity = store
            .rows
            .get_mut(id)
            .ok_or_else(|| Error::not_found(format!("{} {id}", self.def.label)))?;
        let mut fields = entity.fields.clone();
        for (key, value) in &data {
            fields.insert(key.clone(), value.clone());
        }
        self.apply_files(&mut fields, &data, files);
        entity.fields = fields;
        entity.updated_at = Some(Utc::now());
        Ok(entity.clone())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.counters.remove.fetch_add(1, Ordering::SeqCst);
        self.delay(None).await;
        self.take_failure()?;

        let mut store = self.store.lock();
        if store.dependents.contains(id) {
            return Err(Error::conflict(format!(
                "{} {id} is still referenced by other records",
                self.def.label
            )));
        }
        store
            .rows
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("{} {id}", self.def.label)))
    }
}
