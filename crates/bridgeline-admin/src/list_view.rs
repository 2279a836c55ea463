//! Paginated, searchable list of one resource
//!
//! Every fetch takes a sequence number and a cancellation token. Starting a
//! fetch cancels the one before it, and a response is only applied while
//! its sequence number is still the latest, so a slow early request can
//! never overwrite a later one. On failure the last good rows stay visible.

use crate::debounce::Debouncer;
use crate::deletion::DeletionConfirmation;
use crate::notify::Notifier;
use crate::sequence::FetchSequencer;
use bridgeline_client::ResourceService;
use bridgeline_core::config::ListConfig;
use bridgeline_core::{CollectionQuery, Entity, Error, PageMeta, Payload, ResourceDef, Result};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    /// Nothing fetched yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The latest fetch succeeded
    Loaded,
    /// The latest fetch failed; rows are from the last success
    Errored,
}

/// Read-only copy of the list state
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    /// Lifecycle state
    pub status: ListStatus,
    /// Query of the current or next fetch
    pub query: CollectionQuery,
    /// Rows of the last successful fetch
    pub rows: Vec<Entity>,
    /// Pagination of the last successful fetch
    pub meta: Option<PageMeta>,
    /// Message of the latest failure
    pub error: Option<String>,
    /// Id awaiting delete confirmation
    pub pending_delete: Option<String>,
}

#[derive(Debug)]
struct ListState {
    status: ListStatus,
    query: CollectionQuery,
    rows: Vec<Entity>,
    meta: Option<PageMeta>,
    error: Option<String>,
    in_flight: Option<CancellationToken>,
    deletion: DeletionConfirmation,
}

struct Shared {
    service: Arc<dyn ResourceService>,
    state: Mutex<ListState>,
    sequencer: FetchSequencer,
    notifier: Notifier,
    lifecycle: CancellationToken,
}

/// List controller for one resource
///
/// Dropping the view cancels the pending search and any in-flight fetch.
pub struct ListView {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("resource", &self.shared.service.def().path)
            .field("state", &*self.shared.state.lock())
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl ListView {
    /// Create an idle view; call [`ListView::refresh`] to load the first page
    pub fn new(service: Arc<dyn ResourceService>, config: &ListConfig, notifier: Notifier) -> Self {
        Self::with_debounce(
            service,
            config.page_size,
            Duration::from_millis(config.debounce_ms),
            notifier,
        )
    }

    /// Create an idle view with explicit page size and search debounce
    pub fn with_debounce(
        service: Arc<dyn ResourceService>,
        page_size: u32,
        debounce: Duration,
        notifier: Notifier,
    ) -> Self {
        let state = ListState {
            status: ListStatus::Idle,
            query: CollectionQuery::new(page_size),
            rows: Vec::new(),
            meta: None,
            error: None,
            in_flight: None,
            deletion: DeletionConfirmation::new(),
        };
        Self {
            shared: Arc::new(Shared {
                service,
                state: Mutex::new(state),
                sequencer: FetchSequencer::new(),
                notifier,
                lifecycle: CancellationToken::new(),
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Definition of the listed resource
    pub fn def(&self) -> &ResourceDef {
        self.shared.service.def()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.shared.state.lock();
        ListSnapshot {
            status: state.status,
            query: state.query.clone(),
            rows: state.rows.clone(),
            meta: state.meta,
            error: state.error.clone(),
            pending_delete: state.deletion.pending().map(ToString::to_string),
        }
    }

    /// Current rows
    pub fn rows(&self) -> Vec<Entity> {
        self.shared.state.lock().rows.clone()
    }

    /// Current lifecycle state
    pub fn status(&self) -> ListStatus {
        self.shared.state.lock().status
    }

    /// Last issued fetch sequence number
    pub fn latest_sequence(&self) -> u64 {
        self.shared.sequencer.latest()
    }

    /// Update the search text and fetch page 1 once typing pauses
    ///
    /// Only the last term set within the debounce window is fetched.
    pub fn set_search_term(&self, term: impl Into<String>) {
        {
            let mut state = self.shared.state.lock();
            state.query.search_term = Some(term.into());
            state.query.page = 1;
        }
        let shared = self.shared.clone();
        self.debouncer.schedule(async move {
            // failures are recorded in the state and the notifier
            let _ = Shared::fetch(&shared).await;
        });
    }

    /// Wait for a scheduled search fetch to finish
    pub async fn settle(&self) {
        self.debouncer.flush().await;
    }

    /// Whether a search fetch is scheduled or running
    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Go to `page`, clamped to the known page range, and fetch it
    pub async fn set_page(&self, page: u32) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            let clamped = state
                .meta
                .map_or_else(|| page.max(1), |meta| meta.clamp_page(page));
            if clamped != page {
                debug!(requested = page, clamped, "Clamped page request");
            }
            state.query.page = clamped;
        }
        self.fetch_now().await
    }

    /// Change the page size and fetch page 1
    pub async fn set_limit(&self, limit: u32) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            state.query.limit = limit.max(1);
            state.query.page = 1;
        }
        self.fetch_now().await
    }

    /// Set an exact-match filter and fetch page 1
    pub async fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            state.query.filters.insert(key.into(), value.into());
            state.query.page = 1;
        }
        self.fetch_now().await
    }

    /// Remove a filter and fetch page 1
    pub async fn clear_filter(&self, key: &str) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            state.query.filters.shift_remove(key);
            state.query.page = 1;
        }
        self.fetch_now().await
    }

    /// Fetch the current query immediately
    pub async fn refresh(&self) -> Result<()> {
        self.fetch_now().await
    }

    async fn fetch_now(&self) -> Result<()> {
        // a direct fetch supersedes a search that has not fired yet
        self.debouncer.cancel();
        Shared::fetch(&self.shared).await
    }

    /// Ask to delete `id`; nothing is sent until [`ListView::confirm_delete`]
    pub fn request_delete(&self, id: impl Into<String>) {
        self.shared.state.lock().deletion.request(id);
    }

    /// Abandon the pending deletion without contacting the backend
    pub fn cancel_delete(&self) {
        self.shared.state.lock().deletion.cancel();
    }

    /// Id awaiting confirmation
    pub fn pending_delete(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .deletion
            .pending()
            .map(ToString::to_string)
    }

    /// Delete the pending entity and re-fetch the list
    ///
    /// Does nothing when no deletion is pending. On failure the rows are left
    /// untouched, the dialog closes and one error notification is raised.
    pub async fn confirm_delete(&self) -> Result<()> {
        let Some(id) = self.shared.state.lock().deletion.confirm() else {
            return Ok(());
        };
        let label = self.def().label;

        match self.shared.service.remove(&id).await {
            Ok(()) => {
                info!(resource = self.def().path, %id, "Deleted");
                self.shared.notifier.success(format!("{label} deleted"));
                self.refresh().await
            }
            Err(e) => {
                warn!(resource = self.def().path, %id, error = %e, "Delete failed");
                self.shared.notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Flip a boolean column of one row and re-fetch the list
    pub async fn toggle_flag(&self, id: &str, field: &str) -> Result<()> {
        let current = self
            .shared
            .state
            .lock()
            .rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.flag(field))
            .ok_or_else(|| Error::not_found(format!("{} {id}", self.def().label)))?;
        self.toggle_flag_with(id, field, current).await
    }

    /// Flip a boolean column whose current value the caller already knows
    ///
    /// The row does not have to be on the loaded page.
    pub async fn toggle_flag_with(&self, id: &str, field: &str, current: bool) -> Result<()> {
        if !self.def().can_toggle(field) {
            return Err(Error::field(field, format!("{field} cannot be toggled")));
        }
        let payload = Payload::single(field, Value::Bool(!current));
        match self.shared.service.update(id, payload).await {
            Ok(_) => {
                info!(resource = self.def().path, id, field, value = !current, "Toggled flag");
                self.shared
                    .notifier
                    .success(format!("{} updated", self.def().label));
                self.refresh().await
            }
            Err(e) => {
                self.shared.notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Cancel the pending search and any in-flight fetch
    pub fn close(&self) {
        self.debouncer.cancel();
        self.shared.lifecycle.cancel();
    }
}

impl Drop for ListView {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    /// Fetch the current query; superseded fetches resolve to `Ok(())`
    async fn fetch(shared: &Arc<Self>) -> Result<()> {
        if shared.lifecycle.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let token = shared.lifecycle.child_token();
        // numbering and token installation happen under one lock so the
        // latest sequence always owns the installed token
        let (sequence, query) = {
            let mut state = shared.state.lock();
            let sequence = shared.sequencer.next();
            if let Some(previous) = state.in_flight.replace(token.clone()) {
                previous.cancel();
            }
            state.status = ListStatus::Loading;
            (sequence, state.query.clone())
        };
        debug!(
            resource = shared.service.def().path,
            sequence,
            page = query.page,
            search = query.effective_search(),
            "Dispatching fetch"
        );

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            result = shared.service.list(&query) => result,
        };

        let mut state = shared.state.lock();
        if !shared.sequencer.is_latest(sequence) || matches!(result, Err(Error::Cancelled)) {
            debug!(sequence, latest = shared.sequencer.latest(), "Discarding superseded response");
            return Ok(());
        }
        state.in_flight = None;

        match result {
            Ok(page) => {
                state.rows = page.data;
                state.meta = Some(page.meta);
                state.status = ListStatus::Loaded;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(resource = shared.service.def().path, sequence, error = %e, "Fetch failed");
                state.status = ListStatus::Errored;
                state.error = Some(e.user_message());
                drop(state);
                shared.notifier.error(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use bridgeline_client::MemoryResource;
    use bridgeline_core::{Fields, ResourceKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn faqs(count: usize) -> Arc<MemoryResource> {
        let memory = MemoryResource::new(ResourceKind::Faq.def());
        for i in 0..count {
            let mut fields = Fields::new();
            fields.insert("question".to_string(), json!(format!("Question {i}")));
            fields.insert("answer".to_string(), json!("Yes"));
            memory.insert(fields);
        }
        Arc::new(memory)
    }

    fn view(memory: &Arc<MemoryResource>) -> ListView {
        ListView::with_debounce(memory.clone(), 10, Duration::from_millis(500), Notifier::new())
    }

    #[tokio::test]
    async fn test_refresh_loads_rows_and_meta() {
        let memory = faqs(12);
        let list = view(&memory);
        assert_eq!(list.status(), ListStatus::Idle);

        list.refresh().await.unwrap();
        let snapshot = list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Loaded);
        assert_eq!(snapshot.rows.len(), 10);
        assert_eq!(snapshot.meta.unwrap().total_page, 2);
    }

    #[tokio::test]
    async fn test_error_keeps_last_good_rows() {
        let memory = faqs(3);
        let notifier = Notifier::new();
        let list = ListView::with_debounce(memory.clone(), 10, Duration::from_millis(500), notifier.clone());
        list.refresh().await.unwrap();

        memory.fail_next(Error::server(500, "Database unavailable"));
        assert!(list.refresh().await.is_err());

        let snapshot = list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Errored);
        assert_eq!(snapshot.rows.len(), 3);
        assert_eq!(snapshot.error.as_deref(), Some("Database unavailable"));
        assert_eq!(notifier.last().unwrap().message, "Database unavailable");
    }

    #[tokio::test]
    async fn test_filters_reset_page() {
        let memory = faqs(25);
        let list = view(&memory);
        list.refresh().await.unwrap();
        list.set_page(3).await.unwrap();
        assert_eq!(list.snapshot().query.page, 3);

        list.set_filter("answer", "Yes").await.unwrap();
        assert_eq!(list.snapshot().query.page, 1);
        list.clear_filter("answer").await.unwrap();
        assert!(list.snapshot().query.filters.is_empty());
    }

    #[tokio::test]
    async fn test_set_limit_resets_page() {
        let memory = faqs(25);
        let list = view(&memory);
        list.set_page(2).await.unwrap();
        list.set_limit(5).await.unwrap();

        let snapshot = list.snapshot();
        assert_eq!(snapshot.query.page, 1);
        assert_eq!(snapshot.rows.len(), 5);
        assert_eq!(snapshot.meta.unwrap().total_page, 5);
    }

    #[tokio::test]
    async fn test_toggle_rejects_unknown_flag() {
        let memory = faqs(1);
        let list = view(&memory);
        list.refresh().await.unwrap();
        let id = list.rows()[0].id.clone();

        let err = list.toggle_flag(&id, "question").await.unwrap_err();
        assert!(err.field_errors().is_some());
        assert_eq!(memory.calls().update, 0);
    }

    #[tokio::test]
    async fn test_toggle_flips_flag_and_refetches() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Product.def()));
        let id = featured_product(&memory, false);
        let notifier = Notifier::new();
        let list = ListView::with_debounce(memory.clone(), 10, Duration::from_millis(500), notifier.clone());
        list.refresh().await.unwrap();
        let lists_before = memory.calls().list;

        list.toggle_flag(&id, "isFeatured").await.unwrap();

        assert_eq!(memory.calls().update, 1);
        assert!(memory.calls().list > lists_before);
        assert!(memory.peek(&id).unwrap().flag("isFeatured"));
        assert!(list.rows()[0].flag("isFeatured"));
        assert_eq!(notifier.entries().len(), 1);
        assert_eq!(notifier.last().unwrap().level, crate::notify::Level::Success);

        list.toggle_flag(&id, "isFeatured").await.unwrap();
        assert!(!list.rows()[0].flag("isFeatured"));
    }

    fn featured_product(memory: &MemoryResource, featured: bool) -> String {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Teddy Bear"));
        fields.insert("category".to_string(), json!("Soft Toy"));
        fields.insert("isFeatured".to_string(), json!(featured));
        memory.insert(fields)
    }

    #[tokio::test]
    async fn test_toggle_with_known_value_skips_loaded_rows() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Product.def()));
        let id = featured_product(&memory, true);
        let list = view(&memory);

        // nothing loaded yet, so the row cannot be looked up locally
        assert!(matches!(
            list.toggle_flag(&id, "isFeatured").await,
            Err(Error::NotFound { .. })
        ));
        list.toggle_flag_with(&id, "isFeatured", true).await.unwrap();

        assert_eq!(memory.calls().update, 1);
        assert!(!memory.peek(&id).unwrap().flag("isFeatured"));
        assert_eq!(list.status(), ListStatus::Loaded);
    }

    #[tokio::test]
    async fn test_toggle_rejects_fields_without_toggle() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Product.def()));
        let id = featured_product(&memory, false);
        let list = view(&memory);

        assert!(list.toggle_flag_with(&id, "name", false).await.is_err());
        assert_eq!(memory.calls().update, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_refreshes_always_settle_loaded() {
        let memory = faqs(3);
        let list = Arc::new(view(&memory));
        for _ in 0..50 {
            let first = tokio::spawn({
                let list = list.clone();
                async move { list.refresh().await }
            });
            let second = tokio::spawn({
                let list = list.clone();
                async move { list.refresh().await }
            });
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();
            assert_eq!(list.status(), ListStatus::Loaded);
            assert_eq!(list.rows().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_closed_view_does_not_fetch() {
        let memory = faqs(1);
        let list = view(&memory);
        list.close();
        assert!(matches!(list.refresh().await, Err(Error::Cancelled)));
        assert_eq!(memory.calls().list, 0);
    }
}
