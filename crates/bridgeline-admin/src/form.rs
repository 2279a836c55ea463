//! Create and edit forms
//!
//! A [`MutationForm`] owns a draft, validates it against the resource schema
//! and submits one multipart payload at a time. Validation failures, local
//! or from the backend, are kept per field; any other failure raises a
//! single notification.

use crate::notify::Notifier;
use crate::rich_text::RichTextEditor;
use bridgeline_client::ResourceService;
use bridgeline_core::config::UploadConfig;
use bridgeline_core::payload::{self, Payload};
use bridgeline_core::{
    Draft, Entity, Error, FieldErrors, FieldInput, FormMode, LocalFile, ResourceDef, Result,
    UploadRef,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// What the form submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    /// A new entity
    Create,
    /// An existing entity
    Edit {
        /// Id of the entity being edited
        id: String,
    },
}

impl FormTarget {
    /// Validation mode for this target
    pub const fn mode(&self) -> FormMode {
        match self {
            Self::Create => FormMode::Create,
            Self::Edit { .. } => FormMode::Edit,
        }
    }
}

#[derive(Debug, Default)]
struct FormState {
    draft: Draft,
    original: Option<Entity>,
    field_errors: FieldErrors,
}

/// Holds the in-flight flag for the duration of one submission
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Create/edit form for one resource
pub struct MutationForm {
    service: Arc<dyn ResourceService>,
    target: FormTarget,
    uploads: UploadConfig,
    notifier: Notifier,
    state: Arc<Mutex<FormState>>,
    submitting: AtomicBool,
}

impl std::fmt::Debug for MutationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationForm")
            .field("resource", &self.service.def().path)
            .field("target", &self.target)
            .field("state", &*self.state.lock())
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

impl MutationForm {
    /// Empty form for a new entity
    pub fn create(service: Arc<dyn ResourceService>, uploads: UploadConfig, notifier: Notifier) -> Self {
        Self {
            service,
            target: FormTarget::Create,
            uploads,
            notifier,
            state: Arc::new(Mutex::new(FormState::default())),
            submitting: AtomicBool::new(false),
        }
    }

    /// Form seeded from a stored entity
    ///
    /// File fields start out holding the entity's remote URLs.
    pub fn edit_entity(
        service: Arc<dyn ResourceService>,
        entity: Entity,
        uploads: UploadConfig,
        notifier: Notifier,
    ) -> Self {
        let draft = service.def().schema.draft_from(&entity);
        Self {
            target: FormTarget::Edit {
                id: entity.id.clone(),
            },
            service,
            uploads,
            notifier,
            state: Arc::new(Mutex::new(FormState {
                draft,
                original: Some(entity),
                field_errors: FieldErrors::new(),
            })),
            submitting: AtomicBool::new(false),
        }
    }

    /// Fetch an entity and open an edit form for it
    ///
    /// # Errors
    ///
    /// Returns the fetch error after raising a notification.
    pub async fn edit(
        service: Arc<dyn ResourceService>,
        id: &str,
        uploads: UploadConfig,
        notifier: Notifier,
    ) -> Result<Self> {
        match service.get_one(id).await {
            Ok(entity) => Ok(Self::edit_entity(service, entity, uploads, notifier)),
            Err(e) => {
                notifier.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Definition of the edited resource
    pub fn def(&self) -> &ResourceDef {
        self.service.def()
    }

    /// What the form submits
    pub const fn target(&self) -> &FormTarget {
        &self.target
    }

    /// Copy of the current draft
    pub fn draft(&self) -> Draft {
        self.state.lock().draft.clone()
    }

    /// Current value of one field
    pub fn value(&self, field: &str) -> Option<FieldInput> {
        self.state.lock().draft.get(field).cloned()
    }

    /// Set a field value and clear its error
    pub fn set(&self, field: impl Into<String>, value: impl Into<FieldInput>) {
        let field = field.into();
        let mut state = self.state.lock();
        state.field_errors.remove(&field);
        state.draft.insert(field, value.into());
    }

    /// Append a picked file to a file field
    pub fn add_file(&self, field: &str, file: LocalFile) {
        let mut state = self.state.lock();
        state.field_errors.remove(field);
        let entry = state
            .draft
            .entry(field.to_string())
            .or_insert_with(|| FieldInput::Files(Vec::new()));
        match entry {
            FieldInput::Files(files) => files.push(UploadRef::Local(file)),
            other => *other = FieldInput::Files(vec![UploadRef::Local(file)]),
        }
    }

    /// Remove the file at `index` from a file field
    pub fn remove_file(&self, field: &str, index: usize) -> Option<UploadRef> {
        let mut state = self.state.lock();
        match state.draft.get_mut(field) {
            Some(FieldInput::Files(files)) if index < files.len() => Some(files.remove(index)),
            _ => None,
        }
    }

    /// Keep a rich-text field in sync with an editor
    ///
    /// The editor is seeded with the current value and every user edit is
    /// written back into the draft.
    pub fn bind_editor(&self, field: &str, editor: &dyn RichTextEditor) {
        if let Some(FieldInput::Text(html)) = self.value(field) {
            editor.set_value(&html);
        }
        let state = Arc::clone(&self.state);
        let field = field.to_string();
        editor.on_change(Box::new(move |html| {
            let mut state = state.lock();
            state.field_errors.remove(&field);
            state
                .draft
                .insert(field.clone(), FieldInput::Text(html.to_string()));
        }));
    }

    /// Per-field messages from the last validation or submission
    pub fn field_errors(&self) -> FieldErrors {
        self.state.lock().field_errors.clone()
    }

    /// Message for one field
    pub fn error(&self, field: &str) -> Option<String> {
        self.state.lock().field_errors.get(field).cloned()
    }

    /// Whether a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validate the draft and build its payload without sending it
    ///
    /// Field errors are recorded on failure.
    pub fn prepare(&self) -> Result<Payload> {
        let mut state = self.state.lock();
        let result = payload::assemble(
            &self.def().schema,
            &state.draft,
            self.target.mode(),
            state.original.as_ref(),
            &self.uploads,
        );
        match &result {
            Ok(_) => state.field_errors.clear(),
            Err(Error::Validation { field_errors }) => state.field_errors.clone_from(field_errors),
            Err(_) => {}
        }
        result
    }

    /// Re-key backend field errors onto schema fields
    ///
    /// Dotted paths such as `data.slug` or `body.title` are matched by their
    /// last segment. Returns the re-keyed map and the messages of errors that
    /// match no field.
    fn attach_to_fields(&self, errors: FieldErrors) -> (FieldErrors, Vec<String>) {
        let schema = &self.def().schema;
        let mut unmatched = Vec::new();
        let field_errors = errors
            .into_iter()
            .map(|(path, message)| {
                let leaf = path.rsplit('.').next().unwrap_or(&path);
                match schema.field(&path).or_else(|| schema.field(leaf)) {
                    Some(field) => (field.name.to_string(), message),
                    None => {
                        unmatched.push(message.clone());
                        (path, message)
                    }
                }
            })
            .collect();
        (field_errors, unmatched)
    }

    /// Validate and submit the draft
    ///
    /// Nothing is sent when validation fails. A second call while one is in
    /// flight fails with [`Error::SubmissionInFlight`].
    pub async fn submit(&self) -> Result<Entity> {
        let Some(_guard) = SubmitGuard::acquire(&self.submitting) else {
            debug!(resource = self.def().path, "Ignoring submit while one is in flight");
            return Err(Error::SubmissionInFlight);
        };

        let payload = self.prepare()?;
        debug!(resource = self.def().path, payload = %payload.preview(), "Submitting");

        let result = match &self.target {
            FormTarget::Create => self.service.create(payload).await,
            FormTarget::Edit { id } => self.service.update(id, payload).await,
        };

        match result {
            Ok(entity) => {
                let verb = match self.target {
                    FormTarget::Create => "created",
                    FormTarget::Edit { .. } => "updated",
                };
                info!(resource = self.def().path, id = %entity.id, "Saved");
                self.notifier.success(format!("{} {verb}", self.def().label));

                let mut state = self.state.lock();
                state.field_errors.clear();
                // uploaded files are now remote; local bytes are released here
                match self.target {
                    FormTarget::Create => state.draft.clear(),
                    FormTarget::Edit { .. } => {
                        state.draft = self.def().schema.draft_from(&entity);
                        state.original = Some(entity.clone());
                    }
                }
                Ok(entity)
            }
            Err(Error::Validation { field_errors }) => {
                warn!(resource = self.def().path, fields = field_errors.len(), "Backend rejected fields");
                let (field_errors, unmatched) = self.attach_to_fields(field_errors);
                self.state.lock().field_errors.clone_from(&field_errors);
                // errors no field can display still need to reach the operator
                if !unmatched.is_empty() {
                    self.notifier.error(unmatched.join("; "));
                }
                Err(Error::Validation { field_errors })
            }
            Err(e) => {
                warn!(resource = self.def().path, error = %e, "Submit failed");
                self.notifier.error(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::rich_text::BufferEditor;
    use bridgeline_client::MemoryResource;
    use bridgeline_core::ResourceKind;
    use pretty_assertions::assert_eq;

    fn blog_form() -> (Arc<MemoryResource>, MutationForm) {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Blog.def()));
        let form = MutationForm::create(memory.clone(), UploadConfig::default(), Notifier::new());
        (memory, form)
    }

    #[test]
    fn test_set_clears_field_error() {
        let (_, form) = blog_form();
        assert!(form.prepare().is_err());
        assert!(form.error("title").is_some());

        form.set("title", "Hiring season");
        assert!(form.error("title").is_none());
    }

    #[test]
    fn test_add_and_remove_files() {
        let (_, form) = blog_form();
        form.add_file("coverImage", LocalFile::new("a.png", vec![1u8]));
        form.add_file("coverImage", LocalFile::new("b.png", vec![1u8]));
        let removed = form.remove_file("coverImage", 0).unwrap();
        assert!(removed.is_local());

        match form.value("coverImage").unwrap() {
            FieldInput::Files(files) => assert_eq!(files.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(form.remove_file("coverImage", 5).is_none());
    }

    #[test]
    fn test_bound_editor_writes_into_draft() {
        let (_, form) = blog_form();
        form.set("content", "<p>seed</p>");
        let editor = BufferEditor::new();
        form.bind_editor("content", &editor);
        assert_eq!(editor.value(), "<p>seed</p>");

        editor.edit("<p>A much longer introduction to our hiring season.</p>");
        assert_eq!(
            form.value("content"),
            Some(FieldInput::from("<p>A much longer introduction to our hiring season.</p>"))
        );
    }

    #[tokio::test]
    async fn test_create_success_clears_draft() {
        let (memory, form) = blog_form();
        form.set("title", "Hiring season");
        form.set("content", "<p>We are hiring nurses across three hospitals.</p>");
        form.set("author", "Editorial");
        form.add_file("coverImage", LocalFile::new("cover.jpg", vec![0xFFu8, 0xD8]));

        let created = form.submit().await.unwrap();
        assert!(created.str_field("coverImage").is_some_and(|url| !url.is_empty()));
        assert!(form.draft().is_empty());
        assert!(!form.is_submitting());
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_field_paths_map_onto_schema_fields() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Faq.def()));
        let notifier = Notifier::new();
        let form = MutationForm::create(memory.clone(), UploadConfig::default(), notifier.clone());
        form.set("question", "Do you ship abroad?");
        form.set("answer", "Yes, worldwide.");
        memory.fail_next(Error::field("body.question", "Question already exists"));

        assert!(form.submit().await.is_err());
        assert_eq!(form.error("question").as_deref(), Some("Question already exists"));
        assert!(notifier.is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_without_field_is_notified() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Blog.def()));
        let notifier = Notifier::new();
        let form = MutationForm::create(memory.clone(), UploadConfig::default(), notifier.clone());
        form.set("title", "Hiring season");
        form.set("content", "<p>We are hiring nurses across three hospitals.</p>");
        form.set("author", "Editorial");
        form.add_file("coverImage", LocalFile::new("cover.jpg", vec![0xFFu8, 0xD8]));
        memory.fail_next(Error::field("data.slug", "Slug already taken"));

        let err = form.submit().await.unwrap_err();

        assert!(err.field_errors().is_some_and(|errors| errors.contains_key("data.slug")));
        assert_eq!(notifier.entries().len(), 1);
        assert_eq!(notifier.last().unwrap().message, "Slug already taken");
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_backend_failure_raises_one_notification() {
        let memory = Arc::new(MemoryResource::new(ResourceKind::Faq.def()));
        let notifier = Notifier::new();
        let form = MutationForm::create(memory.clone(), UploadConfig::default(), notifier.clone());
        form.set("question", "Do you ship abroad?");
        form.set("answer", "Yes, worldwide.");
        memory.fail_next(Error::server(500, "Database unavailable"));

        assert!(form.submit().await.is_err());
        assert_eq!(notifier.entries().len(), 1);
        assert!(form.field_errors().is_empty());
        assert!(!form.is_submitting());
    }
}
