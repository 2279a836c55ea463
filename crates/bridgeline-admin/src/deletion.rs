//! Two-phase deletion gate

/// Records which entity the operator asked to delete
///
/// Requesting only records intent. The caller performs the removal after
/// taking the pending id with [`DeletionConfirmation::confirm`], which also
/// closes the dialog whatever the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionConfirmation {
    pending: Option<String>,
}

impl DeletionConfirmation {
    /// Closed dialog
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Open the dialog for `id`, replacing any earlier request
    pub fn request(&mut self, id: impl Into<String>) {
        self.pending = Some(id.into());
    }

    /// Close the dialog without deleting; returns the abandoned id
    pub const fn cancel(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Close the dialog and hand over the id to delete
    pub const fn confirm(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Id awaiting confirmation
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Whether the dialog is open
    pub const fn is_open(&self) -> bool {
        self.pending.is_some()
    }
}
