//! Rich-text editor seam
//!
//! Forms talk to editors through [`RichTextEditor`] so the concrete widget
//! can be swapped. [`BufferEditor`] keeps the markup in memory.

use parking_lot::{Mutex, RwLock};
use std::fmt;

/// Callback invoked with the editor's markup after the user changes it
pub type ChangeCallback = Box<dyn Fn(&str) + Send + Sync>;

/// A rich-text editing widget
pub trait RichTextEditor: Send + Sync {
    /// Current markup
    fn value(&self) -> String;

    /// Replace the markup without notifying listeners
    fn set_value(&self, html: &str);

    /// Register a listener for user edits
    fn on_change(&self, callback: ChangeCallback);
}

/// In-memory editor
#[derive(Default)]
pub struct BufferEditor {
    value: RwLock<String>,
    listeners: Mutex<Vec<ChangeCallback>>,
}

impl BufferEditor {
    /// Empty editor
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an edit as if the user made it, notifying listeners
    pub fn edit(&self, html: &str) {
        *self.value.write() = html.to_string();
        for listener in self.listeners.lock().iter() {
            listener(html);
        }
    }
}

impl fmt::Debug for BufferEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferEditor")
            .field("value", &*self.value.read())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl RichTextEditor for BufferEditor {
    fn value(&self) -> String {
        self.value.read().clone()
    }

    fn set_value(&self, html: &str) {
        *self.value.write() = html.to_string();
    }

    fn on_change(&self, callback: ChangeCallback) {
        self.listeners.lock().push(callback);
    }
}
