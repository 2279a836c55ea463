//! Form draft values and upload references

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// A file picked by the user that has not been sent yet
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Original file name
    pub file_name: String,

    /// MIME type
    pub mime: String,

    /// File contents
    pub bytes: Bytes,
}

impl LocalFile {
    /// Create a local file, guessing the MIME type from the extension
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = crate::utils::guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes: bytes.into(),
        }
    }

    /// Override the MIME type
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has no file name.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| crate::Error::configuration(format!("invalid file path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name, bytes))
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Current value of a file field
///
/// The tag decides what happens on submit: `Remote` assets are previewed and
/// never re-uploaded, `Local` files are staged as multipart parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRef {
    /// Not yet sent
    Local(LocalFile),
    /// Already stored by the backend
    Remote(String),
}

impl UploadRef {
    /// Whether this reference still needs uploading
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Remote URL, if already uploaded
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::Remote(url) => Some(url),
            Self::Local(_) => None,
        }
    }
}

/// Raw value of one form field before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Text as typed by the user
    Text(String),
    /// Checkbox state
    Flag(bool),
    /// Ordered list of strings (tags, multi-select)
    Items(Vec<String>),
    /// Nested structured value (e.g. social links)
    Structured(Value),
    /// File field contents in user-selected order
    Files(Vec<UploadRef>),
}

impl FieldInput {
    /// Whether the input carries no usable value
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Flag(_) => false,
            Self::Items(items) => items.iter().all(|item| item.trim().is_empty()),
            Self::Structured(value) => match value {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::String(text) => text.trim().is_empty(),
                _ => false,
            },
            Self::Files(files) => files.is_empty(),
        }
    }
}

impl From<&str> for FieldInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for FieldInput {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<Vec<UploadRef>> for FieldInput {
    fn from(files: Vec<UploadRef>) -> Self {
        Self::Files(files)
    }
}

/// Values of a form, keyed by field name
pub type Draft = IndexMap<String, FieldInput>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_local_file_guesses_mime() {
        let file = LocalFile::new("teddy.PNG", vec![1u8, 2, 3]);
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.len(), 3);
        assert!(!file.is_empty());
    }

    #[test]
    fn test_local_file_debug_hides_bytes() {
        let file = LocalFile::new("a.pdf", vec![0u8; 2048]);
        let debug = format!("{file:?}");
        assert!(debug.contains("len: 2048"));
        assert!(!debug.contains("[0, 0"));
    }

    #[test]
    fn test_upload_ref_tags() {
        let local = UploadRef::Local(LocalFile::new("x.jpg", vec![1u8]));
        let remote = UploadRef::Remote("https://cdn.example.com/x.jpg".to_string());
        assert!(local.is_local());
        assert!(!remote.is_local());
        assert_eq!(remote.remote_url(), Some("https://cdn.example.com/x.jpg"));
        assert_eq!(local.remote_url(), None);
    }

    #[test]
    fn test_blank_detection() {
        assert!(FieldInput::from("   ").is_blank());
        assert!(!FieldInput::from("x").is_blank());
        assert!(!FieldInput::Flag(false).is_blank());
        assert!(FieldInput::Items(vec![" ".to_string()]).is_blank());
        assert!(FieldInput::Structured(json!({})).is_blank());
        assert!(!FieldInput::Structured(json!({"linkedin": "u"})).is_blank());
        assert!(FieldInput::Files(Vec::new()).is_blank());
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let file = LocalFile::from_path(&path).unwrap();
        assert_eq!(file.file_name, "cv.pdf");
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(file.bytes.as_ref(), b"%PDF");
    }
}
