//! Submission payload assembly
//!
//! A validated draft is split into a JSON `data` document and a list of file
//! parts. Form submissions are always multipart, even when no file is
//! attached; row actions such as flag toggles send plain JSON.

use crate::config::UploadConfig;
use crate::draft::{Draft, LocalFile, UploadRef};
use crate::error::{Error, Result};
use crate::schema::{Checked, EntitySchema, FieldKind, FormMode};
use crate::types::{Entity, Fields};
use serde_json::{Value, json};
use tracing::debug;

/// Name of the multipart part that carries the JSON document
pub const DATA_PART: &str = "data";

/// One binary part of a multipart payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Multipart key declared by the backend for this field
    pub key: String,

    /// File contents and metadata
    pub file: LocalFile,
}

/// Request body for create and update calls
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/json` body
    Json(Fields),
    /// `multipart/form-data` body: a `data` part plus zero or more files
    Multipart {
        /// Scalar and structured values
        data: Fields,
        /// File parts in field order, repeated keys for multi-file fields
        files: Vec<FilePart>,
    },
}

impl Payload {
    /// JSON payload setting a single field
    pub fn single(field: impl Into<String>, value: Value) -> Self {
        let mut data = Fields::new();
        data.insert(field.into(), value);
        Self::Json(data)
    }

    /// The JSON document
    pub const fn data(&self) -> &Fields {
        match self {
            Self::Json(data) | Self::Multipart { data, .. } => data,
        }
    }

    /// File parts; empty for JSON payloads
    pub fn files(&self) -> &[FilePart] {
        match self {
            Self::Json(_) => &[],
            Self::Multipart { files, .. } => files,
        }
    }

    /// Whether the payload is sent as `multipart/form-data`
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    /// Serialized `data` part
    pub fn data_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self.data())?)
    }

    /// Loggable summary without file contents
    pub fn preview(&self) -> Value {
        let files: Vec<Value> = self
            .files()
            .iter()
            .map(|part| {
                json!({
                    "key": part.key,
                    "fileName": part.file.file_name,
                    "mime": part.file.mime,
                    "size": part.file.len(),
                })
            })
            .collect();
        json!({
            "multipart": self.is_multipart(),
            "data": self.data(),
            "files": files,
        })
    }
}

/// Validate a draft and build the multipart payload for it
///
/// `original` is the stored entity when editing; it decides whether
/// previously uploaded files changed. Fields whose files are all remote and
/// unchanged are left out so the backend keeps them.
///
/// # Errors
///
/// Returns [`Error::Validation`] with one message per failing field.
pub fn assemble(
    schema: &EntitySchema,
    draft: &Draft,
    mode: FormMode,
    original: Option<&Entity>,
    uploads: &UploadConfig,
) -> Result<Payload> {
    let checked = schema
        .check(draft, mode, uploads)
        .map_err(Error::validation)?;

    let mut data = Fields::new();
    let mut files = Vec::new();

    for (field, value) in checked {
        match value {
            Checked::Omit => {}
            Checked::Value(value) => {
                data.insert(field.name.to_string(), value);
            }
            Checked::Files(refs) => {
                let FieldKind::File { key, multiple, .. } = field.kind else {
                    continue;
                };
                let stored = stored_urls(original, field.name);
                let mut remotes = Vec::new();
                for upload in refs {
                    match upload {
                        UploadRef::Local(file) => files.push(FilePart {
                            key: key.to_string(),
                            file,
                        }),
                        UploadRef::Remote(url) => remotes.push(url),
                    }
                }
                let has_local = files.iter().any(|part| part.key == key);
                let changed = remotes != stored;

                if multiple {
                    // the backend replaces the list, so retained URLs must be restated
                    if changed || (has_local && !remotes.is_empty()) {
                        data.insert(
                            field.name.to_string(),
                            Value::Array(remotes.into_iter().map(Value::String).collect()),
                        );
                    }
                } else if !has_local && changed {
                    data.insert(
                        field.name.to_string(),
                        remotes.into_iter().next().map_or(Value::Null, Value::String),
                    );
                }
            }
        }
    }

    debug!(
        fields = data.len(),
        files = files.len(),
        mode = ?mode,
        "Assembled payload"
    );

    Ok(Payload::Multipart { data, files })
}

fn stored_urls(original: Option<&Entity>, field: &str) -> Vec<String> {
    match original.and_then(|entity| entity.get(field)) {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(urls)) => urls
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::draft::FieldInput;
    use crate::schema::FieldSpec;
    use pretty_assertions::assert_eq;

    fn product_schema() -> EntitySchema {
        EntitySchema::new(vec![
            FieldSpec::text("name", "Name").required(),
            FieldSpec::new("price", "Price", FieldKind::Number).default_value(json!(0)),
            FieldSpec::new("isFeatured", "Featured", FieldKind::Boolean).default_value(json!(false)),
            FieldSpec::new("description", "Description", FieldKind::RichText),
            FieldSpec::images("images", "Images", "images").required_on_create(),
        ])
    }

    fn png(name: &str) -> UploadRef {
        UploadRef::Local(LocalFile::new(name, vec![0x89u8, b'P', b'N', b'G']))
    }

    fn remote(url: &str) -> UploadRef {
        UploadRef::Remote(url.to_string())
    }

    fn stored_product() -> Entity {
        serde_json::from_value(json!({
            "_id": "p1",
            "name": "Teddy Bear",
            "price": 20.0,
            "images": ["https://cdn.example.com/1.png"]
        }))
        .unwrap()
    }

    #[test]
    fn test_create_product_with_two_images() {
        let mut draft = Draft::new();
        draft.insert("name".to_string(), FieldInput::from("Teddy Bear"));
        draft.insert("price".to_string(), FieldInput::from("20.00"));
        draft.insert("images".to_string(), FieldInput::Files(vec![png("a.png"), png("b.png")]));

        let payload = assemble(
            &product_schema(),
            &draft,
            FormMode::Create,
            None,
            &UploadConfig::default(),
        )
        .unwrap();

        assert!(payload.is_multipart());
        assert_eq!(
            Value::Object(payload.data().clone()),
            json!({"name": "Teddy Bear", "price": 20.0, "isFeatured": false})
        );
        let keys: Vec<&str> = payload.files().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["images", "images"]);
        assert_eq!(payload.files()[1].file.file_name, "b.png");
    }

    #[test]
    fn test_create_without_required_images_fails() {
        let mut draft = Draft::new();
        draft.insert("name".to_string(), FieldInput::from("Teddy Bear"));

        let err = assemble(
            &product_schema(),
            &draft,
            FormMode::Create,
            None,
            &UploadConfig::default(),
        )
        .unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("images"));
    }

    #[test]
    fn test_edit_with_unchanged_remote_images_omits_field() {
        let original = stored_product();
        let mut draft = product_schema().draft_from(&original);
        draft.insert("name".to_string(), FieldInput::from("Big Teddy"));

        let payload = assemble(
            &product_schema(),
            &draft,
            FormMode::Edit,
            Some(&original),
            &UploadConfig::default(),
        )
        .unwrap();

        assert!(payload.is_multipart());
        assert!(payload.files().is_empty());
        assert!(!payload.data().contains_key("images"));
        assert_eq!(payload.data()["name"], json!("Big Teddy"));
    }

    #[test]
    fn test_edit_mixing_remote_and_local_restates_retained_urls() {
        let original = stored_product();
        let mut draft = product_schema().draft_from(&original);
        draft.insert(
            "images".to_string(),
            FieldInput::Files(vec![remote("https://cdn.example.com/1.png"), png("new.png")]),
        );

        let payload = assemble(
            &product_schema(),
            &draft,
            FormMode::Edit,
            Some(&original),
            &UploadConfig::default(),
        )
        .unwrap();

        assert_eq!(payload.data()["images"], json!(["https://cdn.example.com/1.png"]));
        assert_eq!(payload.files().len(), 1);
        assert_eq!(payload.files()[0].key, "images");
    }

    #[test]
    fn test_edit_removing_a_remote_image_sends_remaining_list() {
        let mut original = stored_product();
        original.fields.insert(
            "images".to_string(),
            json!(["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"]),
        );
        let mut draft = product_schema().draft_from(&original);
        draft.insert(
            "images".to_string(),
            FieldInput::Files(vec![remote("https://cdn.example.com/2.png")]),
        );

        let payload = assemble(
            &product_schema(),
            &draft,
            FormMode::Edit,
            Some(&original),
            &UploadConfig::default(),
        )
        .unwrap();

        assert_eq!(payload.data()["images"], json!(["https://cdn.example.com/2.png"]));
        assert!(payload.files().is_empty());
    }

    #[test]
    fn test_single_file_replacement_sends_only_the_part() {
        let schema = EntitySchema::new(vec![
            FieldSpec::text("name", "Name").required(),
            FieldSpec::image("photo", "Photo", "photo").required_on_create(),
        ]);
        let original: Entity = serde_json::from_value(json!({
            "_id": "t1", "name": "Ada", "photo": "https://cdn.example.com/ada.png"
        }))
        .unwrap();
        let mut draft = schema.draft_from(&original);
        draft.insert("photo".to_string(), FieldInput::Files(vec![png("ada2.png")]));

        let payload = assemble(
            &schema,
            &draft,
            FormMode::Edit,
            Some(&original),
            &UploadConfig::default(),
        )
        .unwrap();

        assert!(!payload.data().contains_key("photo"));
        assert_eq!(payload.files()[0].key, "photo");
    }

    #[test]
    fn test_rich_text_is_sanitized_in_payload() {
        let mut draft = Draft::new();
        draft.insert("name".to_string(), FieldInput::from("Robot"));
        draft.insert(
            "description".to_string(),
            FieldInput::from("<p>Safe</p><img src=x onerror=alert(1)>"),
        );
        draft.insert("images".to_string(), FieldInput::Files(vec![png("r.png")]));

        let payload = assemble(
            &product_schema(),
            &draft,
            FormMode::Create,
            None,
            &UploadConfig::default(),
        )
        .unwrap();

        let description = payload.data()["description"].as_str().unwrap();
        assert!(description.starts_with("<p>Safe</p>"));
        assert!(!description.contains("onerror"));
    }

    #[test]
    fn test_single_payload_is_json() {
        let payload = Payload::single("isFeatured", json!(true));
        assert!(!payload.is_multipart());
        assert!(payload.files().is_empty());
        assert_eq!(payload.data_json().unwrap(), r#"{"isFeatured":true}"#);
    }

    #[test]
    fn test_preview_hides_bytes() {
        let payload = Payload::Multipart {
            data: Fields::new(),
            files: vec![FilePart {
                key: "coverImage".to_string(),
                file: LocalFile::new("cover.jpg", vec![0u8; 3]),
            }],
        };
        assert_eq!(
            payload.preview()["files"],
            json!([{"key": "coverImage", "fileName": "cover.jpg", "mime": "image/jpeg", "size": 3}])
        );
    }
}
