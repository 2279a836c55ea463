//! Field schemas and client-side validation
//!
//! Every managed entity is described by an [`EntitySchema`]: an ordered list
//! of [`FieldSpec`]s. Validation turns a raw [`Draft`] into coerced values and
//! collects one message per failing field. It is advisory; the backend may
//! still reject the payload with its own field errors.

use crate::config::UploadConfig;
use crate::draft::{Draft, FieldInput, UploadRef};
use crate::error::FieldErrors;
use crate::sanitize;
use crate::types::Entity;
use crate::utils;
use serde::Serialize;
use serde_json::{Number, Value};
use validator::{ValidateEmail, ValidateUrl};

/// Whether a form creates a new entity or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    /// New entity
    Create,
    /// Existing entity
    Edit,
}

/// When a field must be filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// May be left blank
    Optional,
    /// Must be filled in on create and edit
    Required,
    /// Must be filled in on create; blank on edit keeps the stored value
    RequiredOnCreate,
}

impl Requirement {
    /// Whether a blank value is rejected in the given mode
    pub const fn applies(self, mode: FormMode) -> bool {
        match self {
            Self::Optional => false,
            Self::Required => true,
            Self::RequiredOnCreate => matches!(mode, FormMode::Create),
        }
    }
}

/// Accepted file types for a file field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accept {
    /// Extensions listed in [`UploadConfig::image_extensions`]
    Images,
    /// PDF and Word documents
    Documents,
    /// Anything
    Any,
}

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Value type of a field, which also decides its coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line plain text
    LongText,
    /// HTML from a rich-text editor; sanitized on write
    RichText,
    /// Email address
    Email,
    /// Absolute URL
    Url,
    /// Secret; never seeded into edit drafts
    Password,
    /// Calendar date (`YYYY-MM-DD` or RFC 3339)
    Date,
    /// Decimal number coerced from text
    Number,
    /// Whole number coerced from text
    Integer,
    /// Checkbox
    Boolean,
    /// One of a fixed set of values
    Choice {
        /// Allowed values
        options: &'static [&'static str],
    },
    /// List of strings; text input is split on commas
    Tags,
    /// Nested JSON object (e.g. social links)
    Object,
    /// Binary upload sent as its own multipart part
    File {
        /// Multipart key declared by the backend
        key: &'static str,
        /// Whether several files may be attached under the same key
        multiple: bool,
        /// Accepted file types
        accept: Accept,
    },
}

impl FieldKind {
    /// Whether the field is uploaded as multipart parts
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// Declaration of one form field
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// Backend field name
    pub name: &'static str,

    /// Human-readable label
    pub label: &'static str,

    /// Value type
    pub kind: FieldKind,

    /// When the field must be filled in
    pub requirement: Requirement,

    /// Minimum length in characters (visible text for rich text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,

    /// Maximum length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,

    /// Value sent when the field is left blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Shown as a column in list tables
    pub column: bool,
}

impl FieldSpec {
    /// Create an optional field of the given kind
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            requirement: Requirement::Optional,
            min_len: None,
            max_len: None,
            default: None,
            column: false,
        }
    }

    /// Single-line text field
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    /// Single-file upload field
    pub const fn image(name: &'static str, label: &'static str, key: &'static str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::File {
                key,
                multiple: false,
                accept: Accept::Images,
            },
        )
    }

    /// Multi-file upload field
    pub const fn images(name: &'static str, label: &'static str, key: &'static str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::File {
                key,
                multiple: true,
                accept: Accept::Images,
            },
        )
    }

    /// Mark as required in every mode
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    /// Mark as required only when creating
    #[must_use]
    pub const fn required_on_create(mut self) -> Self {
        self.requirement = Requirement::RequiredOnCreate;
        self
    }

    /// Set the minimum length
    #[must_use]
    pub const fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    /// Set the maximum length
    #[must_use]
    pub const fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    /// Set the value used when the field is blank
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Show in list tables
    #[must_use]
    pub const fn column(mut self) -> Self {
        self.column = true;
        self
    }

    /// Validate and coerce one input
    ///
    /// `input` is `None` when the draft has no entry for this field.
    pub fn check(
        &self,
        input: Option<&FieldInput>,
        mode: FormMode,
        uploads: &UploadConfig,
    ) -> Result<Checked, String> {
        let blank = input.is_none_or(FieldInput::is_blank);
        if blank {
            if self.requirement.applies(mode) {
                return Err(format!("{} is required", self.label));
            }
            return Ok(self.blank_value(mode, input));
        }

        let Some(input) = input else {
            return Ok(Checked::Omit);
        };

        match self.kind {
            FieldKind::Text | FieldKind::LongText | FieldKind::Password => {
                let text = expect_text(input, self.label)?;
                self.check_length(text.chars().count())?;
                Ok(Checked::Value(Value::String(text.to_string())))
            }
            FieldKind::RichText => {
                let text = expect_text(input, self.label)?;
                self.check_length(sanitize::text_length(text))?;
                Ok(Checked::Value(Value::String(sanitize::clean_rich_text(text))))
            }
            FieldKind::Email => {
                let email = expect_text(input, self.label)?.to_string();
                if !email.validate_email() {
                    return Err(format!("{} must be a valid email address", self.label));
                }
                Ok(Checked::Value(Value::String(email)))
            }
            FieldKind::Url => {
                let url = expect_text(input, self.label)?.to_string();
                if !url.validate_url() {
                    return Err(format!("{} must be a valid URL", self.label));
                }
                Ok(Checked::Value(Value::String(url)))
            }
            FieldKind::Date => {
                let raw = expect_text(input, self.label)?;
                let valid = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
                    || chrono::DateTime::parse_from_rfc3339(raw).is_ok();
                if !valid {
                    return Err(format!("{} must be a date (YYYY-MM-DD)", self.label));
                }
                Ok(Checked::Value(Value::String(raw.to_string())))
            }
            FieldKind::Number => {
                let raw = expect_text(input, self.label)?;
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(|n| Checked::Value(Value::Number(n)))
                    .ok_or_else(|| format!("{} must be a number", self.label))
            }
            FieldKind::Integer => {
                let raw = expect_text(input, self.label)?;
                raw.parse::<i64>()
                    .map(|n| Checked::Value(Value::from(n)))
                    .map_err(|_| format!("{} must be a whole number", self.label))
            }
            FieldKind::Boolean => coerce_bool(input)
                .map(|flag| Checked::Value(Value::Bool(flag)))
                .ok_or_else(|| format!("{} must be true or false", self.label)),
            FieldKind::Choice { options } => {
                let raw = expect_text(input, self.label)?;
                if options.contains(&raw) {
                    Ok(Checked::Value(Value::String(raw.to_string())))
                } else {
                    Err(format!("{} must be one of: {}", self.label, options.join(", ")))
                }
            }
            FieldKind::Tags => {
                let items = match input {
                    FieldInput::Items(items) => items.clone(),
                    FieldInput::Text(text) => text.split(',').map(ToString::to_string).collect(),
                    _ => return Err(format!("{} must be a list", self.label)),
                };
                let items: Vec<Value> = items
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect();
                Ok(Checked::Value(Value::Array(items)))
            }
            FieldKind::Object => match input {
                FieldInput::Structured(value @ Value::Object(_)) => Ok(Checked::Value(value.clone())),
                FieldInput::Text(text) => match serde_json::from_str::<Value>(text) {
                    Ok(value @ Value::Object(_)) => Ok(Checked::Value(value)),
                    _ => Err(format!("{} must be a JSON object", self.label)),
                },
                _ => Err(format!("{} must be a JSON object", self.label)),
            },
            FieldKind::File {
                multiple, accept, ..
            } => {
                let FieldInput::Files(files) = input else {
                    return Err(format!("{} must be a file", self.label));
                };
                if !multiple && files.len() > 1 {
                    return Err(format!("{} accepts a single file", self.label));
                }
                for file in files {
                    if let UploadRef::Local(local) = file {
                        check_local_file(local, accept, uploads)
                            .map_err(|reason| format!("{}: {reason}", self.label))?;
                    }
                }
                Ok(Checked::Files(files.clone()))
            }
        }
    }

    fn blank_value(&self, mode: FormMode, input: Option<&FieldInput>) -> Checked {
        // edits leave untouched optional fields alone rather than resetting them
        if mode == FormMode::Edit && input.is_none() {
            return Checked::Omit;
        }
        match (&self.kind, &self.default) {
            (FieldKind::File { .. }, _) => match input {
                Some(FieldInput::Files(files)) => Checked::Files(files.clone()),
                _ => Checked::Omit,
            },
            (_, Some(default)) => Checked::Value(default.clone()),
            (FieldKind::Tags, None) => Checked::Value(Value::Array(Vec::new())),
            // a cleared text field on edit is sent so the stored value is cleared too
            (FieldKind::Text | FieldKind::LongText | FieldKind::RichText | FieldKind::Url, None)
                if mode == FormMode::Edit =>
            {
                Checked::Value(Value::String(String::new()))
            }
            _ => Checked::Omit,
        }
    }

    fn check_length(&self, len: usize) -> Result<(), String> {
        if let Some(min) = self.min_len {
            if len < min {
                return Err(format!("{} must be at least {min} characters", self.label));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Err(format!("{} must be at most {max} characters", self.label));
            }
        }
        Ok(())
    }

    /// Seed a draft value from a stored entity value
    pub fn input_from_value(&self, value: &Value) -> Option<FieldInput> {
        match (self.kind, value) {
            (_, Value::Null) | (FieldKind::Password, _) => None,
            (FieldKind::File { .. }, Value::String(url)) => {
                Some(FieldInput::Files(vec![UploadRef::Remote(url.clone())]))
            }
            (FieldKind::File { .. }, Value::Array(urls)) => Some(FieldInput::Files(
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(|url| UploadRef::Remote(url.to_string()))
                    .collect(),
            )),
            (FieldKind::Boolean, Value::Bool(flag)) => Some(FieldInput::Flag(*flag)),
            (FieldKind::Tags, Value::Array(items)) => Some(FieldInput::Items(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect(),
            )),
            (FieldKind::Object, value @ Value::Object(_)) => {
                Some(FieldInput::Structured(value.clone()))
            }
            (_, Value::String(text)) => Some(FieldInput::Text(text.clone())),
            (_, Value::Number(n)) => Some(FieldInput::Text(n.to_string())),
            (_, Value::Bool(flag)) => Some(FieldInput::Text(flag.to_string())),
            (_, other) => Some(FieldInput::Structured(other.clone())),
        }
    }
}

/// Outcome of checking one field
#[derive(Debug, Clone, PartialEq)]
pub enum Checked {
    /// Leave the field out of the payload
    Omit,
    /// Scalar or structured value for the JSON part
    Value(Value),
    /// File references for multipart parts
    Files(Vec<UploadRef>),
}

fn expect_text<'a>(input: &'a FieldInput, label: &str) -> Result<&'a str, String> {
    match input {
        FieldInput::Text(text) => Ok(text.trim()),
        _ => Err(format!("{label} must be text")),
    }
}

fn coerce_bool(input: &FieldInput) -> Option<bool> {
    match input {
        FieldInput::Flag(flag) => Some(*flag),
        FieldInput::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => Some(true),
            "false" | "off" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn check_local_file(
    file: &crate::draft::LocalFile,
    accept: Accept,
    uploads: &UploadConfig,
) -> Result<(), String> {
    if file.is_empty() {
        return Err(format!("{} is empty", file.file_name));
    }
    let size = file.len() as u64;
    if size > uploads.max_file_size {
        return Err(format!(
            "{} is {}, the limit is {}",
            file.file_name,
            utils::format_bytes(size),
            utils::format_bytes(uploads.max_file_size)
        ));
    }
    let allowed: Vec<&str> = match accept {
        Accept::Images => uploads.image_extensions.iter().map(String::as_str).collect(),
        Accept::Documents => DOCUMENT_EXTENSIONS.to_vec(),
        Accept::Any => return Ok(()),
    };
    if utils::validate_file_extension(&file.file_name, &allowed) {
        Ok(())
    } else {
        Err(format!(
            "{} has an unsupported type (allowed: {})",
            file.file_name,
            allowed.join(", ")
        ))
    }
}

/// Ordered field declarations for one entity type
#[derive(Debug, Clone, Serialize)]
pub struct EntitySchema {
    fields: Vec<FieldSpec>,
}

impl EntitySchema {
    /// Create a schema
    pub const fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields shown in list tables
    pub fn columns(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.column)
    }

    /// Fields uploaded as multipart parts
    pub fn file_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.kind.is_file())
    }

    /// Validate a draft, returning coerced values in schema order
    ///
    /// Draft entries that the schema does not declare are ignored.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn check(
        &self,
        draft: &Draft,
        mode: FormMode,
        uploads: &UploadConfig,
    ) -> Result<Vec<(&FieldSpec, Checked)>, FieldErrors> {
        let mut checked = Vec::with_capacity(self.fields.len());
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field.check(draft.get(field.name), mode, uploads) {
                Ok(value) => checked.push((field, value)),
                Err(message) => {
                    errors.insert(field.name.to_string(), message);
                }
            }
        }

        if errors.is_empty() {
            Ok(checked)
        } else {
            Err(errors)
        }
    }

    /// Build an edit draft from a stored entity
    pub fn draft_from(&self, entity: &Entity) -> Draft {
        self.fields
            .iter()
            .filter_map(|field| {
                entity
                    .get(field.name)
                    .and_then(|value| field.input_from_value(value))
                    .map(|input| (field.name.to_string(), input))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::draft::LocalFile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn uploads() -> UploadConfig {
        UploadConfig::default()
    }

    fn check(field: &FieldSpec, input: FieldInput) -> Result<Checked, String> {
        field.check(Some(&input), FormMode::Create, &uploads())
    }

    #[test]
    fn test_required_text_rejects_blank() {
        let field = FieldSpec::text("title", "Title").required();
        let err = check(&field, FieldInput::from("   ")).unwrap_err();
        assert_eq!(err, "Title is required");
        let err = field.check(None, FormMode::Edit, &uploads()).unwrap_err();
        assert_eq!(err, "Title is required");
    }

    #[test]
    fn test_required_on_create_only() {
        let field = FieldSpec::image("coverImage", "Cover image", "coverImage").required_on_create();
        assert!(field.check(None, FormMode::Create, &uploads()).is_err());
        assert_eq!(
            field.check(None, FormMode::Edit, &uploads()).unwrap(),
            Checked::Omit
        );
    }

    #[test]
    fn test_length_bounds() {
        let field = FieldSpec::text("title", "Title").min_len(3).max_len(5);
        assert!(check(&field, FieldInput::from("ab")).is_err());
        assert!(check(&field, FieldInput::from("abc")).is_ok());
        assert!(check(&field, FieldInput::from("abcdef")).is_err());
    }

    #[test]
    fn test_rich_text_is_sanitized_and_measured_as_text() {
        let field = FieldSpec::new("content", "Content", FieldKind::RichText).min_len(5);
        // markup alone does not satisfy the minimum length
        assert!(check(&field, FieldInput::from("<p><b>hi</b></p>")).is_err());

        let checked = check(&field, FieldInput::from("<p>hello world</p><script>x()</script>")).unwrap();
        assert_eq!(checked, Checked::Value(json!("<p>hello world</p>")));
    }

    #[rstest]
    #[case("20.00", Some(json!(20.0)))]
    #[case(" 7.5 ", Some(json!(7.5)))]
    #[case("abc", None)]
    #[case("NaN", None)]
    fn test_number_coercion(#[case] raw: &str, #[case] expected: Option<Value>) {
        let field = FieldSpec::new("price", "Price", FieldKind::Number);
        let result = check(&field, FieldInput::from(raw));
        match expected {
            Some(value) => assert_eq!(result.unwrap(), Checked::Value(value)),
            None => assert_eq!(result.unwrap_err(), "Price must be a number"),
        }
    }

    #[test]
    fn test_integer_coercion() {
        let field = FieldSpec::new("order", "Order", FieldKind::Integer);
        assert_eq!(check(&field, FieldInput::from("3")).unwrap(), Checked::Value(json!(3)));
        assert!(check(&field, FieldInput::from("3.5")).is_err());
    }

    #[rstest]
    #[case(FieldInput::Flag(true), Some(true))]
    #[case(FieldInput::from("on"), Some(true))]
    #[case(FieldInput::from("FALSE"), Some(false))]
    #[case(FieldInput::from("maybe"), None)]
    fn test_boolean_coercion(#[case] input: FieldInput, #[case] expected: Option<bool>) {
        let field = FieldSpec::new("isFeatured", "Featured", FieldKind::Boolean);
        let result = check(&field, input);
        match expected {
            Some(flag) => assert_eq!(result.unwrap(), Checked::Value(Value::Bool(flag))),
            None => assert!(result.is_err()),
        }
    }

    #[test]
    fn test_blank_optional_uses_default_on_create() {
        let field = FieldSpec::new("price", "Price", FieldKind::Number).default_value(json!(0));
        assert_eq!(
            field.check(None, FormMode::Create, &uploads()).unwrap(),
            Checked::Value(json!(0))
        );
        assert_eq!(
            field.check(Some(&FieldInput::from("")), FormMode::Create, &uploads()).unwrap(),
            Checked::Value(json!(0))
        );
        // edit with no entry leaves the stored value alone
        assert_eq!(
            field.check(None, FormMode::Edit, &uploads()).unwrap(),
            Checked::Omit
        );
    }

    #[test]
    fn test_choice_membership() {
        let field = FieldSpec::new(
            "role",
            "Role",
            FieldKind::Choice {
                options: &["admin", "user"],
            },
        );
        assert!(check(&field, FieldInput::from("admin")).is_ok());
        assert_eq!(
            check(&field, FieldInput::from("root")).unwrap_err(),
            "Role must be one of: admin, user"
        );
    }

    #[test]
    fn test_email_and_url_formats() {
        let email = FieldSpec::new("email", "Email", FieldKind::Email);
        assert!(check(&email, FieldInput::from("hr@bridgeline.example")).is_ok());
        assert!(check(&email, FieldInput::from("not-an-email")).is_err());

        let url = FieldSpec::new("website", "Website", FieldKind::Url);
        assert!(check(&url, FieldInput::from("https://bridgeline.example")).is_ok());
        assert!(check(&url, FieldInput::from("bridgeline")).is_err());
    }

    #[test]
    fn test_date_formats() {
        let field = FieldSpec::new("deadline", "Deadline", FieldKind::Date);
        assert!(check(&field, FieldInput::from("2025-01-31")).is_ok());
        assert!(check(&field, FieldInput::from("2025-01-31T00:00:00Z")).is_ok());
        assert!(check(&field, FieldInput::from("31/01/2025")).is_err());
    }

    #[test]
    fn test_tags_split_from_text() {
        let field = FieldSpec::new("tags", "Tags", FieldKind::Tags);
        assert_eq!(
            check(&field, FieldInput::from("hiring, nurses , ,export")).unwrap(),
            Checked::Value(json!(["hiring", "nurses", "export"]))
        );
    }

    #[test]
    fn test_object_from_text_or_structured() {
        let field = FieldSpec::new("socialLinks", "Social links", FieldKind::Object);
        assert!(check(&field, FieldInput::from(r#"{"linkedin": "https://l.in/x"}"#)).is_ok());
        assert!(check(&field, FieldInput::Structured(json!({"x": "y"}))).is_ok());
        assert!(check(&field, FieldInput::from("[1, 2]")).is_err());
    }

    #[test]
    fn test_single_file_field_rejects_many() {
        let field = FieldSpec::image("photo", "Photo", "photo");
        let files = vec![
            UploadRef::Local(LocalFile::new("a.png", vec![1u8])),
            UploadRef::Local(LocalFile::new("b.png", vec![1u8])),
        ];
        assert_eq!(
            check(&field, FieldInput::Files(files)).unwrap_err(),
            "Photo accepts a single file"
        );
    }

    #[test]
    fn test_file_type_and_size_limits() {
        let field = FieldSpec::images("images", "Images", "images");
        let wrong_type = vec![UploadRef::Local(LocalFile::new("malware.exe", vec![1u8]))];
        assert!(check(&field, FieldInput::Files(wrong_type)).unwrap_err().contains("unsupported type"));

        let mut limits = uploads();
        limits.max_file_size = 4;
        let too_big = vec![UploadRef::Local(LocalFile::new("big.png", vec![0u8; 5]))];
        let err = field
            .check(Some(&FieldInput::Files(too_big)), FormMode::Create, &limits)
            .unwrap_err();
        assert!(err.contains("the limit is 4 B"));
    }

    #[test]
    fn test_remote_files_skip_local_checks() {
        let field = FieldSpec::images("images", "Images", "images").required_on_create();
        let files = vec![UploadRef::Remote("https://cdn.example.com/a.bmp".to_string())];
        assert_eq!(
            check(&field, FieldInput::Files(files.clone())).unwrap(),
            Checked::Files(files)
        );
    }

    #[test]
    fn test_schema_collects_all_errors() {
        let schema = EntitySchema::new(vec![
            FieldSpec::text("title", "Title").required(),
            FieldSpec::new("content", "Content", FieldKind::RichText).required().min_len(20),
            FieldSpec::text("author", "Author"),
        ]);
        let mut draft = Draft::new();
        draft.insert("content".to_string(), FieldInput::from("too short"));

        let errors = schema.check(&draft, FormMode::Create, &uploads()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("title"));
        assert_eq!(errors["content"], "Content must be at least 20 characters");
    }

    #[test]
    fn test_draft_from_entity_tags_remote_files() {
        let schema = EntitySchema::new(vec![
            FieldSpec::text("name", "Name"),
            FieldSpec::new("price", "Price", FieldKind::Number),
            FieldSpec::new("isFeatured", "Featured", FieldKind::Boolean),
            FieldSpec::images("images", "Images", "images"),
            FieldSpec::new("password", "Password", FieldKind::Password),
        ]);
        let entity: Entity = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Teddy Bear",
            "price": 20.0,
            "isFeatured": true,
            "images": ["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"],
            "password": "hash"
        }))
        .unwrap();

        let draft = schema.draft_from(&entity);
        assert_eq!(draft["name"], FieldInput::from("Teddy Bear"));
        assert_eq!(draft["price"], FieldInput::from("20.0"));
        assert_eq!(draft["isFeatured"], FieldInput::Flag(true));
        assert_eq!(
            draft["images"],
            FieldInput::Files(vec![
                UploadRef::Remote("https://cdn.example.com/1.png".to_string()),
                UploadRef::Remote("https://cdn.example.com/2.png".to_string()),
            ])
        );
        assert!(!draft.contains_key("password"));
    }
}
