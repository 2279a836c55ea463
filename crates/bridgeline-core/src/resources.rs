//! Definitions of the managed resources
//!
//! A [`ResourceDef`] pairs an endpoint with its [`EntitySchema`]; the list,
//! form and detail controllers are generic over it.

use crate::schema::{Accept, EntitySchema, FieldKind, FieldSpec};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// HTTP method used for updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateMethod {
    /// Partial update
    Patch,
    /// Full replacement
    Put,
}

/// Endpoint and schema of one managed resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDef {
    /// Which resource this is
    pub kind: ResourceKind,

    /// Singular display name
    pub label: &'static str,

    /// Collection path relative to the API base URL, without slashes
    pub path: &'static str,

    /// Method used by `update`
    pub update_method: UpdateMethod,

    /// Exact-match filters the backend accepts on the collection endpoint
    pub filters: &'static [&'static str],

    /// Boolean fields that can be flipped from a list row
    pub toggles: &'static [&'static str],

    /// Field declarations
    pub schema: EntitySchema,
}

impl ResourceDef {
    /// Whether `field` is a row-toggleable flag
    pub fn can_toggle(&self, field: &str) -> bool {
        self.toggles.contains(&field)
    }
}

/// The resources managed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Blog posts
    Blog,
    /// Export catalogue products
    Product,
    /// Team members
    Team,
    /// Dashboard and site users
    User,
    /// Frequently asked questions
    Faq,
    /// Job openings
    Job,
    /// Newsletter subscribers
    Newsletter,
}

impl ResourceKind {
    /// Every resource, in menu order
    pub const ALL: [Self; 7] = [
        Self::Blog,
        Self::Product,
        Self::Team,
        Self::User,
        Self::Faq,
        Self::Job,
        Self::Newsletter,
    ];

    /// Lowercase identifier used on the command line
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Product => "product",
            Self::Team => "team",
            Self::User => "user",
            Self::Faq => "faq",
            Self::Job => "job",
            Self::Newsletter => "newsletter",
        }
    }

    /// Build the definition
    pub fn def(self) -> ResourceDef {
        match self {
            Self::Blog => blog(),
            Self::Product => product(),
            Self::Team => team(),
            Self::User => user(),
            Self::Faq => faq(),
            Self::Job => job(),
            Self::Newsletter => newsletter(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_suffix('s').unwrap_or(wanted.as_str());
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted || (wanted == "member" && *kind == Self::Team))
            .ok_or_else(|| crate::Error::configuration(format!("unknown resource '{s}'")))
    }
}

fn blog() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Blog,
        label: "Blog",
        path: "blogs",
        update_method: UpdateMethod::Patch,
        filters: &["author", "isPublished"],
        toggles: &["isPublished"],
        schema: EntitySchema::new(vec![
            FieldSpec::text("title", "Title").required().min_len(3).max_len(150).column(),
            FieldSpec::new("excerpt", "Excerpt", FieldKind::LongText).max_len(300),
            FieldSpec::new("content", "Content", FieldKind::RichText).required().min_len(20),
            FieldSpec::text("author", "Author").required().column(),
            FieldSpec::new("tags", "Tags", FieldKind::Tags),
            FieldSpec::new("isPublished", "Published", FieldKind::Boolean)
                .default_value(json!(false))
                .column(),
            FieldSpec::image("coverImage", "Cover image", "coverImage").required_on_create(),
        ]),
    }
}

fn product() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Product,
        label: "Product",
        path: "products",
        update_method: UpdateMethod::Patch,
        filters: &["category", "isFeatured"],
        toggles: &["isFeatured"],
        schema: EntitySchema::new(vec![
            FieldSpec::text("name", "Name").required().max_len(150).column(),
            FieldSpec::text("category", "Category").required().column(),
            FieldSpec::new("price", "Price", FieldKind::Number)
                .default_value(json!(0))
                .column(),
            FieldSpec::new("description", "Description", FieldKind::RichText),
            FieldSpec::new("isFeatured", "Featured", FieldKind::Boolean)
                .default_value(json!(false))
                .column(),
            FieldSpec::images("images", "Images", "images").required_on_create(),
        ]),
    }
}

fn team() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Team,
        label: "Team member",
        path: "teams",
        update_method: UpdateMethod::Patch,
        filters: &[],
        toggles: &[],
        schema: EntitySchema::new(vec![
            FieldSpec::text("name", "Name").required().column(),
            FieldSpec::text("designation", "Designation").required().column(),
            FieldSpec::new("bio", "Bio", FieldKind::LongText),
            FieldSpec::new("socialLinks", "Social links", FieldKind::Object),
            FieldSpec::new("order", "Order", FieldKind::Integer)
                .default_value(json!(0))
                .column(),
            FieldSpec::image("photo", "Photo", "photo").required_on_create(),
        ]),
    }
}

fn user() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::User,
        label: "User",
        path: "users",
        update_method: UpdateMethod::Patch,
        filters: &["role", "status"],
        toggles: &[],
        schema: EntitySchema::new(vec![
            FieldSpec::text("name", "Name").required().column(),
            FieldSpec::new("email", "Email", FieldKind::Email).required().column(),
            FieldSpec::new(
                "role",
                "Role",
                FieldKind::Choice {
                    options: &["admin", "user"],
                },
            )
            .required()
            .column(),
            FieldSpec::new("password", "Password", FieldKind::Password)
                .required_on_create()
                .min_len(6),
            FieldSpec::new(
                "status",
                "Status",
                FieldKind::Choice {
                    options: &["active", "blocked"],
                },
            )
            .default_value(json!("active"))
            .column(),
            FieldSpec::new(
                "profileImage",
                "Profile image",
                FieldKind::File {
                    key: "file",
                    multiple: false,
                    accept: Accept::Images,
                },
            ),
        ]),
    }
}

fn faq() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Faq,
        label: "FAQ",
        path: "faqs",
        update_method: UpdateMethod::Patch,
        filters: &[],
        toggles: &[],
        schema: EntitySchema::new(vec![
            FieldSpec::text("question", "Question").required().column(),
            FieldSpec::new("answer", "Answer", FieldKind::LongText).required(),
            FieldSpec::new("order", "Order", FieldKind::Integer)
                .default_value(json!(0))
                .column(),
        ]),
    }
}

fn job() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Job,
        label: "Job",
        path: "jobs",
        update_method: UpdateMethod::Patch,
        filters: &["sector", "jobType", "location"],
        toggles: &["isFeatured"],
        schema: EntitySchema::new(vec![
            FieldSpec::text("title", "Title").required().max_len(150).column(),
            FieldSpec::text("sector", "Sector").required().column(),
            FieldSpec::text("location", "Location").required().column(),
            FieldSpec::new(
                "jobType",
                "Job type",
                FieldKind::Choice {
                    options: &["Full-time", "Part-time", "Contract"],
                },
            )
            .required()
            .column(),
            FieldSpec::text("salary", "Salary"),
            FieldSpec::new("description", "Description", FieldKind::RichText).required(),
            FieldSpec::new("deadline", "Deadline", FieldKind::Date),
            FieldSpec::new("isFeatured", "Featured", FieldKind::Boolean)
                .default_value(json!(false))
                .column(),
        ]),
    }
}

fn newsletter() -> ResourceDef {
    ResourceDef {
        kind: ResourceKind::Newsletter,
        label: "Subscriber",
        path: "newsletters",
        update_method: UpdateMethod::Patch,
        filters: &[],
        toggles: &[],
        schema: EntitySchema::new(vec![
            FieldSpec::new("email", "Email", FieldKind::Email).required().column(),
        ]),
    }
}
