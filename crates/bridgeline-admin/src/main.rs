//! Bridgeline admin command line
//!
//! Operator tool for browsing and editing the resources managed by the
//! Bridgeline backend, built on the same controllers as the dashboard.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::{Context, Result, anyhow, bail};
use bridgeline_admin::{DetailView, DisplayValue, ListView, MutationForm, Notifier};
use bridgeline_client::{AuthContext, MemoryResource, ResourceService};
use bridgeline_core::schema::{FieldKind, Requirement};
use bridgeline_core::utils::truncate;
use bridgeline_core::{Config, Entity, FieldInput, Fields, LocalFile, ResourceKind};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Command line interface for the Bridgeline admin
#[derive(Parser)]
#[command(
    name = "bridgeline-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Manage Bridgeline blogs, products, team members, users, FAQs, jobs and newsletters",
    long_about = "Operator tool for the Bridgeline admin backend. Lists, inspects, creates, edits, toggles and deletes resources through the same validation and payload rules as the dashboard."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Use an in-process backend seeded with sample records
    #[arg(long)]
    offline: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List one page of a resource
    List {
        /// Resource name (blogs, products, team, users, faqs, jobs, newsletters)
        resource: ResourceKind,

        /// Page to show
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<u32>,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Exact-match filter, repeatable
        #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_pair)]
        filter: Vec<(String, String)>,
    },

    /// Show one entity
    Get {
        /// Resource name
        resource: ResourceKind,

        /// Entity id
        id: String,
    },

    /// Create an entity
    Create {
        /// Resource name
        resource: ResourceKind,

        /// Field value, repeatable
        #[arg(short, long, value_name = "FIELD=VALUE", value_parser = parse_pair)]
        set: Vec<(String, String)>,

        /// File to upload into a file field, repeatable
        #[arg(short, long, value_name = "FIELD=PATH", value_parser = parse_pair)]
        file: Vec<(String, String)>,
    },

    /// Edit an entity
    Update {
        /// Resource name
        resource: ResourceKind,

        /// Entity id
        id: String,

        /// Field value, repeatable
        #[arg(short, long, value_name = "FIELD=VALUE", value_parser = parse_pair)]
        set: Vec<(String, String)>,

        /// File to upload into a file field, repeatable
        #[arg(short, long, value_name = "FIELD=PATH", value_parser = parse_pair)]
        file: Vec<(String, String)>,
    },

    /// Delete an entity after confirmation
    Delete {
        /// Resource name
        resource: ResourceKind,

        /// Entity id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Flip a boolean flag such as `isFeatured`
    Toggle {
        /// Resource name
        resource: ResourceKind,

        /// Entity id
        id: String,

        /// Flag field
        field: String,
    },

    /// Describe the fields of a resource
    Schema {
        /// Resource name
        resource: ResourceKind,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        // It's okay if .env doesn't exist
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();

    let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    bridgeline_core::init_logging(level, cli.json || config.logging.format == "json")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        offline = cli.offline,
        "Bridgeline admin starting"
    );

    let notifier = Notifier::new();
    let result = run(&cli, &config, &notifier).await;

    for notification in notifier.drain() {
        eprintln!("[{:?}] {}", notification.level, notification.message);
    }
    result
}

async fn run(cli: &Cli, config: &Config, notifier: &Notifier) -> Result<()> {
    match &cli.command {
        Commands::List {
            resource,
            page,
            limit,
            search,
            filter,
        } => {
            let service = open_service(cli, config, *resource)?;
            let view = ListView::new(service, &config.list, notifier.clone());
            list(&view, *page, *limit, search.as_deref(), filter).await
        }
        Commands::Get { resource, id } => {
            let service = open_service(cli, config, *resource)?;
            show_detail(&DetailView::new(service, id.clone(), notifier.clone())).await
        }
        Commands::Create {
            resource,
            set,
            file,
        } => {
            let service = open_service(cli, config, *resource)?;
            let form = MutationForm::create(service, config.uploads.clone(), notifier.clone());
            fill_form(&form, set, file)?;
            submit(&form).await
        }
        Commands::Update {
            resource,
            id,
            set,
            file,
        } => {
            let service = open_service(cli, config, *resource)?;
            let form =
                MutationForm::edit(service, id, config.uploads.clone(), notifier.clone()).await?;
            fill_form(&form, set, file)?;
            submit(&form).await
        }
        Commands::Delete { resource, id, yes } => {
            let service = open_service(cli, config, *resource)?;
            let view = ListView::new(service, &config.list, notifier.clone());
            view.request_delete(id.clone());
            if *yes || confirm(&format!("Delete {} {id}?", resource.def().label)).await? {
                view.confirm_delete().await?;
                println!("Deleted {id}");
            } else {
                view.cancel_delete();
                println!("Cancelled");
            }
            Ok(())
        }
        Commands::Toggle {
            resource,
            id,
            field,
        } => {
            let service = open_service(cli, config, *resource)?;
            let entity = service.get_one(id).await?;
            let current = entity.flag(field);
            let view = ListView::new(service, &config.list, notifier.clone());
            view.toggle_flag_with(id, field, current).await?;
            let flag = !current;
            println!("{field} = {flag}");
            Ok(())
        }
        Commands::Schema { resource } => {
            print_schema(*resource);
            Ok(())
        }
        Commands::Config { show } => {
            if *show {
                println!("{}", toml::to_string_pretty(config).context("Failed to serialize configuration")?);
            } else {
                println!("Configuration is valid");
            }
            Ok(())
        }
    }
}

/// Build the resource service for `kind`
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
fn open_service(cli: &Cli, config: &Config, kind: ResourceKind) -> Result<Arc<dyn ResourceService>> {
    if cli.offline {
        let memory = MemoryResource::new(kind.def());
        seed_sample_rows(&memory, kind);
        warn!(resource = kind.as_str(), "Offline mode: changes are not persisted");
        return Ok(Arc::new(memory));
    }
    let auth = AuthContext::from_config(&config.auth);
    if !auth.is_authenticated() {
        warn!("No credentials configured; protected endpoints will reject requests");
    }
    let rest = bridgeline_client::connect(config, auth, kind)
        .with_context(|| format!("Failed to connect to {}", config.api.base_url))?;
    Ok(Arc::new(rest))
}

/// Insert a few records built from the schema's required fields
fn seed_sample_rows(memory: &MemoryResource, kind: ResourceKind) {
    let def = kind.def();
    for n in 1..=3 {
        let mut fields = Fields::new();
        for spec in def.schema.fields() {
            let value = match spec.kind {
                FieldKind::Email => Value::from(format!("sample{n}@bridgeline.local")),
                FieldKind::Choice { options } => options
                    .first()
                    .map_or(Value::Null, |option| Value::from(*option)),
                FieldKind::Boolean => Value::Bool(n == 1),
                FieldKind::Number | FieldKind::Integer => Value::from(n),
                FieldKind::Password | FieldKind::File { .. } => continue,
                _ if spec.requirement == Requirement::Required => {
                    Value::from(format!("Sample {} {n}", spec.label.to_lowercase()))
                }
                _ => continue,
            };
            fields.insert(spec.name.to_string(), value);
        }
        memory.insert(fields);
    }
}

async fn list(
    view: &ListView,
    page: u32,
    limit: Option<u32>,
    search: Option<&str>,
    filters: &[(String, String)],
) -> Result<()> {
    if let Some(limit) = limit {
        view.set_limit(limit).await?;
    }
    for (key, value) in filters {
        view.set_filter(key.clone(), value.clone()).await?;
    }
    if let Some(term) = search {
        view.set_search_term(term);
        view.settle().await;
    }
    // page last: the changes above reset it to 1, and clamping needs meta
    view.refresh().await?;
    if page != 1 {
        view.set_page(page).await?;
    }

    let snapshot = view.snapshot();
    if let Some(error) = snapshot.error {
        bail!(error);
    }

    let columns: Vec<_> = view.def().schema.columns().collect();
    let header: Vec<&str> = std::iter::once("id")
        .chain(columns.iter().map(|spec| spec.label))
        .collect();
    println!("{}", header.join(" | "));
    for row in &snapshot.rows {
        let cells: Vec<String> = std::iter::once(row.id.clone())
            .chain(columns.iter().map(|spec| cell(row, spec.name)))
            .collect();
        println!("{}", cells.join(" | "));
    }
    if let Some(meta) = snapshot.meta {
        println!(
            "page {}/{} ({} total)",
            meta.page,
            meta.last_page(),
            meta.total
        );
    }
    Ok(())
}

fn cell(row: &Entity, field: &str) -> String {
    match row.get(field) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(text)) => truncate(text, 40),
        Some(other) => truncate(&other.to_string(), 40),
    }
}

async fn show_detail(view: &DetailView) -> Result<()> {
    view.load().await?;
    let fields = view
        .fields()
        .ok_or_else(|| anyhow!("entity did not load"))?;
    for field in fields {
        let rendered = match field.value {
            DisplayValue::Empty => "-".to_string(),
            DisplayValue::Text(text) | DisplayValue::Json(text) => text,
            DisplayValue::Html(html) => html.into_inner(),
            DisplayValue::Flag(flag) => flag.to_string(),
            DisplayValue::List(items) | DisplayValue::Files(items) => items.join(", "),
        };
        println!("{:>16}: {rendered}", field.label);
    }
    Ok(())
}

/// Apply `--set` and `--file` arguments to a form
///
/// # Errors
///
/// Returns error for unknown fields, unreadable files or malformed JSON
fn fill_form(
    form: &MutationForm,
    values: &[(String, String)],
    files: &[(String, String)],
) -> Result<()> {
    let def = form.def();
    for (name, raw) in values {
        let spec = def
            .schema
            .field(name)
            .ok_or_else(|| anyhow!("{} has no field named {name}", def.label))?;
        let input = match spec.kind {
            FieldKind::Boolean => FieldInput::Flag(
                raw.parse()
                    .with_context(|| format!("{name} expects true or false"))?,
            ),
            FieldKind::Object => FieldInput::Structured(
                serde_json::from_str(raw).with_context(|| format!("{name} expects a JSON object"))?,
            ),
            _ => FieldInput::Text(raw.clone()),
        };
        form.set(name.clone(), input);
    }
    for (name, path) in files {
        if !def.schema.field(name).is_some_and(|spec| spec.kind.is_file()) {
            bail!("{} has no file field named {name}", def.label);
        }
        let file = LocalFile::from_path(Path::new(path))
            .with_context(|| format!("Failed to read {path}"))?;
        form.add_file(name, file);
    }
    Ok(())
}

async fn submit(form: &MutationForm) -> Result<()> {
    match form.submit().await {
        Ok(entity) => {
            println!("{}", serde_json::to_string_pretty(&entity)?);
            Ok(())
        }
        Err(e) => {
            for (field, message) in form.field_errors() {
                eprintln!("{field}: {message}");
            }
            Err(e.into())
        }
    }
}

async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_schema(kind: ResourceKind) {
    let def = kind.def();
    println!("{} (/{})", def.label, def.path);
    for spec in def.schema.fields() {
        let requirement = match spec.requirement {
            Requirement::Required => "required",
            Requirement::RequiredOnCreate => "required on create",
            Requirement::Optional => "optional",
        };
        let kind = match spec.kind {
            FieldKind::Choice { options } => format!("one of {}", options.join("/")),
            FieldKind::File { key, multiple, .. } => {
                format!("file{} under '{key}'", if multiple { "s" } else { "" })
            }
            other => serde_json::to_value(other)
                .ok()
                .and_then(|value| value.get("type").and_then(Value::as_str).map(ToString::to_string))
                .unwrap_or_default(),
        };
        println!("  {:<14} {kind:<24} {requirement}", spec.name);
    }
    if !def.toggles.is_empty() {
        println!("  toggles: {}", def.toggles.join(", "));
    }
}

/// Parse a `KEY=VALUE` argument
fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
