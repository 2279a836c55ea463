//! Admin resource manager controllers
//!
//! One generic set of controllers serves every resource kind: a
//! [`ListView`] for browsing, a [`MutationForm`] for create and edit, a
//! [`DetailView`] for read-only display and a [`DeletionConfirmation`] gate
//! in front of removal. All of them talk to the backend through
//! [`bridgeline_client::ResourceService`] and report outcomes to a shared
//! [`Notifier`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod debounce;
pub mod deletion;
pub mod detail;
pub mod form;
pub mod list_view;
pub mod notify;
pub mod rich_text;
pub mod sequence;

pub use debounce::Debouncer;
pub use deletion::DeletionConfirmation;
pub use detail::{DetailState, DetailView, DisplayField, DisplayValue};
pub use form::{FormTarget, MutationForm};
pub use list_view::{ListSnapshot, ListStatus, ListView};
pub use notify::{Level, Notification, Notifier};
pub use rich_text::{BufferEditor, RichTextEditor};
pub use sequence::FetchSequencer;
