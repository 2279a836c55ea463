//! Rich-text sanitization
//!
//! Rich text (blog bodies, job descriptions) is cleaned when it is written and
//! again when it is projected for display. [`TrustedHtml`] can only be built by
//! running the cleaner, so render paths cannot accept raw markup by accident.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "b", "strong", "i", "em", "u", "s",
    "del", "blockquote", "code", "pre", "ul", "ol", "li", "a", "img", "table", "thead", "tbody",
    "tr", "th", "td", "span", "div", "figure", "figcaption",
];

const ALLOWED_ATTRIBUTES: &[&str] = &["src", "href", "alt", "title", "class", "width", "height"];

/// HTML that has passed through the allow-list cleaner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    /// Clean arbitrary markup
    pub fn sanitize(input: &str) -> Self {
        Self(clean_rich_text(input))
    }

    /// The cleaned markup
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the cleaned markup
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the cleaned markup is empty
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove scripting and non allow-listed markup from rich text
///
/// Links get `rel="nofollow noopener"`; `javascript:` URLs, event handler
/// attributes, `<script>`/`<style>` contents and comments are dropped.
pub fn clean_rich_text(input: &str) -> String {
    ammonia::Builder::default()
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
        .link_rel(Some("nofollow noopener"))
        .strip_comments(true)
        .clean(input)
        .to_string()
}

/// Strip all HTML tags from input, leaving the text content
pub fn strip_all_html(input: &str) -> String {
    ammonia::Builder::empty().clean(input).to_string()
}

/// Number of visible characters in rich text
///
/// Entities count as the character they encode, so `&amp;` is one.
pub fn text_length(input: &str) -> usize {
    let text = strip_all_html(input);
    html_escape::decode_html_entities(&text)
        .trim()
        .chars()
        .count()
}
