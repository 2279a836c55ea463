//! Utility functions for the Bridgeline admin

use std::path::Path;

/// Lower-cased extension of a file name, if any
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Validate file extension against an allow-list (case-insensitive)
#[must_use]
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> bool {
    file_extension(filename).is_some_and(|ext| {
        allowed
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
    })
}

/// Guess a MIME type from the file extension
#[must_use]
pub fn guess_mime(filename: &str) -> &'static str {
    match file_extension(filename).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Sanitize filename for safe upload
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized = filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric, dots, underscores, and hyphens
                c if c.is_alphanumeric() || c == '.' || c == '_' || c == '-' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}

/// Format a byte count for humans (`1.5 MB`)
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let label = UNITS.get(unit).copied().unwrap_or("B");
    if unit == 0 {
        format!("{bytes} {label}")
    } else {
        format!("{value:.1} {label}")
    }
}

/// Truncate text to `max` characters, appending an ellipsis when cut
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
