//! Theme discovery

use std::fs;
use std::path::Path;

use tracing::debug;

/// Names of the sub-directories of `themes_dir`, sorted. An unreadable
/// directory has no themes.
pub fn list_themes(themes_dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(themes_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %themes_dir.display(), error = %err, "cannot list themes");
            return Vec::new();
        }
    };
    let mut themes: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    themes.sort();
    themes
}

/// Order in which themes are tried: the preferred theme, the fallback, then
/// everything else that is installed. Names appear once.
pub fn candidate_order(
    preferred: Option<&str>,
    fallback: &str,
    available: &[String],
) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let named = preferred
        .into_iter()
        .chain(std::iter::once(fallback))
        .chain(available.iter().map(String::as_str));
    for name in named {
        if !name.is_empty() && !order.iter().any(|seen| seen == name) {
            order.push(name.to_string());
        }
    }
    order
}
