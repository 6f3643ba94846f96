//! Blog entities handed to the renderer

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationItem {
    pub label: String,
    pub url: String,
    pub slug: String,
}

impl NavigationItem {
    pub fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
            slug: slugify(label),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Blog {
    pub url: String,
    pub title: String,
    pub description: String,
    pub logo: String,
    pub cover: String,
    pub asset_path: String,
    pub post_count: i64,
    pub posts_per_page: i64,
    pub active_theme: String,
    pub navigation: Vec<NavigationItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub email: String,
    pub image: String,
    pub cover: String,
    pub bio: String,
    pub website: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default)]
pub struct Post {
    pub id: i64,
    pub uuid: String,
    pub title: String,
    pub slug: String,
    pub html: String,
    pub is_featured: bool,
    pub is_page: bool,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
    pub author: Option<Author>,
    pub meta_description: String,
    pub image: String,
}

const MAX_SLUG_CHARS: usize = 75;

/// Lowercases `input` and keeps letters, digits and `_`; spaces, `-` and `/`
/// become `-`. Long slugs are cut at a dash in the upper half of the limit
/// when one exists.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let mut chars: Vec<char> = lowered
        .chars()
        .filter_map(|ch| match ch {
            ' ' | '-' | '/' => Some('-'),
            '_' => Some('_'),
            ch if ch.is_alphanumeric() => Some(ch),
            _ => None,
        })
        .collect();
    if chars.len() > MAX_SLUG_CHARS {
        chars.truncate(MAX_SLUG_CHARS);
        let floor = MAX_SLUG_CHARS - MAX_SLUG_CHARS / 2;
        if let Some(cut) = (floor + 1..MAX_SLUG_CHARS)
            .rev()
            .find(|&idx| chars[idx] == '-')
        {
            chars.truncate(cut);
        }
    }
    chars.into_iter().collect()
}
