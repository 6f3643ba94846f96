//! Per-render state threaded through helpers

use chrono::{DateTime, Utc};
use quire_store::{Author, Blog, NavigationItem, Post, Tag};

use crate::helpers::max_pages;
use crate::node::Node;
use crate::registry::TemplateRegistry;

/// Nesting limit for layouts and partials.
pub const MAX_DEPTH: usize = 16;

/// Which page type is being rendered. Fixed for the whole render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Index,
    Post,
    Tag,
    Author,
}

/// What the helpers currently look at. Changes inside block helpers, e.g. an
/// `{{#author}}` block on an index page switches to `Author`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Index,
    Post,
    Tag,
    Author,
    Navigation,
}

/// Everything a render reads, fetched before rendering starts.
#[derive(Debug, Clone)]
pub struct RenderData {
    pub template: TemplateKind,
    pub blog: Blog,
    pub posts: Vec<Post>,
    pub tag: Option<Tag>,
    pub author: Option<Author>,
    pub page: i64,
    /// Number of posts in the whole listing; `None` outside listings.
    pub listing_count: Option<i64>,
    pub path: String,
    pub now: DateTime<Utc>,
}

impl RenderData {
    pub fn new(template: TemplateKind, blog: Blog) -> Self {
        Self {
            template,
            blog,
            posts: Vec::new(),
            tag: None,
            author: None,
            page: 1,
            listing_count: None,
            path: "/".to_string(),
            now: Utc::now(),
        }
    }
}

pub struct RenderContext<'a> {
    pub data: &'a RenderData,
    pub registry: &'a TemplateRegistry,
    pub context: ContextKind,
    pub post_index: usize,
    pub tag_index: usize,
    pub navigation_index: usize,
    pub(crate) content_for: Vec<Node>,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(data: &'a RenderData, registry: &'a TemplateRegistry) -> Self {
        let context = match data.template {
            TemplateKind::Post => ContextKind::Post,
            _ => ContextKind::Index,
        };
        Self {
            data,
            registry,
            context,
            post_index: 0,
            tag_index: 0,
            navigation_index: 0,
            content_for: Vec::new(),
            depth: 0,
        }
    }

    pub fn blog(&self) -> &'a Blog {
        &self.data.blog
    }

    pub fn template(&self) -> TemplateKind {
        self.data.template
    }

    pub fn current_post(&self) -> Option<&'a Post> {
        self.data.posts.get(self.post_index)
    }

    /// Tag under the tag cursor of the current post.
    pub fn current_post_tag(&self) -> Option<&'a Tag> {
        self.current_post()?.tags.get(self.tag_index)
    }

    /// The author of the current post, or the author a listing is for.
    pub fn current_author(&self) -> Option<&'a Author> {
        self.current_post()
            .and_then(|post| post.author.as_ref())
            .or(self.data.author.as_ref())
    }

    pub fn current_navigation(&self) -> Option<&'a NavigationItem> {
        self.data.blog.navigation.get(self.navigation_index)
    }

    /// Slug of the author a listing belongs to.
    pub fn listing_author_slug(&self) -> Option<&'a str> {
        self.data
            .author
            .as_ref()
            .or_else(|| self.current_post().and_then(|post| post.author.as_ref()))
            .map(|author| author.slug.as_str())
    }

    /// Pages in the current listing, rounded half-up.
    pub fn max_pages(&self) -> i64 {
        let count = self.data.listing_count.unwrap_or(0);
        max_pages(count, self.data.blog.posts_per_page)
    }

    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
