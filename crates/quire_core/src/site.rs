//! Active theme and page rendering
//!
//! A compile builds the new registry without holding any lock and only takes
//! the write lock to swap it in. Renders clone the current `Arc` and work on
//! that snapshot, so a recompile never disturbs a render in flight.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use quire_store::{Blog, BlogStore, Post};
use tracing::{debug, info, warn};

use crate::compiler::compile_theme;
use crate::config::{QuireConfig, SiteSettings};
use crate::context::{RenderContext, RenderData, TemplateKind};
use crate::error::{RenderError, ThemeError};
use crate::registry::TemplateRegistry;
use crate::render::render_current;
use crate::theme::{candidate_order, list_themes};

pub struct Site {
    themes_dir: PathBuf,
    settings: SiteSettings,
    current: RwLock<Option<Arc<TemplateRegistry>>>,
}

impl Site {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            themes_dir: themes_dir.into(),
            settings: SiteSettings::default(),
            current: RwLock::new(None),
        }
    }

    pub fn from_config(config: &QuireConfig) -> Self {
        Self::new(config.themes_dir.clone()).with_settings(config.site.clone())
    }

    pub fn with_settings(mut self, settings: SiteSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    pub fn list_themes(&self) -> Vec<String> {
        list_themes(&self.themes_dir)
    }

    /// Compiles `themes_dir/theme` and makes it the active registry. On error
    /// the previous registry stays active.
    pub fn compile(&self, theme: &str) -> Result<Arc<TemplateRegistry>, ThemeError> {
        self.compile_dir(&self.themes_dir.join(theme))
    }

    pub fn compile_dir(&self, dir: &Path) -> Result<Arc<TemplateRegistry>, ThemeError> {
        let registry = compile_theme(dir)?;
        Ok(self.publish(registry))
    }

    pub fn publish(&self, registry: TemplateRegistry) -> Arc<TemplateRegistry> {
        let registry = Arc::new(registry);
        info!(
            theme = registry.theme(),
            templates = registry.len(),
            fingerprint = %registry.fingerprint().to_hex(),
            "theme published"
        );
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&registry));
        registry
    }

    /// Tries the preferred theme, then `fallback`, then every installed theme
    /// in name order. Returns the name of the theme that compiled.
    pub fn activate(&self, preferred: Option<&str>, fallback: &str) -> Result<String, ThemeError> {
        let available = self.list_themes();
        for name in candidate_order(preferred, fallback, &available) {
            match self.compile(&name) {
                Ok(_) => return Ok(name),
                Err(err) => warn!(theme = %name, error = %err, "theme is not usable"),
            }
        }
        Err(ThemeError::NoUsableTheme(self.themes_dir.clone()))
    }

    /// Snapshot of the active registry.
    pub fn registry(&self) -> Option<Arc<TemplateRegistry>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renders page `page` of the front page listing. Pages below one are
    /// treated as one.
    pub fn render_index(&self, store: &dyn BlogStore, page: i64) -> Result<Vec<u8>, RenderError> {
        let registry = self.snapshot()?;
        let blog = self.blog(store)?;
        let page = page.max(1);
        let (limit, offset) = page_window(&blog, page, "index")?;
        let posts = store.posts_for_index(limit, offset)?;
        ensure_page_exists(&posts, page, "index")?;

        let mut data = RenderData::new(TemplateKind::Index, blog);
        data.listing_count = Some(store.post_count()?);
        data.posts = posts;
        data.page = page;
        data.path = listing_path("", page);
        render(&registry, "index", &data)
    }

    /// Renders a single published post or page.
    pub fn render_post(&self, store: &dyn BlogStore, slug: &str) -> Result<Vec<u8>, RenderError> {
        let registry = self.snapshot()?;
        let post = store
            .post_by_slug(slug)?
            .filter(|post| post.is_published)
            .ok_or_else(|| RenderError::NotFound(format!("post '{slug}'")))?;
        let template = post_template(&registry, &post);
        let blog = self.blog(store)?;

        let mut data = RenderData::new(TemplateKind::Post, blog);
        data.path = format!("/{}/", post.slug);
        data.posts = vec![post];
        render(&registry, &template, &data)
    }

    pub fn render_tag(
        &self,
        store: &dyn BlogStore,
        slug: &str,
        page: i64,
    ) -> Result<Vec<u8>, RenderError> {
        let registry = self.snapshot()?;
        let tag = store
            .tag_by_slug(slug)?
            .ok_or_else(|| RenderError::NotFound(format!("tag '{slug}'")))?;
        let blog = self.blog(store)?;
        let page = page.max(1);
        let (limit, offset) = page_window(&blog, page, slug)?;
        let posts = store.posts_by_tag(tag.id, limit, offset)?;
        ensure_page_exists(&posts, page, slug)?;

        let mut data = RenderData::new(TemplateKind::Tag, blog);
        data.listing_count = Some(store.post_count_by_tag(tag.id)?);
        data.posts = posts;
        data.page = page;
        data.path = listing_path(&format!("/tag/{}", tag.slug), page);
        data.tag = Some(tag);
        render(&registry, listing_template(&registry, "tag"), &data)
    }

    pub fn render_author(
        &self,
        store: &dyn BlogStore,
        slug: &str,
        page: i64,
    ) -> Result<Vec<u8>, RenderError> {
        let registry = self.snapshot()?;
        let author = store
            .author_by_slug(slug)?
            .ok_or_else(|| RenderError::NotFound(format!("author '{slug}'")))?;
        let blog = self.blog(store)?;
        let page = page.max(1);
        let (limit, offset) = page_window(&blog, page, slug)?;
        let posts = store.posts_by_author(author.id, limit, offset)?;
        ensure_page_exists(&posts, page, slug)?;

        let mut data = RenderData::new(TemplateKind::Author, blog);
        data.listing_count = Some(store.post_count_by_author(author.id)?);
        data.posts = posts;
        data.page = page;
        data.path = listing_path(&format!("/author/{}", author.slug), page);
        data.author = Some(author);
        render(&registry, listing_template(&registry, "author"), &data)
    }

    fn snapshot(&self) -> Result<Arc<TemplateRegistry>, RenderError> {
        self.registry().ok_or(RenderError::NoTheme)
    }

    fn blog(&self, store: &dyn BlogStore) -> Result<Blog, RenderError> {
        let mut blog = store.blog()?;
        self.settings.apply(&mut blog);
        Ok(blog)
    }
}

fn render(
    registry: &TemplateRegistry,
    name: &str,
    data: &RenderData,
) -> Result<Vec<u8>, RenderError> {
    let root = registry
        .get(name)
        .ok_or_else(|| RenderError::MissingTemplate(name.to_string()))?;
    debug!(template = name, path = %data.path, "rendering");
    let mut ctx = RenderContext::new(data, registry);
    Ok(render_current(root, &mut ctx))
}

/// `page-{slug}` if the theme has it, `page` for pages, otherwise `post`.
fn post_template(registry: &TemplateRegistry, post: &Post) -> String {
    let custom = format!("page-{}", post.slug);
    if registry.contains(&custom) {
        custom
    } else if post.is_page && registry.contains("page") {
        "page".to_string()
    } else {
        "post".to_string()
    }
}

fn listing_template<'a>(registry: &TemplateRegistry, preferred: &'a str) -> &'a str {
    if registry.contains(preferred) {
        preferred
    } else {
        "index"
    }
}

/// `(limit, offset)` for a one-based page. A page whose offset does not fit
/// in an `i64` does not exist.
fn page_window(blog: &Blog, page: i64, listing: &str) -> Result<(i64, i64), RenderError> {
    let per_page = blog.posts_per_page.max(1);
    let offset = page
        .checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(per_page))
        .ok_or_else(|| page_not_found(page, listing))?;
    Ok((per_page, offset))
}

fn ensure_page_exists(posts: &[Post], page: i64, listing: &str) -> Result<(), RenderError> {
    if page > 1 && posts.is_empty() {
        return Err(page_not_found(page, listing));
    }
    Ok(())
}

fn page_not_found(page: i64, listing: &str) -> RenderError {
    RenderError::NotFound(format!("page {page} of {listing}"))
}

fn listing_path(base: &str, page: i64) -> String {
    if page > 1 {
        format!("{base}/page/{page}/")
    } else {
        format!("{base}/")
    }
}
