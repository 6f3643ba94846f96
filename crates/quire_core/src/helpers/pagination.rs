//! Listing pagination

use super::truthy;
use crate::context::{RenderContext, TemplateKind};
use crate::node::Node;
use crate::render::render_template;

/// `floor(count / per_page + 0.5)`. This is half-up rounding, not ceiling
/// division: 101 posts at 5 per page give 20 pages, 92 give 18.
pub fn max_pages(count: i64, posts_per_page: i64) -> i64 {
    let per_page = posts_per_page.max(1);
    (count as f64 / per_page as f64 + 0.5).floor() as i64
}

/// Renders the theme's `pagination` template, if it has one.
pub(super) fn pagination(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    if !ctx.registry.contains("pagination") {
        return Vec::new();
    }
    render_template("pagination", ctx)
}

pub(super) fn prev(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(ctx.data.page > 1)
}

pub(super) fn next(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(ctx.data.page < ctx.max_pages())
}

pub(super) fn page(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.data.page.to_string().into_bytes()
}

/// Number of pages, never less than one.
pub(super) fn pages(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.max_pages().max(1).to_string().into_bytes()
}

/// Number of posts in the listing.
pub(super) fn total(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.data
        .listing_count
        .map(|count| count.to_string().into_bytes())
        .unwrap_or_default()
}

/// `{{page_url prev}}` / `{{page_url next}}`, relative to the listing being
/// paged. Empty when there is no such page.
pub(super) fn page_url(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(direction) = node.first_argument().map(|arg| arg.name.as_str()) else {
        return Vec::new();
    };
    let page = ctx.data.page;
    let target = match direction {
        "prev" | "pagination.prev" if page > 1 => page - 1,
        "next" | "pagination.next" if page < ctx.max_pages() => page + 1,
        _ => return Vec::new(),
    };
    let mut url = listing_base(ctx);
    if target > 1 {
        url.push_str(&format!("/page/{target}"));
    }
    url.push('/');
    url.into_bytes()
}

fn listing_base(ctx: &RenderContext<'_>) -> String {
    match ctx.template() {
        TemplateKind::Author => {
            format!("/author/{}", ctx.listing_author_slug().unwrap_or_default())
        }
        TemplateKind::Tag => format!(
            "/tag/{}",
            ctx.data.tag.as_ref().map(|tag| tag.slug.as_str()).unwrap_or_default()
        ),
        TemplateKind::Index | TemplateKind::Post => String::new(),
    }
}
