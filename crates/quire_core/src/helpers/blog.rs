//! `@blog` fields, navigation and URLs

use std::sync::OnceLock;

use quire_store::Blog;
use regex::Regex;

use super::{escape, truthy};
use crate::context::{ContextKind, RenderContext};
use crate::node::Node;
use crate::render::render_template;

static PAGE_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn blog_field(node: &Node, ctx: &RenderContext<'_>, field: fn(&Blog) -> &str) -> Vec<u8> {
    escape(node, field(ctx.blog()))
}

pub(super) fn title(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    blog_field(node, ctx, |blog| &blog.title)
}

pub(super) fn description(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    blog_field(node, ctx, |blog| &blog.description)
}

pub(super) fn logo(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    blog_field(node, ctx, |blog| &blog.logo)
}

pub(super) fn cover(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    blog_field(node, ctx, |blog| &blog.cover)
}

/// The blog url with a trailing slash.
pub(super) fn url(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    escape(node, &format!("{}/", ctx.blog().url))
}

/// `{{asset "css/screen.css"}}`
pub(super) fn asset(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(path) = node.first_argument() else {
        return Vec::new();
    };
    let base = &ctx.blog().asset_path;
    let path = if base.ends_with('/') {
        path.name.trim_start_matches('/')
    } else {
        path.name.as_str()
    };
    format!("{base}{path}").into_bytes()
}

/// Query-escapes the output of its argument.
pub(super) fn encode(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(argument) = node.first_argument() else {
        return Vec::new();
    };
    let raw = argument.evaluate(ctx);
    query_escape(&String::from_utf8_lossy(&raw)).into_bytes()
}

/// Form-style escaping: unreserved characters stay, spaces become `+` and
/// everything else is percent-encoded. A literal `+` is already `%2B` by the
/// time spaces are swapped.
fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Renders the theme's `navigation` template when the blog has items.
pub(super) fn navigation(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    if ctx.blog().navigation.is_empty() || !ctx.registry.contains("navigation") {
        return Vec::new();
    }
    render_template("navigation", ctx)
}

pub(super) fn label(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.current_navigation()
        .map(|item| escape(node, &item.label))
        .unwrap_or_default()
}

pub(super) fn slug(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.current_navigation()
        .map(|item| escape(node, &item.slug))
        .unwrap_or_default()
}

/// True when the navigation item points at the page being rendered. Paging
/// suffixes are ignored, so `/tag/news/page/3/` matches `/tag/news/`.
pub(super) fn current(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(item) = ctx.current_navigation() else {
        return Vec::new();
    };
    let mut target = item.url.clone();
    if !target.ends_with('/') {
        target.push('/');
    }
    let suffix =
        PAGE_SUFFIX.get_or_init(|| Regex::new(r"/page/[0-9]+/$").expect("page suffix pattern"));
    let path = suffix.replace(&ctx.data.path, "/");
    truthy(path == target)
}

/// `{{url}}` for the entity in scope; `absolute="true"` prefixes the blog url
/// unless a navigation url is already absolute.
pub(super) fn entity_url(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let path = match ctx.context {
        ContextKind::Post => ctx.current_post().map(|post| format!("/{}/", post.slug)),
        ContextKind::Author => ctx
            .current_author()
            .map(|author| format!("/author/{}/", author.slug)),
        ContextKind::Tag => ctx
            .current_post_tag()
            .or(ctx.data.tag.as_ref())
            .map(|tag| format!("/tag/{}/", tag.slug)),
        ContextKind::Navigation => ctx.current_navigation().map(|item| item.url.clone()),
        ContextKind::Index => None,
    };
    let Some(path) = path else {
        return Vec::new();
    };
    let external = path.starts_with("http://") || path.starts_with("https://");
    if node.keyed("absolute") == Some("true") && !external {
        return escape(node, &format!("{}{}", ctx.blog().url, path));
    }
    escape(node, &path)
}
