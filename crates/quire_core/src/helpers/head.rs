//! Document head metadata and page classes

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::warn;

use super::escape;
use crate::context::{ContextKind, RenderContext, TemplateKind};
use crate::node::Node;

pub(super) fn meta_title(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    escape(node, &page_title(ctx))
}

fn page_title(ctx: &RenderContext<'_>) -> String {
    let blog_title = &ctx.blog().title;
    match ctx.template() {
        TemplateKind::Post => ctx
            .current_post()
            .map(|post| post.title.clone())
            .unwrap_or_default(),
        TemplateKind::Author => match ctx.data.author.as_ref().or(ctx.current_author()) {
            Some(author) => format!("{} - {blog_title}", author.name),
            None => blog_title.clone(),
        },
        TemplateKind::Tag => match ctx.data.tag.as_ref() {
            Some(tag) => format!("{} - {blog_title}", tag.name),
            None => blog_title.clone(),
        },
        TemplateKind::Index => blog_title.clone(),
    }
}

pub(super) fn meta_description(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    escape(node, &page_description(ctx))
}

fn page_description(ctx: &RenderContext<'_>) -> String {
    if ctx.template() == TemplateKind::Post || ctx.context == ContextKind::Post {
        return ctx
            .current_post()
            .map(|post| post.meta_description.clone())
            .unwrap_or_default();
    }
    ctx.blog().description.clone()
}

fn page_image(ctx: &RenderContext<'_>) -> String {
    match ctx.context {
        ContextKind::Post => ctx.current_post().map(|post| post.image.clone()),
        ContextKind::Author => ctx.current_author().map(|author| author.image.clone()),
        _ => None,
    }
    .unwrap_or_default()
}

/// Canonical link, OpenGraph and Twitter meta tags sorted by property, and a
/// JSON-LD description of the page.
pub(super) fn ghost_head(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let text = |value: &str| String::from_utf8_lossy(&escape(node, value)).into_owned();
    let blog = ctx.blog();
    let url = format!("{}{}", text(&blog.url), ctx.data.path);
    let site = text(&blog.title);
    let title = text(&page_title(ctx));
    let description = text(&page_description(ctx));
    let image = text(&page_image(ctx));

    let mut meta: BTreeMap<&str, String> = BTreeMap::new();
    meta.insert("og:site_name", site.clone());
    meta.insert("og:type", "website".to_string());
    meta.insert("og:title", title.clone());
    meta.insert("og:description", description.clone());
    meta.insert("og:url", url.clone());
    meta.insert("og:image", image.clone());
    meta.insert("twitter:card", "summary".to_string());
    meta.insert("twitter:title", title.clone());
    meta.insert("twitter:description", description.clone());
    meta.insert("twitter:url", url.clone());
    meta.insert("twitter:image:src", image.clone());

    let mut schema: BTreeMap<&str, String> = BTreeMap::new();
    schema.insert("@context", "http://schema.org".to_string());
    schema.insert("@type", "Website".to_string());
    schema.insert("publisher", site);
    schema.insert("headline", title);
    schema.insert("url", url.clone());
    schema.insert("image", image);
    schema.insert("description", description);

    match ctx.template() {
        TemplateKind::Post => {
            let published = ctx
                .current_post()
                .and_then(|post| post.published_at)
                .map(|date| date.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_default();
            meta.insert("og:type", "article".to_string());
            meta.insert("article:published_time", published.clone());
            schema.insert("@type", "Article".to_string());
            schema.insert("datePublished", published);
        }
        TemplateKind::Tag => {
            schema.insert("@type", "Series".to_string());
        }
        TemplateKind::Author => {
            meta.insert("og:type", "profile".to_string());
            schema.insert("@type", "Person".to_string());
        }
        TemplateKind::Index => {}
    }

    let mut output = format!("<link rel=\"canonical\" href=\"{url}\">\n").into_bytes();
    for (property, content) in &meta {
        output.extend_from_slice(
            format!("<meta property=\"{property}\" content=\"{content}\">\n").as_bytes(),
        );
    }
    output.extend_from_slice(b"<script type=\"application/ld+json\">\n");
    {
        let mut serializer =
            Serializer::with_formatter(&mut output, PrettyFormatter::with_indent(b"    "));
        if let Err(err) = schema.serialize(&mut serializer) {
            warn!(error = %err, "failed to serialize structured data");
        }
    }
    output.extend_from_slice(b"\n</script>\n");
    output
}

pub(super) fn ghost_foot(_node: &Node, _ctx: &mut RenderContext<'_>) -> Vec<u8> {
    Vec::new()
}

pub(super) fn body_class(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let paged = ctx.data.page > 1;
    let class = match ctx.template() {
        TemplateKind::Post => {
            let mut class = String::from("post-template");
            if let Some(post) = ctx.current_post() {
                if post.is_page {
                    class.push_str(" page-template page");
                }
                for tag in &post.tags {
                    class.push_str(" tag-");
                    class.push_str(&tag.slug);
                }
            }
            class
        }
        TemplateKind::Index if paged => "paged archive-template".to_string(),
        TemplateKind::Index => "home-template".to_string(),
        TemplateKind::Author => {
            let slug = ctx.listing_author_slug().unwrap_or_default();
            listing_class(format!("author-template author-{slug}"), paged)
        }
        TemplateKind::Tag => {
            let slug = ctx.data.tag.as_ref().map(|tag| tag.slug.as_str()).unwrap_or_default();
            listing_class(format!("tag-template tag-{slug}"), paged)
        }
    };
    class.into_bytes()
}

fn listing_class(mut class: String, paged: bool) -> String {
    if paged {
        class.push_str(" paged archive-template");
    }
    class
}

pub(super) fn post_class(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let mut class = String::from("post");
    if let Some(post) = ctx.current_post() {
        if post.is_featured {
            class.push_str(" featured");
        }
        if post.is_page {
            class.push_str(" page");
        }
        for tag in &post.tags {
            class.push_str(" tag-");
            class.push_str(&tag.slug);
        }
    }
    escape(node, &class)
}
