//! Built-in helpers, resolved by name when templates are compiled

mod blog;
mod content;
mod control;
mod head;
mod pagination;

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;

use crate::context::RenderContext;
use crate::node::{HelperFn, Node};

pub use pagination::max_pages;

static HELPERS: OnceLock<HashMap<&'static str, HelperFn>> = OnceLock::new();

fn table() -> &'static HashMap<&'static str, HelperFn> {
    HELPERS.get_or_init(|| {
        let entries: &[(&'static str, HelperFn)] = &[
            // general
            ("if", control::if_helper),
            ("unless", control::unless_helper),
            ("foreach", control::foreach),
            ("!<", control::extends),
            ("body", control::body),
            ("asset", blog::asset),
            ("encode", blog::encode),
            (">", control::partial),
            ("meta_title", head::meta_title),
            ("meta_description", head::meta_description),
            ("ghost_head", head::ghost_head),
            ("ghost_foot", head::ghost_foot),
            ("body_class", head::body_class),
            ("plural", content::plural),
            ("date", content::date),
            ("image", content::image),
            ("contentFor", control::content_for),
            ("block", control::block),
            // @blog
            ("@blog.title", blog::title),
            ("@blog.url", blog::url),
            ("@blog.logo", blog::logo),
            ("@blog.cover", blog::cover),
            ("@blog.description", blog::description),
            ("@blog.navigation", blog::navigation),
            // post
            ("post", control::post),
            ("excerpt", content::excerpt),
            ("title", content::title),
            ("content", content::content),
            ("post_class", head::post_class),
            ("featured", content::featured),
            ("id", content::id),
            ("post.id", content::id),
            // tag
            ("tag.name", content::tag_name),
            ("tag.slug", content::tag_slug),
            // author
            ("author", control::author),
            ("bio", content::author_bio),
            ("email", content::author_email),
            ("website", content::author_website),
            ("cover", content::author_cover),
            ("location", content::author_location),
            ("author.name", content::author_name),
            ("author.bio", content::author_bio),
            ("author.email", content::author_email),
            ("author.website", content::author_website),
            ("author.image", content::author_image),
            ("author.cover", content::author_cover),
            ("author.location", content::author_location),
            // navigation
            ("navigation", blog::navigation),
            ("label", blog::label),
            ("current", blog::current),
            ("slug", blog::slug),
            // iteration
            ("@first", content::first),
            ("@last", content::last),
            ("@even", content::even),
            ("@odd", content::odd),
            ("name", content::name),
            ("url", blog::entity_url),
            // pagination
            ("pagination", pagination::pagination),
            ("prev", pagination::prev),
            ("next", pagination::next),
            ("page", pagination::page),
            ("pages", pagination::pages),
            ("page_url", pagination::page_url),
            ("pageUrl", pagination::page_url),
            ("pagination.prev", pagination::prev),
            ("pagination.next", pagination::next),
            ("pagination.total", pagination::total),
            ("../pagination.total", pagination::total),
            // predicates
            ("posts", content::posts),
            ("tags", content::tags),
        ];
        entries.iter().copied().collect()
    })
}

/// Helper bound to `name`, or the logging no-op for unknown names.
pub fn lookup(name: &str) -> HelperFn {
    table().get(name).copied().unwrap_or(null)
}

pub fn is_builtin(name: &str) -> bool {
    table().contains_key(name)
}

/// Sorted names of every built-in helper.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = table().keys().copied().collect();
    names.sort_unstable();
    names
}

fn null(node: &Node, _ctx: &mut RenderContext<'_>) -> Vec<u8> {
    warn!(helper = %node.name, "helper is not implemented");
    Vec::new()
}

/// Marker returned by predicate helpers; any non-empty output is truthy.
fn truthy(value: bool) -> Vec<u8> {
    if value { b"1".to_vec() } else { Vec::new() }
}

/// Evaluates a node's first positional argument as a condition.
fn condition(node: &Node, ctx: &mut RenderContext<'_>) -> Option<bool> {
    let argument = node.first_argument()?;
    Some(!argument.evaluate(ctx).is_empty())
}

/// Escapes `& < > " '` unless the tag used triple braces.
fn escape(node: &Node, value: &str) -> Vec<u8> {
    if node.unescaped {
        value.as_bytes().to_vec()
    } else {
        escape_html(value).into_bytes()
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"A & B <i>"x"</i> 'y'"#),
            "A &amp; B &lt;i&gt;&quot;x&quot;&lt;/i&gt; &#39;y&#39;"
        );
    }

    #[test]
    fn table_covers_documented_names() {
        for name in [
            "if", "unless", "foreach", "!<", "body", "asset", "encode", ">", "ghost_head",
            "@blog.navigation", "post.id", "tag.slug", "author.location", "current", "@odd",
            "pageUrl", "../pagination.total", "posts", "tags",
        ] {
            assert!(is_builtin(name), "{name} should be built in");
        }
        assert!(!is_builtin("nosuchhelper"));
    }

    #[test]
    fn names_are_sorted() {
        let names = names();
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(names.len(), table().len());
    }
}
