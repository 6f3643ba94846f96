//! Post, tag and author fields plus iteration predicates

use std::sync::OnceLock;

use quire_store::{Author, Post, Tag};
use regex::Regex;
use tracing::debug;

use super::{escape, truthy};
use crate::context::{ContextKind, RenderContext};
use crate::date::{DEFAULT_FORMAT, format_date, time_ago};
use crate::node::Node;

const DEFAULT_EXCERPT_WORDS: usize = 50;

static HTML_TAG: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn post_field(node: &Node, ctx: &RenderContext<'_>, field: fn(&Post) -> &str) -> Vec<u8> {
    ctx.current_post()
        .map(|post| escape(node, field(post)))
        .unwrap_or_default()
}

fn author_field(node: &Node, ctx: &RenderContext<'_>, field: fn(&Author) -> &str) -> Vec<u8> {
    ctx.current_author()
        .map(|author| escape(node, field(author)))
        .unwrap_or_default()
}

pub(super) fn title(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    post_field(node, ctx, |post| &post.title)
}

/// Post HTML is emitted as is.
pub(super) fn content(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.current_post()
        .map(|post| post.html.as_bytes().to_vec())
        .unwrap_or_default()
}

pub(super) fn id(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.current_post()
        .map(|post| post.id.to_string().into_bytes())
        .unwrap_or_default()
}

pub(super) fn featured(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(ctx.current_post().is_some_and(|post| post.is_featured))
}

pub(super) fn posts(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(!ctx.data.posts.is_empty())
}

/// Plain text excerpt of the current post: `words="N"` or `characters="N"`,
/// 50 words by default. Only meaningful in post context.
pub(super) fn excerpt(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    if ctx.context != ContextKind::Post {
        return Vec::new();
    }
    let Some(post) = ctx.current_post() else {
        return Vec::new();
    };
    let text = strip_tags(&post.html);
    if let Some(count) = node.keyed("characters").and_then(|value| value.parse().ok()) {
        return text.chars().take(count).collect::<String>().into_bytes();
    }
    let count = node
        .keyed("words")
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_EXCERPT_WORDS);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < count {
        return text.into_bytes();
    }
    words[..count].join(" ").into_bytes()
}

/// Removes markup and folds newlines, tabs and runs of whitespace into single
/// spaces.
pub fn strip_tags(html: &str) -> String {
    let tag = HTML_TAG.get_or_init(|| Regex::new(r"<.*?>").expect("html tag pattern"));
    let run = WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s{2,}").expect("whitespace pattern"));
    let text = tag.replace_all(html, "").replace(['\n', '\t'], " ");
    run.replace_all(&text, " ").into_owned()
}

/// `{{date}}`: the post's publication date in post context or with
/// `published_at`, otherwise the render instant. `timeago="true"` gives a
/// relative time for the post.
pub(super) fn date(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let published = ctx.context == ContextKind::Post || node.has_flag("published_at");
    let post_date = ctx.current_post().and_then(|post| post.published_at);
    if node.keyed("timeago") == Some("true") {
        return post_date
            .map(|date| escape(node, &time_ago(&date, &ctx.data.now)))
            .unwrap_or_default();
    }
    let format = node.keyed("format").unwrap_or(DEFAULT_FORMAT);
    let date = if published { post_date } else { Some(ctx.data.now) };
    date.map(|date| escape(node, &format_date(format, &date)))
        .unwrap_or_default()
}

/// Image of the post or author in scope.
pub(super) fn image(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    match ctx.context {
        ContextKind::Post => post_field(node, ctx, |post| &post.image),
        ContextKind::Author => author_field(node, ctx, |author| &author.image),
        _ => Vec::new(),
    }
}

/// `{{plural count empty="..." singular="..." plural="..."}}` with `%`
/// replaced by the count.
pub(super) fn plural(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(argument) = node.first_argument() else {
        return Vec::new();
    };
    let count = String::from_utf8_lossy(&argument.evaluate(ctx)).into_owned();
    if count.is_empty() {
        debug!(argument = %argument.name, "plural helper got no count");
        return Vec::new();
    }
    let key = match count.as_str() {
        "0" => "empty",
        "1" => "singular",
        _ => "plural",
    };
    node.keyed(key)
        .map(|template| template.replace('%', &count).into_bytes())
        .unwrap_or_default()
}

/// Comma separated tag list of the current post, linked unless
/// `autolink="false"`.
pub(super) fn tags(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(post) = ctx.current_post().filter(|post| !post.tags.is_empty()) else {
        return Vec::new();
    };
    let separator = node.keyed("separator").unwrap_or(", ");
    let link = node.keyed("autolink") != Some("false");
    let mut output = Vec::new();
    if let Some(prefix) = node.keyed("prefix").filter(|prefix| !prefix.is_empty()) {
        output.extend_from_slice(prefix.as_bytes());
        output.push(b' ');
    }
    for (index, tag) in post.tags.iter().enumerate() {
        if index != 0 {
            output.extend_from_slice(separator.as_bytes());
        }
        if link {
            output.extend_from_slice(format!("<a href=\"/tag/{}/\">", tag.slug).as_bytes());
        }
        output.extend(escape(node, &tag.name));
        if link {
            output.extend_from_slice(b"</a>");
        }
    }
    if let Some(suffix) = node.keyed("suffix").filter(|suffix| !suffix.is_empty()) {
        output.push(b' ');
        output.extend_from_slice(suffix.as_bytes());
    }
    output
}

/// Tag under the cursor in tag context, otherwise the listing's tag.
pub(super) fn tag_name(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    scoped_tag(ctx)
        .map(|tag| escape(node, &tag.name))
        .unwrap_or_default()
}

pub(super) fn tag_slug(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    scoped_tag(ctx)
        .map(|tag| escape(node, &tag.slug))
        .unwrap_or_default()
}

fn scoped_tag<'a>(ctx: &RenderContext<'a>) -> Option<&'a Tag> {
    if ctx.context == ContextKind::Tag {
        if let Some(tag) = ctx.current_post_tag() {
            return Some(tag);
        }
    }
    ctx.data
        .tag
        .as_ref()
        .filter(|tag| !tag.name.is_empty())
        .or_else(|| ctx.current_post_tag())
}

/// Tag name in tag context, author name elsewhere.
pub(super) fn name(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    if ctx.context == ContextKind::Tag {
        return ctx
            .current_post_tag()
            .map(|tag| escape(node, &tag.name))
            .unwrap_or_default();
    }
    author_field(node, ctx, |author| &author.name)
}

pub(super) fn author_name(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.name)
}

pub(super) fn author_bio(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.bio)
}

pub(super) fn author_email(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.email)
}

pub(super) fn author_website(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.website)
}

pub(super) fn author_image(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.image)
}

pub(super) fn author_cover(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.cover)
}

pub(super) fn author_location(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    author_field(node, ctx, |author| &author.location)
}

/// Cursor position and collection length for the iteration in scope.
fn iteration(ctx: &RenderContext<'_>) -> Option<(usize, usize)> {
    match ctx.context {
        ContextKind::Post => Some((ctx.post_index, ctx.data.posts.len())),
        ContextKind::Tag => Some((
            ctx.tag_index,
            ctx.current_post().map_or(0, |post| post.tags.len()),
        )),
        ContextKind::Navigation => Some((ctx.navigation_index, ctx.blog().navigation.len())),
        _ => None,
    }
}

pub(super) fn first(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(iteration(ctx).is_some_and(|(index, _)| index == 0))
}

pub(super) fn last(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(iteration(ctx).is_some_and(|(index, len)| index + 1 == len))
}

/// Counting starts at one: the first item is odd.
pub(super) fn even(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(iteration(ctx).is_some_and(|(index, _)| index % 2 == 1))
}

pub(super) fn odd(_node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    truthy(iteration(ctx).is_some_and(|(index, _)| index % 2 == 0))
}
