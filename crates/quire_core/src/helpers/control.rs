//! Block helpers: conditionals, iteration, partials and layout plumbing

use tracing::warn;

use super::{condition, escape};
use crate::context::{ContextKind, RenderContext};
use crate::node::Node;
use crate::render::{render_current, render_node, render_template};

pub(super) fn if_helper(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    match condition(node, ctx) {
        Some(true) => render_current(node, ctx),
        Some(false) => render_else(node, ctx),
        None => Vec::new(),
    }
}

pub(super) fn unless_helper(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    match condition(node, ctx) {
        Some(false) => render_current(node, ctx),
        Some(true) => render_else(node, ctx),
        None => Vec::new(),
    }
}

fn render_else(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    match node.else_branch() {
        Some(branch) => render_current(branch, ctx),
        None => Vec::new(),
    }
}

/// `{{#foreach posts|tags|navigation}}`. An empty collection renders the
/// `{{else}}` branch.
pub(super) fn foreach(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(collection) = node.first_argument().map(|arg| arg.name.as_str()) else {
        return Vec::new();
    };
    let (len, kind) = match collection {
        "posts" => (ctx.data.posts.len(), ContextKind::Post),
        "tags" => (
            ctx.current_post().map_or(0, |post| post.tags.len()),
            ContextKind::Tag,
        ),
        "navigation" => (ctx.blog().navigation.len(), ContextKind::Navigation),
        other => {
            warn!(collection = other, "foreach over unknown collection");
            return Vec::new();
        }
    };
    if len == 0 {
        return render_else(node, ctx);
    }

    let mut output = Vec::new();
    for index in 0..len {
        let saved = set_cursor(ctx, kind, index);
        output.extend(render_node(node, ctx, kind));
        set_cursor(ctx, kind, saved);
    }
    output
}

/// Points the cursor for `kind` at `index`, returning its previous value.
fn set_cursor(ctx: &mut RenderContext<'_>, kind: ContextKind, index: usize) -> usize {
    let cursor = match kind {
        ContextKind::Tag => &mut ctx.tag_index,
        ContextKind::Navigation => &mut ctx.navigation_index,
        _ => &mut ctx.post_index,
    };
    std::mem::replace(cursor, index)
}

/// The renderer consumes a leading `{{!< layout}}`; anywhere else it is
/// ignored.
pub(super) fn extends(node: &Node, _ctx: &mut RenderContext<'_>) -> Vec<u8> {
    warn!(
        layout = node.first_argument().map(|arg| arg.name.as_str()).unwrap_or_default(),
        "layout directive is only honoured at the start of a template"
    );
    Vec::new()
}

/// Renders its own block. When the template is used as a layout the renderer
/// substitutes the extending template's output instead.
pub(super) fn body(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    render_current(node, ctx)
}

/// `{{> name}}`
pub(super) fn partial(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    match node.first_argument() {
        Some(name) => render_template(&name.name, ctx),
        None => Vec::new(),
    }
}

pub(super) fn content_for(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    ctx.content_for.push(node.clone());
    Vec::new()
}

/// Emits the first `{{#contentFor}}` collected under the same name.
pub(super) fn block(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let Some(name) = node.first_argument().map(|arg| arg.name.as_str()) else {
        return Vec::new();
    };
    let found = ctx
        .content_for
        .iter()
        .find(|collected| collected.first_argument().is_some_and(|arg| arg.name == name))
        .cloned();
    let Some(collected) = found else {
        return Vec::new();
    };
    if !ctx.enter() {
        warn!(block = name, "content block nesting too deep");
        return Vec::new();
    }
    let output = render_current(&collected, ctx);
    ctx.leave();
    output
}

/// `{{#post}}` renders the first post of the data set in post context.
pub(super) fn post(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let saved = std::mem::replace(&mut ctx.post_index, 0);
    let output = render_node(node, ctx, ContextKind::Post);
    ctx.post_index = saved;
    output
}

/// As a block, renders in author context. Inline it links the author's name
/// unless `autolink="false"`.
pub(super) fn author(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    if node.is_block() {
        return render_node(node, ctx, ContextKind::Author);
    }
    let Some(author) = ctx.current_author() else {
        return Vec::new();
    };
    let name = escape(node, &author.name);
    if node.keyed("autolink") == Some("false") {
        return name;
    }
    let mut output = format!("<a href=\"/author/{}/\">", author.slug).into_bytes();
    output.extend(name);
    output.extend_from_slice(b"</a>");
    output
}
