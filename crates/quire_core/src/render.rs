//! Node tree evaluation
//!
//! Each child's output is spliced into a copy of its parent's literal bytes at
//! the child's recorded position, shifted by everything inserted before it.

use tracing::warn;

use crate::context::{ContextKind, RenderContext};
use crate::node::{EXTENDS, Node};

/// Renders `node` with the helper context switched to `kind` for the
/// duration of the call.
pub fn render_node(node: &Node, ctx: &mut RenderContext<'_>, kind: ContextKind) -> Vec<u8> {
    let saved = ctx.context;
    ctx.context = kind;
    let output = render_block(node, ctx, None);
    ctx.context = saved;
    output
}

/// Renders `node` without changing the helper context.
pub fn render_current(node: &Node, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let kind = ctx.context;
    render_node(node, ctx, kind)
}

/// Renders the template `name` from the active registry in the current
/// context. Missing templates and nesting past the depth limit render empty.
pub fn render_template(name: &str, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let registry = ctx.registry;
    let Some(root) = registry.get(name) else {
        warn!(template = name, "template not found");
        return Vec::new();
    };
    if !ctx.enter() {
        warn!(template = name, "template nesting too deep");
        return Vec::new();
    }
    let output = render_current(root, ctx);
    ctx.leave();
    output
}

/// `body` fills the root's layout slot when this root is rendered as a
/// layout.
fn render_block(node: &Node, ctx: &mut RenderContext<'_>, body: Option<&[u8]>) -> Vec<u8> {
    match node.children.first() {
        Some(marker) if marker.name == EXTENDS => {
            let content = splice_children(node, 1, ctx, body);
            extend(marker, content, ctx)
        }
        _ => splice_children(node, 0, ctx, body),
    }
}

fn splice_children(
    node: &Node,
    skip: usize,
    ctx: &mut RenderContext<'_>,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut output = node.block.clone();
    let mut drift = 0;
    for (index, child) in node.children.iter().enumerate().skip(skip) {
        let bytes = match body {
            Some(fill) if node.body_slot == Some(index) => fill.to_vec(),
            _ => child.evaluate(ctx),
        };
        drift += splice(&mut output, child.position + drift, &bytes);
    }
    output
}

/// Renders the layout named by an extends marker around `content`.
fn extend(marker: &Node, content: Vec<u8>, ctx: &mut RenderContext<'_>) -> Vec<u8> {
    let registry = ctx.registry;
    let name = marker.first_argument().map(|arg| arg.name.as_str()).unwrap_or_default();
    let Some(layout) = registry.get(name) else {
        warn!(layout = name, "layout not found, rendering without it");
        return content;
    };
    if !ctx.enter() {
        warn!(layout = name, "layout nesting too deep");
        return Vec::new();
    }
    let output = render_block(layout, ctx, Some(&content));
    ctx.leave();
    output
}

/// Inserts `bytes` into `output` at `at`, clamped to the end of the buffer.
/// Returns the number of bytes inserted.
pub fn splice(output: &mut Vec<u8>, at: usize, bytes: &[u8]) -> usize {
    let at = at.min(output.len());
    output.splice(at..at, bytes.iter().copied());
    bytes.len()
}
