//! Tag scanning and block matching over raw template bytes

use tracing::warn;

use crate::builder::build_node;
use crate::error::ScanError;
use crate::node::{ELSE, Node};

const OPEN: &[u8] = b"{{";
const CLOSE: &[u8] = b"}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Comment,
    BlockOpen,
    BlockClose,
    Else,
    Inline,
}

/// A delimited tag found in a buffer. `start..end` covers the whole tag text
/// including delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    pub start: usize,
    pub end: usize,
    pub inner: String,
    pub unescaped: bool,
}

impl RawTag {
    pub fn kind(&self) -> TagKind {
        classify(&self.inner)
    }
}

pub fn classify(inner: &str) -> TagKind {
    if inner.starts_with("! ") || inner.starts_with("!--") {
        TagKind::Comment
    } else if inner.starts_with('#') {
        TagKind::BlockOpen
    } else if inner.starts_with('/') {
        TagKind::BlockClose
    } else if inner == ELSE {
        TagKind::Else
    } else {
        TagKind::Inline
    }
}

/// Finds the next tag at or after `from`. A `{{` without a closing `}}` ends
/// the scan.
pub fn next_tag(data: &[u8], from: usize) -> Option<RawTag> {
    let start = from + find(data.get(from..)?, OPEN)?;
    let inner_start = start + OPEN.len();
    let close = inner_start + find(&data[inner_start..], CLOSE)?;
    let mut inner = &data[inner_start..close];
    let mut end = close + CLOSE.len();
    let mut unescaped = false;
    if inner.first() == Some(&b'{') {
        unescaped = true;
        inner = &inner[1..];
        if data.get(end) == Some(&b'}') {
            end += 1;
        }
    }
    Some(RawTag {
        start,
        end,
        inner: String::from_utf8_lossy(inner).trim().to_string(),
        unescaped,
    })
}

/// Strips every tag out of `data`, returning the literal bytes that remain
/// and the nodes found, each positioned where its tag used to start.
pub fn scan(mut data: Vec<u8>) -> Result<(Vec<u8>, Vec<Node>), ScanError> {
    let mut nodes = Vec::new();
    let mut from = 0;
    while let Some(tag) = next_tag(&data, from) {
        data.drain(tag.start..tag.end);
        from = tag.start;
        match tag.kind() {
            TagKind::Comment => {}
            TagKind::BlockOpen => {
                let node = extract_block(&mut data, &tag)?;
                nodes.push(node);
            }
            TagKind::BlockClose => {
                warn!(tag = %tag.inner, "close tag without a matching block ignored");
            }
            TagKind::Else | TagKind::Inline => {
                if tag.inner.is_empty() {
                    continue;
                }
                nodes.push(build_node(
                    &tag.inner,
                    tag.unescaped,
                    tag.start,
                    Vec::new(),
                    Vec::new(),
                    None,
                ));
            }
        }
    }
    Ok((data, nodes))
}

/// Name a block tag opens, e.g. `if` for `#if @blog.cover`.
pub fn block_name(inner: &str) -> &str {
    inner
        .trim_start_matches('#')
        .split_whitespace()
        .next()
        .unwrap_or_default()
}

fn close_name(inner: &str) -> &str {
    inner.trim_start_matches('/').trim()
}

/// Finds the close tag pairing with a block opened just before `from`,
/// skipping over nested blocks of the same name. Returns the close tag's
/// byte range.
pub fn match_block(data: &[u8], from: usize, name: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut idx = from;
    while let Some(tag) = next_tag(data, idx) {
        match tag.kind() {
            TagKind::BlockOpen if block_name(&tag.inner) == name => depth += 1,
            TagKind::BlockClose if close_name(&tag.inner) == name => {
                if depth == 0 {
                    return Some((tag.start, tag.end));
                }
                depth -= 1;
            }
            _ => {}
        }
        idx = tag.end;
    }
    None
}

/// Cuts the block opened by `open` (already removed from `data`) out of the
/// buffer, scans it for children and splits off an `{{else}}` branch.
fn extract_block(data: &mut Vec<u8>, open: &RawTag) -> Result<Node, ScanError> {
    let tag_text = open.inner.trim_start_matches('#').trim();
    let name = block_name(tag_text);
    let (close_start, close_end) = match_block(data, open.start, name)
        .ok_or_else(|| ScanError::UnterminatedBlock(name.to_string()))?;
    let raw_block = data[open.start..close_start].to_vec();
    data.drain(open.start..close_end);

    let (mut block, mut children) = scan(raw_block)?;
    let mut else_branch = None;
    if let Some(index) = children.iter().position(|child| child.name == ELSE) {
        let mut branch = children.remove(index);
        let at = branch.position.min(block.len());
        branch.block = block.split_off(at);
        branch.children = children
            .split_off(index)
            .into_iter()
            .map(|mut child| {
                child.position = child.position.saturating_sub(at);
                child
            })
            .collect();
        else_branch = Some(branch);
    }
    Ok(build_node(
        tag_text,
        open.unescaped,
        open.start,
        block,
        children,
        else_branch,
    ))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|node| node.name.as_str()).collect()
    }

    #[test]
    fn plain_text_has_no_tags() {
        let (block, nodes) = scan(b"<p>hello</p>".to_vec()).expect("scan");
        assert_eq!(block, b"<p>hello</p>");
        assert!(nodes.is_empty());
    }

    #[test]
    fn inline_tags_are_removed_and_positioned() {
        let (block, nodes) =
            scan(b"<h1>{{title}}</h1><p>{{ excerpt }}</p>".to_vec()).expect("scan");
        assert_eq!(block, b"<h1></h1><p></p>");
        assert_eq!(names(&nodes), ["title", "excerpt"]);
        assert_eq!(nodes[0].position, 4);
        assert_eq!(nodes[1].position, 12);
        assert!(!nodes[0].unescaped);
    }

    #[test]
    fn triple_braces_mark_unescaped() {
        let tag = next_tag(b"a{{{content}}}b", 0).expect("tag");
        assert_eq!(tag.inner, "content");
        assert!(tag.unescaped);
        assert_eq!((tag.start, tag.end), (1, 14));

        let (block, nodes) = scan(b"a{{{content}}}b".to_vec()).expect("scan");
        assert_eq!(block, b"ab");
        assert!(nodes[0].unescaped);
    }

    #[test]
    fn comments_leave_nothing_behind() {
        let (block, nodes) =
            scan(b"a{{! note }}b{{!-- long note --}}c".to_vec()).expect("scan");
        assert_eq!(block, b"abc");
        assert!(nodes.is_empty());
    }

    #[test]
    fn layout_directive_is_not_a_comment() {
        let (_, nodes) = scan(b"{{!< default}}body".to_vec()).expect("scan");
        assert_eq!(names(&nodes), ["!<"]);
        assert_eq!(nodes[0].arguments[0].name, "default");
    }

    #[test]
    fn unclosed_open_delimiter_stays_literal() {
        let (block, nodes) = scan(b"a{{title}} b {{oops".to_vec()).expect("scan");
        assert_eq!(block, b"a b {{oops");
        assert_eq!(names(&nodes), ["title"]);
    }

    #[test]
    fn classifies_tags() {
        assert_eq!(classify("! hi"), TagKind::Comment);
        assert_eq!(classify("!-- hi --"), TagKind::Comment);
        assert_eq!(classify("#if posts"), TagKind::BlockOpen);
        assert_eq!(classify("/if"), TagKind::BlockClose);
        assert_eq!(classify("else"), TagKind::Else);
        assert_eq!(classify("!< default"), TagKind::Inline);
    }

    #[test]
    fn block_captures_children_relative_to_block() {
        let (block, nodes) =
            scan(b"x{{#post}}<h1>{{title}}</h1>{{/post}}y".to_vec()).expect("scan");
        assert_eq!(block, b"xy");
        let post = &nodes[0];
        assert_eq!(post.name, "post");
        assert_eq!(post.position, 1);
        assert_eq!(post.block, b"<h1></h1>");
        assert_eq!(post.children[0].name, "title");
        assert_eq!(post.children[0].position, 4);
    }

    #[test]
    fn nested_blocks_of_same_name_pair_correctly() {
        let source = b"{{#if a}}A{{#if b}}B{{/if}}C{{/if}}D{{#if c}}E{{/if}}";
        let (block, nodes) = scan(source.to_vec()).expect("scan");
        assert_eq!(block, b"D");
        assert_eq!(names(&nodes), ["if", "if"]);
        let outer = &nodes[0];
        assert_eq!(outer.block, b"AC");
        assert_eq!(outer.children.len(), 1);
        assert_eq!(outer.children[0].block, b"B");
        assert_eq!(outer.children[0].position, 1);
        assert_eq!(nodes[1].block, b"E");
        assert_eq!(nodes[1].position, 1);
    }

    #[test]
    fn match_block_ignores_prefix_names() {
        let data = b"a{{#iffy}}b{{/iffy}}c{{/if}}";
        let (start, end) = match_block(data, 0, "if").expect("close tag");
        assert_eq!(&data[start..end], b"{{/if}}");
    }

    #[test]
    fn else_splits_block() {
        let source = b"{{#if posts}}yes {{title}}{{else}}no {{@blog.title}}!{{/if}}";
        let (_, nodes) = scan(source.to_vec()).expect("scan");
        let node = &nodes[0];
        assert_eq!(node.block, b"yes ");
        assert_eq!(names(&node.children), ["title"]);
        assert_eq!(node.arguments.len(), 2);
        assert_eq!(node.arguments[0].name, "posts");

        let branch = node.else_branch().expect("else branch");
        assert_eq!(branch.block, b"no !");
        assert_eq!(names(&branch.children), ["@blog.title"]);
        assert_eq!(branch.children[0].position, 3);
    }

    #[test]
    fn else_inside_nested_block_stays_nested() {
        let source = b"{{#foreach posts}}{{#if featured}}F{{else}}N{{/if}}{{/foreach}}";
        let (_, nodes) = scan(source.to_vec()).expect("scan");
        let foreach = &nodes[0];
        assert!(foreach.else_branch().is_none());
        assert!(foreach.children[0].else_branch().is_some());
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = scan(b"{{#foreach posts}}{{title}}".to_vec()).expect_err("error");
        assert_eq!(err, ScanError::UnterminatedBlock("foreach".to_string()));
    }
}
