//! Compiled template nodes

use std::fmt;

use crate::context::RenderContext;

/// Render function bound to a node when it is compiled.
pub type HelperFn = fn(&Node, &mut RenderContext<'_>) -> Vec<u8>;

/// Name of the directive that makes a template extend a layout.
pub const EXTENDS: &str = "!<";
/// Name of the node a layout uses as the slot for the extending template.
pub const BODY_SLOT: &str = "body";
/// Name of the branch split off a block by `{{else}}`.
pub const ELSE: &str = "else";

/// One tag occurrence, or the root of a compiled template.
///
/// `position` is an offset into the parent's `block` as it was when the
/// parent was parsed; the renderer accounts for the bytes inserted by earlier
/// siblings.
#[derive(Clone)]
pub struct Node {
    pub name: String,
    /// Set on keyed arguments: `format="YYYY"` has key `format`, name `YYYY`.
    pub key: Option<String>,
    pub arguments: Vec<Node>,
    pub unescaped: bool,
    pub position: usize,
    pub block: Vec<u8>,
    pub children: Vec<Node>,
    /// Index into `children` of the layout content slot, set on roots only.
    pub body_slot: Option<usize>,
    pub(crate) helper: HelperFn,
}

impl Node {
    pub(crate) fn new(name: &str, unescaped: bool, position: usize, helper: HelperFn) -> Self {
        Self {
            name: name.to_string(),
            key: None,
            arguments: Vec::new(),
            unescaped,
            position,
            block: Vec::new(),
            children: Vec::new(),
            body_slot: None,
            helper,
        }
    }

    pub fn evaluate(&self, ctx: &mut RenderContext<'_>) -> Vec<u8> {
        (self.helper)(self, ctx)
    }

    pub fn is_block(&self) -> bool {
        !self.block.is_empty() || !self.children.is_empty()
    }

    /// First positional argument.
    pub fn first_argument(&self) -> Option<&Node> {
        self.arguments
            .first()
            .filter(|argument| argument.key.is_none() && !argument.is_else())
    }

    pub fn positional(&self) -> impl Iterator<Item = &Node> {
        self.arguments
            .iter()
            .filter(|argument| argument.key.is_none() && !argument.is_else())
    }

    /// Value of the keyed argument `key`, if given.
    pub fn keyed(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|argument| argument.key.as_deref() == Some(key))
            .map(|argument| argument.name.as_str())
    }

    /// True if `flag` was passed either bare or as a key.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.positional().any(|argument| argument.name == flag) || self.keyed(flag).is_some()
    }

    /// The `{{else}}` branch, always stored as the last argument.
    pub fn else_branch(&self) -> Option<&Node> {
        self.arguments.last().filter(|argument| argument.is_else())
    }

    fn is_else(&self) -> bool {
        self.key.is_none() && self.name == ELSE
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("arguments", &self.arguments)
            .field("unescaped", &self.unescaped)
            .field("position", &self.position)
            .field("block", &String::from_utf8_lossy(&self.block))
            .field("children", &self.children)
            .field("body_slot", &self.body_slot)
            .finish()
    }
}
