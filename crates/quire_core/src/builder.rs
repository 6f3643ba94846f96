//! Turns the inner text of a tag into a [`Node`]

use std::sync::OnceLock;

use regex::Regex;

use crate::helpers;
use crate::node::Node;

static KEYED_ARGUMENT: OnceLock<Regex> = OnceLock::new();
static QUOTED_TOKEN: OnceLock<Regex> = OnceLock::new();

fn keyed_argument() -> &'static Regex {
    KEYED_ARGUMENT.get_or_init(|| {
        Regex::new(r#"(\S+?)\s*?=\s*?['"](.*?)['"]"#).expect("keyed argument pattern")
    })
}

fn quoted_token() -> &'static Regex {
    QUOTED_TOKEN
        .get_or_init(|| Regex::new(r#"^.*?["'](.+?)["']$"#).expect("quoted token pattern"))
}

/// Builds a node from tag text such as `date format="MMM Do" published_at`.
///
/// Keyed arguments are pulled out first; the remaining whitespace separated
/// tokens are the name and the positional arguments, in that order. Positional
/// arguments bind their own helper so they can be evaluated as conditions.
pub fn build_node(
    tag_text: &str,
    unescaped: bool,
    position: usize,
    block: Vec<u8>,
    children: Vec<Node>,
    else_branch: Option<Node>,
) -> Node {
    let mut keyed = Vec::new();
    let remainder = keyed_argument().replace_all(tag_text, |caps: &regex::Captures<'_>| {
        keyed.push((caps[1].to_string(), caps[2].to_string()));
        String::new()
    });

    let mut tokens = remainder.split_whitespace().map(strip_quotes);
    let name = tokens.next().unwrap_or_default();
    let mut node = Node::new(name, unescaped, position, helpers::lookup(name));
    node.block = block;
    node.children = children;
    for token in tokens {
        node.arguments
            .push(Node::new(token, unescaped, 0, helpers::lookup(token)));
    }
    for (key, value) in keyed {
        let mut argument = Node::new(&value, unescaped, 0, helpers::lookup(&value));
        argument.key = Some(key);
        node.arguments.push(argument);
    }
    if let Some(branch) = else_branch {
        node.arguments.push(branch);
    }
    node
}

fn strip_quotes(token: &str) -> &str {
    match quoted_token().captures(token).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => token,
    }
}
