//! Compiled templates of one theme

use std::collections::BTreeMap;

use blake3::Hasher;

use crate::error::ThemeError;
use crate::node::Node;

/// Templates every theme must provide.
pub const REQUIRED_TEMPLATES: [&str; 2] = ["index", "post"];

/// Root nodes keyed by template name. Built once per compile and never
/// mutated afterwards; a recompile produces a new registry.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    theme: String,
    templates: BTreeMap<String, Node>,
    fingerprint: blake3::Hash,
}

impl TemplateRegistry {
    pub fn empty(theme: &str) -> Self {
        Self::new(theme, BTreeMap::new(), Fingerprint::new().finish())
    }

    pub(crate) fn new(
        theme: &str,
        templates: BTreeMap<String, Node>,
        fingerprint: blake3::Hash,
    ) -> Self {
        Self {
            theme: theme.to_string(),
            templates,
            fingerprint,
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Hash over every template name and source, in name order.
    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }

    pub fn validate(&self) -> Result<(), ThemeError> {
        for name in REQUIRED_TEMPLATES {
            if !self.contains(name) {
                return Err(ThemeError::MissingTemplate(name));
            }
        }
        Ok(())
    }
}

/// Accumulates template sources into a registry fingerprint.
pub(crate) struct Fingerprint(Hasher);

impl Fingerprint {
    pub(crate) fn new() -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"quire.templates.v1");
        Self(hasher)
    }

    pub(crate) fn add(&mut self, name: &str, source: &[u8]) {
        add_str(&mut self.0, name);
        self.0.update(&(source.len() as u64).to_le_bytes());
        self.0.update(source);
    }

    pub(crate) fn finish(&self) -> blake3::Hash {
        self.0.finalize()
    }
}

fn add_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
