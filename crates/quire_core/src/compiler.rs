//! Theme directory to [`TemplateRegistry`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ScanError, ThemeError};
use crate::helpers;
use crate::node::{BODY_SLOT, Node};
use crate::registry::{Fingerprint, TemplateRegistry};
use crate::scanner::scan;

pub const TEMPLATE_EXTENSION: &str = "hbs";

/// Compiles one template source into a root node.
pub fn compile_template(name: &str, source: &[u8]) -> Result<Node, ScanError> {
    let (block, children) = scan(source.to_vec())?;
    let mut root = Node::new(name, false, 0, helpers::lookup(name));
    root.block = block;
    root.body_slot = children.iter().rposition(|child| child.name == BODY_SLOT);
    root.children = children;
    Ok(root)
}

/// Every `*.hbs` file below `dir`, sorted by path.
pub fn template_files(dir: &Path) -> Result<Vec<PathBuf>, ThemeError> {
    if !dir.is_dir() {
        return Err(ThemeError::NotFound(dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(TEMPLATE_EXTENSION))
        .collect();
    files.sort();
    Ok(files)
}

/// Compiles a whole theme directory. Template names are file stems, so
/// `partials/loop.hbs` is available as `loop`.
pub fn compile_theme(dir: &Path) -> Result<TemplateRegistry, ThemeError> {
    let theme = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut sources: BTreeMap<String, (PathBuf, Vec<u8>)> = BTreeMap::new();
    for path in template_files(dir)? {
        let Some(name) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some((first, _)) = sources.get(&name) {
            return Err(ThemeError::DuplicateTemplate {
                name,
                first: first.clone(),
                second: path,
            });
        }
        let source = fs::read(&path).map_err(|source| ThemeError::Io {
            path: path.clone(),
            source,
        })?;
        sources.insert(name, (path, source));
    }

    let registry = compile_sources(
        &theme,
        sources
            .into_iter()
            .map(|(name, (_, source))| (name, source)),
    )?;
    debug!(theme = %theme, templates = registry.len(), "compiled theme");
    Ok(registry)
}

/// Compiles in-memory `(name, source)` pairs and checks that the required
/// templates are present. A later source with an existing name replaces the
/// earlier one.
pub fn compile_sources<I>(theme: &str, sources: I) -> Result<TemplateRegistry, ThemeError>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let sources: BTreeMap<String, Vec<u8>> = sources.into_iter().collect();
    let mut fingerprint = Fingerprint::new();
    let mut templates = BTreeMap::new();
    for (name, source) in &sources {
        fingerprint.add(name, source);
        let root = compile_template(name, source).map_err(|source| ThemeError::Parse {
            template: name.clone(),
            source,
        })?;
        templates.insert(name.clone(), root);
    }
    let registry = TemplateRegistry::new(theme, templates, fingerprint.finish());
    registry.validate()?;
    Ok(registry)
}
