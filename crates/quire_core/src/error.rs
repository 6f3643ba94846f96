use std::path::PathBuf;

use quire_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("block '{0}' has no matching close tag")]
    UnterminatedBlock(String),
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("couldn't find theme files in {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "conflicting template name '{name}': {} and {}",
        .first.display(),
        .second.display()
    )]
    DuplicateTemplate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("template '{template}': {source}")]
    Parse {
        template: String,
        #[source]
        source: ScanError,
    },
    #[error("couldn't compile template '{0}'. Is {0}.hbs missing?")]
    MissingTemplate(&'static str),
    #[error("couldn't find a theme to use in {}", .0.display())]
    NoUsableTheme(PathBuf),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no theme has been compiled")]
    NoTheme,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("template '{0}' is not available")]
    MissingTemplate(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RenderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RenderError::NotFound(_))
    }
}
