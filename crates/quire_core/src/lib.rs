//! Handlebars-style theme compiler and renderer for quire blogs.

pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod date;
pub mod error;
pub mod helpers;
pub mod node;
pub mod registry;
pub mod render;
pub mod scanner;
pub mod site;
pub mod theme;

pub use crate::config::{QuireConfig, SiteSettings};
pub use crate::error::{RenderError, ScanError, ThemeError};
pub use crate::registry::TemplateRegistry;
pub use crate::site::Site;
