mod error;
mod model;
mod store;

pub use crate::error::StoreError;
pub use crate::model::{Author, Blog, NavigationItem, Post, Tag, slugify};
pub use crate::store::{BlogStore, MemoryStore};
