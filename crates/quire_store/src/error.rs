use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("post {post} references unknown author {author}")]
    UnknownAuthor { post: i64, author: i64 },
    #[error("post {post} references unknown tag {tag}")]
    UnknownTag { post: i64, tag: i64 },
    #[error("duplicate {kind} slug '{slug}'")]
    DuplicateSlug { kind: &'static str, slug: String },
}
