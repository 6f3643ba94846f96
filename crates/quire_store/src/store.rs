use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::StoreError;
use crate::model::{Author, Blog, NavigationItem, Post, Tag};

/// Read side of the persistence layer. Everything a render needs is fetched
/// through this trait before rendering starts.
pub trait BlogStore {
    fn blog(&self) -> Result<Blog, StoreError>;
    fn active_theme(&self) -> Result<String, StoreError>;

    fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;
    fn post_by_id(&self, id: i64) -> Result<Option<Post>, StoreError>;
    fn posts_for_index(&self, limit: i64, offset: i64) -> Result<Vec<Post>, StoreError>;
    fn posts_by_tag(
        &self,
        tag_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError>;
    fn posts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError>;

    fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError>;
    fn tag_by_id(&self, id: i64) -> Result<Option<Tag>, StoreError>;
    fn author_by_slug(&self, slug: &str) -> Result<Option<Author>, StoreError>;
    fn author_by_id(&self, id: i64) -> Result<Option<Author>, StoreError>;

    fn post_count(&self) -> Result<i64, StoreError>;
    fn post_count_by_tag(&self, tag_id: i64) -> Result<i64, StoreError>;
    fn post_count_by_author(&self, author_id: i64) -> Result<i64, StoreError>;
}

#[derive(Debug, Deserialize)]
struct StoreFileRaw {
    blog: BlogRaw,
    #[serde(default)]
    authors: Vec<AuthorRaw>,
    #[serde(default)]
    tags: Vec<TagRaw>,
    #[serde(default)]
    posts: Vec<PostRaw>,
}

#[derive(Debug, Deserialize)]
struct BlogRaw {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    logo: Option<String>,
    cover: Option<String>,
    asset_path: Option<String>,
    posts_per_page: Option<i64>,
    active_theme: Option<String>,
    #[serde(default)]
    navigation: Vec<NavigationRaw>,
}

#[derive(Debug, Deserialize)]
struct NavigationRaw {
    label: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct AuthorRaw {
    id: i64,
    name: String,
    slug: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct TagRaw {
    id: i64,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct PostRaw {
    id: i64,
    #[serde(default)]
    uuid: String,
    title: String,
    slug: String,
    #[serde(default)]
    html: String,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    page: bool,
    #[serde(default = "default_published")]
    published: bool,
    date: Option<DateTime<Utc>>,
    author: Option<i64>,
    #[serde(default)]
    tags: Vec<i64>,
    #[serde(default)]
    meta_description: String,
    #[serde(default)]
    image: String,
}

fn default_published() -> bool {
    true
}

const DEFAULT_POSTS_PER_PAGE: i64 = 5;
const DEFAULT_THEME: &str = "promenade";
const DEFAULT_ASSET_PATH: &str = "/assets/";

/// In-memory store loaded from a YAML document. Listings only contain
/// published posts that are not pages, newest first.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    blog: Blog,
    authors: Vec<Author>,
    tags: Vec<Tag>,
    posts: Vec<Post>,
}

impl MemoryStore {
    pub fn new(blog: Blog, authors: Vec<Author>, tags: Vec<Tag>, posts: Vec<Post>) -> Self {
        let mut store = Self {
            blog,
            authors,
            tags,
            posts,
        };
        store.posts.sort_by_key(|post| Reverse((post.published_at, post.id)));
        store.blog.post_count = store.listed().count() as i64;
        store
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, StoreError> {
        let parsed: StoreFileRaw = serde_yaml::from_str(raw)?;

        let authors: Vec<Author> = parsed
            .authors
            .into_iter()
            .map(|raw| Author {
                id: raw.id,
                name: raw.name,
                slug: raw.slug,
                email: raw.email,
                image: raw.image,
                cover: raw.cover,
                bio: raw.bio,
                website: raw.website,
                location: raw.location,
            })
            .collect();
        ensure_unique("author", authors.iter().map(|author| author.slug.as_str()))?;

        let tags: Vec<Tag> = parsed
            .tags
            .into_iter()
            .map(|raw| Tag {
                id: raw.id,
                name: raw.name,
                slug: raw.slug,
            })
            .collect();
        ensure_unique("tag", tags.iter().map(|tag| tag.slug.as_str()))?;

        let authors_by_id: BTreeMap<i64, &Author> =
            authors.iter().map(|author| (author.id, author)).collect();
        let tags_by_id: BTreeMap<i64, &Tag> = tags.iter().map(|tag| (tag.id, tag)).collect();

        let mut posts = Vec::with_capacity(parsed.posts.len());
        for raw in parsed.posts {
            let author = match raw.author {
                Some(author_id) => Some(
                    authors_by_id
                        .get(&author_id)
                        .map(|author| (*author).clone())
                        .ok_or(StoreError::UnknownAuthor {
                            post: raw.id,
                            author: author_id,
                        })?,
                ),
                None => None,
            };
            let mut post_tags = Vec::with_capacity(raw.tags.len());
            for tag_id in raw.tags {
                let tag = tags_by_id.get(&tag_id).ok_or(StoreError::UnknownTag {
                    post: raw.id,
                    tag: tag_id,
                })?;
                post_tags.push((*tag).clone());
            }
            posts.push(Post {
                id: raw.id,
                uuid: raw.uuid,
                title: raw.title,
                slug: raw.slug,
                html: raw.html,
                is_featured: raw.featured,
                is_page: raw.page,
                is_published: raw.published,
                published_at: raw.date,
                tags: post_tags,
                author,
                meta_description: raw.meta_description,
                image: raw.image,
            });
        }
        ensure_unique("post", posts.iter().map(|post| post.slug.as_str()))?;

        let blog = Blog {
            url: parsed
                .blog
                .url
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            title: parsed.blog.title.unwrap_or_default(),
            description: parsed.blog.description.unwrap_or_default(),
            logo: parsed.blog.logo.unwrap_or_default(),
            cover: parsed.blog.cover.unwrap_or_default(),
            asset_path: parsed
                .blog
                .asset_path
                .unwrap_or_else(|| DEFAULT_ASSET_PATH.to_string()),
            post_count: 0,
            posts_per_page: parsed
                .blog
                .posts_per_page
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_POSTS_PER_PAGE),
            active_theme: parsed
                .blog
                .active_theme
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            navigation: parsed
                .blog
                .navigation
                .iter()
                .map(|item| NavigationItem::new(&item.label, &item.url))
                .collect(),
        };

        Ok(Self::new(blog, authors, tags, posts))
    }

    fn listed(&self) -> impl Iterator<Item = &Post> {
        self.posts
            .iter()
            .filter(|post| post.is_published && !post.is_page)
    }

    fn page_of<'a>(
        posts: impl Iterator<Item = &'a Post>,
        limit: i64,
        offset: i64,
    ) -> Vec<Post> {
        posts
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect()
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    slugs: impl Iterator<Item = &'a str>,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        if !seen.insert(slug) {
            return Err(StoreError::DuplicateSlug {
                kind,
                slug: slug.to_string(),
            });
        }
    }
    Ok(())
}

fn has_tag(post: &Post, tag_id: i64) -> bool {
    post.tags.iter().any(|tag| tag.id == tag_id)
}

fn has_author(post: &Post, author_id: i64) -> bool {
    post.author
        .as_ref()
        .is_some_and(|author| author.id == author_id)
}

impl BlogStore for MemoryStore {
    fn blog(&self) -> Result<Blog, StoreError> {
        Ok(self.blog.clone())
    }

    fn active_theme(&self) -> Result<String, StoreError> {
        Ok(self.blog.active_theme.clone())
    }

    fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.iter().find(|post| post.slug == slug).cloned())
    }

    fn post_by_id(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.iter().find(|post| post.id == id).cloned())
    }

    fn posts_for_index(&self, limit: i64, offset: i64) -> Result<Vec<Post>, StoreError> {
        Ok(Self::page_of(self.listed(), limit, offset))
    }

    fn posts_by_tag(
        &self,
        tag_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        Ok(Self::page_of(
            self.listed().filter(|post| has_tag(post, tag_id)),
            limit,
            offset,
        ))
    }

    fn posts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        Ok(Self::page_of(
            self.listed().filter(|post| has_author(post, author_id)),
            limit,
            offset,
        ))
    }

    fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError> {
        Ok(self.tags.iter().find(|tag| tag.slug == slug).cloned())
    }

    fn tag_by_id(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        Ok(self.tags.iter().find(|tag| tag.id == id).cloned())
    }

    fn author_by_slug(&self, slug: &str) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.iter().find(|author| author.slug == slug).cloned())
    }

    fn author_by_id(&self, id: i64) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.iter().find(|author| author.id == id).cloned())
    }

    fn post_count(&self) -> Result<i64, StoreError> {
        Ok(self.blog.post_count)
    }

    fn post_count_by_tag(&self, tag_id: i64) -> Result<i64, StoreError> {
        Ok(self.listed().filter(|post| has_tag(post, tag_id)).count() as i64)
    }

    fn post_count_by_author(&self, author_id: i64) -> Result<i64, StoreError> {
        Ok(self
            .listed()
            .filter(|post| has_author(post, author_id))
            .count() as i64)
    }
}
