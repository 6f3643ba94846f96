use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use quire_store::Blog;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "quire.yaml";
pub const DEFAULT_THEMES_DIR: &str = "content/themes";
pub const DEFAULT_DATA_FILE: &str = "content/data.yaml";
pub const DEFAULT_FALLBACK_THEME: &str = "promenade";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuireConfigRaw {
    themes_dir: Option<String>,
    theme: Option<String>,
    fallback_theme: Option<String>,
    data: Option<String>,
    site: Option<SiteSettingsRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteSettingsRaw {
    url: Option<String>,
    asset_path: Option<String>,
}

/// Resolved `quire.yaml`. Relative paths are joined onto the directory the
/// file lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuireConfig {
    pub themes_dir: PathBuf,
    /// Overrides the theme the data store names as active.
    pub theme: Option<String>,
    pub fallback_theme: String,
    pub data: PathBuf,
    pub site: SiteSettings,
}

/// Deployment overrides for blog metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSettings {
    pub url: Option<String>,
    pub asset_path: Option<String>,
}

impl SiteSettings {
    pub fn apply(&self, blog: &mut Blog) {
        if let Some(url) = &self.url {
            blog.url = url.clone();
        }
        if let Some(asset_path) = &self.asset_path {
            blog.asset_path = asset_path.clone();
        }
    }
}

impl QuireConfig {
    /// Defaults for a site rooted at `root`.
    pub fn defaults(root: &Path) -> Self {
        Self {
            themes_dir: root.join(DEFAULT_THEMES_DIR),
            theme: None,
            fallback_theme: DEFAULT_FALLBACK_THEME.to_string(),
            data: root.join(DEFAULT_DATA_FILE),
            site: SiteSettings::default(),
        }
    }
}

/// Loads `root/quire.yaml`, or the defaults when the file does not exist.
pub fn load_config_or_default(root: &Path) -> Result<QuireConfig> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        load_config(&path)
    } else {
        Ok(QuireConfig::defaults(root))
    }
}

pub fn load_config(path: &Path) -> Result<QuireConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&raw, base).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_config(raw: &str, base: &Path) -> Result<QuireConfig> {
    let parsed: QuireConfigRaw = if raw.trim().is_empty() {
        QuireConfigRaw {
            themes_dir: None,
            theme: None,
            fallback_theme: None,
            data: None,
            site: None,
        }
    } else {
        serde_yaml::from_str(raw).context("failed to parse YAML")?
    };

    let themes_dir = non_empty_or_default(parsed.themes_dir, DEFAULT_THEMES_DIR, "themes_dir")?;
    let data = non_empty_or_default(parsed.data, DEFAULT_DATA_FILE, "data")?;
    let fallback_theme = non_empty_or_default(
        parsed.fallback_theme,
        DEFAULT_FALLBACK_THEME,
        "fallback_theme",
    )?;
    let theme = match parsed.theme {
        Some(name) if name.trim().is_empty() => bail!("theme must not be empty"),
        other => other,
    };

    let site = match parsed.site {
        None => SiteSettings::default(),
        Some(site) => SiteSettings {
            url: site.url.map(|url| parse_site_url(&url)).transpose()?,
            asset_path: site
                .asset_path
                .map(|path| parse_asset_path(&path))
                .transpose()?,
        },
    };

    Ok(QuireConfig {
        themes_dir: base.join(themes_dir),
        theme,
        fallback_theme,
        data: base.join(data),
        site,
    })
}

fn parse_site_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("site.url must start with http:// or https://, got '{url}'");
    }
    Ok(trimmed.to_string())
}

fn parse_asset_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        bail!("site.asset_path must not be empty");
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/"))
    }
}

fn non_empty_or_default(value: Option<String>, default: &str, field: &str) -> Result<String> {
    match value {
        Some(text) => {
            if text.trim().is_empty() {
                bail!("{field} must not be empty");
            }
            Ok(text)
        }
        None => Ok(default.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, contents).expect("write config");
        (temp, path)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let (temp, path) = write_config("");
        let config = load_config(&path).expect("config should load");
        assert_eq!(config, QuireConfig::defaults(temp.path()));
        assert_eq!(config.fallback_theme, "promenade");
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let (temp, path) = write_config("themes_dir: themes\ndata: blog.yaml\ntheme: casper\n");
        let config = load_config(&path).expect("config should load");
        assert_eq!(config.themes_dir, temp.path().join("themes"));
        assert_eq!(config.data, temp.path().join("blog.yaml"));
        assert_eq!(config.theme.as_deref(), Some("casper"));
    }

    #[test]
    fn site_overrides_are_normalized() {
        let (_temp, path) =
            write_config("site:\n  url: \"https://example.com/\"\n  asset_path: /static\n");
        let config = load_config(&path).expect("config should load");
        assert_eq!(config.site.url.as_deref(), Some("https://example.com"));
        assert_eq!(config.site.asset_path.as_deref(), Some("/static/"));

        let mut blog = Blog::default();
        config.site.apply(&mut blog);
        assert_eq!(blog.url, "https://example.com");
        assert_eq!(blog.asset_path, "/static/");
    }

    #[test]
    fn bad_url_fails() {
        let (_temp, path) = write_config("site:\n  url: example.com\n");
        let err = load_config(&path).expect_err("expected error");
        assert!(format!("{err:#}").contains("site.url"));
    }

    #[test]
    fn empty_fallback_fails() {
        let (_temp, path) = write_config("fallback_theme: \"\"\n");
        let err = load_config(&path).expect_err("expected error");
        assert!(format!("{err:#}").contains("fallback_theme"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_temp, path) = write_config("themes: x\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let config = load_config_or_default(temp.path()).expect("defaults");
        assert_eq!(config.themes_dir, temp.path().join("content/themes"));
    }
}
