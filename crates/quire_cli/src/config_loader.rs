use anyhow::{Context, Result, bail};
use quire_core::QuireConfig;
use quire_store::{BlogStore, MemoryStore};

pub fn load_store(config: &QuireConfig) -> Result<MemoryStore> {
    if !config.data.exists() {
        bail!(
            "Missing blog data at {}. Set `data:` in quire.yaml to point at it.",
            config.data.display()
        );
    }
    MemoryStore::open(&config.data)
        .with_context(|| format!("failed to load {}", config.data.display()))
}

/// Theme to try first: the command line, then quire.yaml, then the theme the
/// store names as active.
pub fn preferred_theme(
    explicit: Option<&str>,
    config: &QuireConfig,
    store: &dyn BlogStore,
) -> Result<Option<String>> {
    if let Some(theme) = explicit.or(config.theme.as_deref()) {
        return Ok(Some(theme.to_string()));
    }
    let active = store.active_theme().context("failed to read active theme")?;
    Ok(Some(active).filter(|name| !name.trim().is_empty()))
}
