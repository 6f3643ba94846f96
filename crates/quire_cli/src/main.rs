mod config_loader;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use quire_core::config::load_config_or_default;
use quire_core::{QuireConfig, Site};
use quire_store::BlogStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "quire", about = "Compile blog themes and render pages with them.")]
struct Cli {
    #[arg(long = "root", short = 'r', global = true)]
    root: Option<PathBuf>,
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PageKind {
    Index,
    Post,
    Tag,
    Author,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List installed themes.")]
    Themes,
    #[command(about = "Compile a theme and list its templates.")]
    Compile { theme: Option<String> },
    #[command(about = "Render one page with the active theme.")]
    Render {
        #[arg(value_enum)]
        kind: PageKind,
        /// Slug of the post, tag or author.
        slug: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Command::Themes => run_themes(&cli),
        Command::Compile { theme } => run_compile(&cli, theme.as_deref()),
        Command::Render {
            kind,
            slug,
            page,
            theme,
            out,
        } => {
            let output = run_render(&cli, *kind, slug.as_deref(), *page, theme.as_deref())?;
            write_output(out.as_deref(), &output)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise warnings only, or debug with
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_themes(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let site = Site::from_config(&config);
    let themes = site.list_themes();
    if themes.is_empty() {
        eprintln!("no themes in {}", site.themes_dir().display());
        return Ok(());
    }
    for theme in themes {
        let marker = if config.theme.as_deref() == Some(theme.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {theme}");
    }
    Ok(())
}

fn run_compile(cli: &Cli, theme: Option<&str>) -> Result<()> {
    let config = load_config(cli)?;
    let site = Site::from_config(&config);
    let registry = match theme {
        Some(name) => site
            .compile(name)
            .with_context(|| format!("failed to compile theme '{name}'"))?,
        None => {
            let store = config_loader::load_store(&config)?;
            activate(&site, &config, &store, None)?;
            site.registry().context("no theme was activated")?
        }
    };
    println!("theme: {}", registry.theme());
    println!("fingerprint: {}", registry.fingerprint().to_hex());
    for name in registry.names() {
        println!("  {name}");
    }
    Ok(())
}

fn run_render(
    cli: &Cli,
    kind: PageKind,
    slug: Option<&str>,
    page: i64,
    theme: Option<&str>,
) -> Result<Vec<u8>> {
    let config = load_config(cli)?;
    let store = config_loader::load_store(&config)?;
    let site = Site::from_config(&config);
    activate(&site, &config, &store, theme)?;

    let rendered = match kind {
        PageKind::Index => site.render_index(&store, page),
        PageKind::Post => site.render_post(&store, require_slug(kind, slug)?),
        PageKind::Tag => site.render_tag(&store, require_slug(kind, slug)?, page),
        PageKind::Author => site.render_author(&store, require_slug(kind, slug)?, page),
    };
    rendered.with_context(|| format!("failed to render {kind:?} page"))
}

fn activate(
    site: &Site,
    config: &QuireConfig,
    store: &dyn BlogStore,
    explicit: Option<&str>,
) -> Result<()> {
    let preferred = config_loader::preferred_theme(explicit, config, store)?;
    let active = site
        .activate(preferred.as_deref(), &config.fallback_theme)
        .context("failed to activate a theme")?;
    info!(theme = %active, "theme active");
    Ok(())
}

fn require_slug(kind: PageKind, slug: Option<&str>) -> Result<&str> {
    match slug {
        Some(slug) if !slug.trim().is_empty() => Ok(slug),
        _ => bail!("rendering a {kind:?} page needs a slug"),
    }
}

fn write_output(out: Option<&Path>, output: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
        }
        None => std::io::stdout()
            .write_all(output)
            .context("failed to write to stdout"),
    }
}

fn load_config(cli: &Cli) -> Result<QuireConfig> {
    let root = root_dir(cli)?;
    load_config_or_default(&root)
}

fn root_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.root {
        Some(path) => {
            if path.is_absolute() {
                Ok(path.clone())
            } else {
                let cwd = std::env::current_dir().context("failed to read current directory")?;
                Ok(cwd.join(path))
            }
        }
        None => std::env::current_dir().context("failed to read current directory"),
    }
}
