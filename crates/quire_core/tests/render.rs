use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use quire_core::context::MAX_DEPTH;
use quire_core::{RenderError, Site};
use quire_store::{Blog, MemoryStore, Post};
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const FIXTURE: &str = r#"
blog:
  title: Field Notes
  description: Notes from the field
  url: https://example.com/
  posts_per_page: 2
  navigation:
    - label: Home
      url: /
    - label: About Me
      url: /about/
authors:
  - id: 1
    name: Ada
    slug: ada
  - id: 2
    name: Grace
    slug: grace
tags:
  - id: 10
    name: Rust
    slug: rust
  - id: 11
    name: Go
    slug: go
posts:
  - id: 1
    title: First
    slug: first
    html: "<p>One two  three\nfour</p>"
    date: 2024-01-01T10:00:00Z
    author: 1
    tags: [10]
  - id: 2
    title: Second
    slug: second
    date: 2024-02-01T10:00:00Z
    author: 2
    tags: [10, 11]
  - id: 3
    title: Third
    slug: third
    date: 2024-03-01T10:00:00Z
    author: 1
  - id: 4
    title: Draft
    slug: draft
    published: false
    date: 2024-04-01T10:00:00Z
    author: 1
  - id: 5
    title: About
    slug: about
    page: true
"#;

fn store() -> MemoryStore {
    MemoryStore::from_yaml_str(FIXTURE).expect("fixture should parse")
}

fn empty_store() -> MemoryStore {
    let blog = Blog {
        posts_per_page: 5,
        ..Blog::default()
    };
    MemoryStore::new(blog, Vec::new(), Vec::new(), Vec::new())
}

fn write_theme(themes_dir: &Path, name: &str, files: &[(&str, &str)]) {
    let dir = themes_dir.join(name);
    for (file, contents) in files {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().expect("template parent")).expect("mkdir");
        fs::write(&path, contents).expect("write template");
    }
}

/// A compiled site whose only theme holds `files`. `post.hbs` is added when
/// the caller does not provide one.
fn site_with(files: &[(&str, &str)]) -> (TempDir, Site) {
    let temp = TempDir::new().expect("tempdir");
    write_theme(temp.path(), "casper", files);
    if !files.iter().any(|(file, _)| *file == "post.hbs") {
        write_theme(temp.path(), "casper", &[("post.hbs", "{{title}}")]);
    }
    let site = Site::new(temp.path());
    site.compile("casper").expect("theme should compile");
    (temp, site)
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("utf-8 output")
}

/// Collects the fields of every WARN event as `name=value` text.
#[derive(Clone, Default)]
struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    fn lines(&self) -> Vec<String> {
        self.0.lock().expect("warnings lock").clone()
    }
}

impl<S: Subscriber> Layer<S> for Warnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut line = String::new();
        event.record(&mut FieldText(&mut line));
        self.0.lock().expect("warnings lock").push(line);
    }
}

struct FieldText<'a>(&'a mut String);

impl Visit for FieldText<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

#[test]
fn template_without_tags_renders_verbatim() {
    let literal = "<!doctype html>\n<p>plain & simple { not a tag }</p>\n";
    let (_temp, site) = site_with(&[("index.hbs", literal)]);
    let output = site.render_index(&store(), 1).expect("render");
    assert_eq!(output, literal.as_bytes());
}

#[test]
fn double_braces_escape_and_triple_braces_do_not() {
    let (_temp, site) = site_with(&[("index.hbs", ""), ("post.hbs", "{{title}}|{{{title}}}")]);
    let post = Post {
        id: 1,
        title: "A & B".to_string(),
        slug: "amp".to_string(),
        is_published: true,
        ..Post::default()
    };
    let store = MemoryStore::new(Blog::default(), Vec::new(), Vec::new(), vec![post]);
    let output = text(site.render_post(&store, "amp").expect("render"));
    assert_eq!(output, "A &amp; B|A & B");
}

#[test]
fn if_else_follows_the_post_list() {
    let (_temp, site) = site_with(&[("index.hbs", "{{#if posts}}A{{else}}B{{/if}}")]);
    assert_eq!(text(site.render_index(&store(), 1).expect("render")), "A");
    assert_eq!(text(site.render_index(&empty_store(), 1).expect("render")), "B");
}

#[test]
fn unless_renders_when_condition_is_false() {
    let (_temp, site) = site_with(&[("index.hbs", "{{#unless posts}}none{{else}}some{{/unless}}")]);
    assert_eq!(text(site.render_index(&store(), 1).expect("render")), "some");
    assert_eq!(text(site.render_index(&empty_store(), 1).expect("render")), "none");
}

#[test]
fn layout_wraps_the_body_block() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "{{!< base}}{{#body}}CONTENT{{/body}}"),
        ("base.hbs", "<html>{{#body}}{{/body}}</html>"),
    ]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(output, "<html>CONTENT</html>");
}

#[test]
fn layout_slot_receives_everything_after_the_directive() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "{{!< default}}\n<main>{{#foreach posts}}{{title}};{{/foreach}}</main>"),
        ("default.hbs", "<title>{{@blog.title}}</title>{{{body}}}<footer/>"),
    ]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(
        output,
        "<title>Field Notes</title>\n<main>Third;Second;</main><footer/>"
    );
}

#[test]
fn missing_layout_renders_the_content_alone() {
    let (_temp, site) = site_with(&[("index.hbs", "{{!< nowhere}}content")]);
    assert_eq!(text(site.render_index(&store(), 1).expect("render")), "content");
}

#[test]
fn unknown_helpers_render_empty() {
    let (_temp, site) = site_with(&[("index.hbs", "a{{nosuchhelper}}b{{{alsomissing x}}}c")]);
    assert_eq!(text(site.render_index(&store(), 1).expect("render")), "abc");
}

#[test]
fn unknown_helpers_are_logged_as_warnings() {
    let (_temp, site) = site_with(&[("index.hbs", "a{{nosuchhelper}}b")]);
    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    let output = tracing::subscriber::with_default(subscriber, || {
        site.render_index(&store(), 1).expect("render")
    });
    assert_eq!(text(output), "ab");
    let lines = warnings.lines();
    assert!(
        lines
            .iter()
            .any(|line| line.contains("nosuchhelper") && line.contains("not implemented")),
        "no warning for the unknown helper: {lines:?}"
    );
}

#[test]
fn encode_query_escapes_its_argument() {
    let (_temp, site) = site_with(&[("index.hbs", "?q={{encode @blog.title}}")]);
    assert_eq!(text(site.render_index(&store(), 1).expect("render")), "?q=Field+Notes");
}

#[test]
fn foreach_walks_posts_and_their_tags() {
    let (_temp, site) = site_with(&[(
        "index.hbs",
        "{{#foreach posts}}{{#if @first}}*{{/if}}{{title}}[{{#foreach tags}}<{{name}}>{{/foreach}}]{{/foreach}}",
    )]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(output, "*Third[]Second[<Rust><Go>]");

    let output = text(site.render_index(&store(), 2).expect("render"));
    assert_eq!(output, "*First[<Rust>]");
}

#[test]
fn foreach_over_empty_collection_takes_else() {
    let (_temp, site) = site_with(&[(
        "index.hbs",
        "{{#foreach posts}}{{title}}{{else}}nothing yet{{/foreach}}",
    )]);
    let output = text(site.render_index(&empty_store(), 1).expect("render"));
    assert_eq!(output, "nothing yet");
}

#[test]
fn navigation_template_iterates_items() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "<nav>{{navigation}}</nav>"),
        (
            "partials/navigation.hbs",
            "{{#foreach navigation}}<a class=\"nav-{{slug}}\" href=\"{{url}}\">{{label}}</a>{{/foreach}}",
        ),
    ]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(
        output,
        "<nav><a class=\"nav-home\" href=\"/\">Home</a><a class=\"nav-about-me\" href=\"/about/\">About Me</a></nav>"
    );
}

#[test]
fn pagination_counts_and_links() {
    let (_temp, site) = site_with(&[(
        "index.hbs",
        "{{page}}/{{pages}}[{{page_url prev}}][{{page_url next}}]",
    )]);
    assert_eq!(
        text(site.render_index(&store(), 1).expect("render")),
        "1/2[][/page/2/]"
    );
    assert_eq!(
        text(site.render_index(&store(), 2).expect("render")),
        "2/2[/][]"
    );
}

#[test]
fn pagination_template_is_rendered_in_place() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "<ol/>{{pagination}}"),
        (
            "partials/pagination.hbs",
            "{{#if prev}}<a href=\"{{page_url prev}}\">newer</a>{{/if}}{{#if next}}<a href=\"{{page_url next}}\">older</a>{{/if}}",
        ),
    ]);
    assert_eq!(
        text(site.render_index(&store(), 1).expect("render")),
        "<ol/><a href=\"/page/2/\">older</a>"
    );
    assert_eq!(
        text(site.render_index(&store(), 2).expect("render")),
        "<ol/><a href=\"/\">newer</a>"
    );
}

#[test]
fn page_past_the_end_is_not_found() {
    let (_temp, site) = site_with(&[("index.hbs", "x")]);
    let err = site.render_index(&store(), 3).expect_err("page 3 is empty");
    assert!(err.is_not_found());
}

#[test]
fn huge_page_numbers_are_not_found() {
    let (_temp, site) = site_with(&[("index.hbs", "x")]);
    let store = store();
    let err = site.render_index(&store, i64::MAX).expect_err("offset overflows");
    assert!(err.is_not_found());
    assert!(err.to_string().contains("of index"));

    let err = site.render_tag(&store, "rust", i64::MAX).expect_err("offset overflows");
    assert!(err.is_not_found());
    let err = site.render_author(&store, "ada", i64::MAX).expect_err("offset overflows");
    assert!(err.is_not_found());
}

#[test]
fn first_page_of_empty_blog_still_renders() {
    let (_temp, site) = site_with(&[("index.hbs", "{{pages}}")]);
    assert_eq!(text(site.render_index(&empty_store(), 1).expect("render")), "1");
}

#[test]
fn tag_listing_falls_back_to_index() {
    let (_temp, site) = site_with(&[(
        "index.hbs",
        "index:{{#foreach posts}}{{title}},{{/foreach}}",
    )]);
    let output = text(site.render_tag(&store(), "rust", 1).expect("render"));
    assert_eq!(output, "index:Second,First,");
}

#[test]
fn tag_template_sees_the_tag() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "index"),
        ("tag.hbs", "{{tag.name}}|{{body_class}}|{{meta_title}}"),
    ]);
    let output = text(site.render_tag(&store(), "rust", 1).expect("render"));
    assert_eq!(output, "Rust|tag-template tag-rust|Rust - Field Notes");

    let err = site.render_tag(&store(), "nope", 1).expect_err("unknown tag");
    assert!(err.is_not_found());
}

#[test]
fn author_listing_uses_author_template() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "index"),
        ("author.hbs", "{{author.name}}:{{#foreach posts}}{{title}},{{/foreach}}"),
    ]);
    let output = text(site.render_author(&store(), "ada", 1).expect("render"));
    assert_eq!(output, "Ada:Third,First,");

    let err = site.render_author(&store(), "nobody", 1).expect_err("unknown author");
    assert!(err.is_not_found());
}

#[test]
fn post_template_selection() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "index"),
        ("post.hbs", "post:{{title}}"),
        ("page.hbs", "page:{{title}}"),
    ]);
    assert_eq!(text(site.render_post(&store(), "first").expect("render")), "post:First");
    assert_eq!(text(site.render_post(&store(), "about").expect("render")), "page:About");

    let (_temp, site) = site_with(&[
        ("index.hbs", "index"),
        ("post.hbs", "post:{{title}}"),
        ("page-about.hbs", "custom:{{title}}"),
    ]);
    assert_eq!(text(site.render_post(&store(), "about").expect("render")), "custom:About");
}

#[test]
fn unpublished_and_unknown_posts_are_not_found() {
    let (_temp, site) = site_with(&[("index.hbs", "index")]);
    let err = site.render_post(&store(), "draft").expect_err("draft");
    assert!(matches!(err, RenderError::NotFound(_)));
    let err = site.render_post(&store(), "missing").expect_err("missing");
    assert!(matches!(err, RenderError::NotFound(_)));
}

#[test]
fn post_fields_and_dates() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "index"),
        (
            "post.hbs",
            "{{#post}}{{date format=\"YYYY-MM-DD\"}}|{{excerpt words=\"2\"}}|{{url absolute=\"true\"}}|{{author}}|{{tags}}{{/post}}",
        ),
    ]);
    let output = text(site.render_post(&store(), "first").expect("render"));
    assert_eq!(
        output,
        "2024-01-01|One two|https://example.com/first/|<a href=\"/author/ada/\">Ada</a>|<a href=\"/tag/rust/\">Rust</a>"
    );
}

#[test]
fn ghost_head_describes_the_page() {
    let (_temp, site) = site_with(&[("index.hbs", "index"), ("post.hbs", "{{ghost_head}}")]);
    let output = text(site.render_post(&store(), "first").expect("render"));
    assert!(output.starts_with("<link rel=\"canonical\" href=\"https://example.com/first/\">\n"));
    assert!(output.contains("<meta property=\"og:type\" content=\"article\">"));
    assert!(output.contains(
        "<meta property=\"article:published_time\" content=\"2024-01-01T10:00:00Z\">"
    ));
    assert!(output.contains("\"@type\": \"Article\""));
    assert!(output.ends_with("</script>\n"));
}

#[test]
fn partials_render_in_the_caller_context() {
    let (_temp, site) = site_with(&[
        ("index.hbs", "{{#foreach posts}}{{> card}}{{/foreach}}"),
        ("partials/card.hbs", "<article class=\"{{post_class}}\">{{title}}</article>"),
    ]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(
        output,
        "<article class=\"post\">Third</article><article class=\"post tag-rust tag-go\">Second</article>"
    );
}

#[test]
fn content_for_fills_named_block_in_layout() {
    let (_temp, site) = site_with(&[
        (
            "index.hbs",
            "{{!< default}}{{#contentFor \"scripts\"}}<script src=\"{{asset \"app.js\"}}\"></script>{{/contentFor}}main",
        ),
        ("default.hbs", "<head>{{{block \"scripts\"}}}{{{block \"styles\"}}}</head>{{{body}}}"),
    ]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(output, "<head><script src=\"/assets/app.js\"></script></head>main");
}

#[test]
fn recursive_partials_stop_at_the_depth_limit() {
    let (_temp, site) = site_with(&[("index.hbs", "x{{> loop}}"), ("loop.hbs", "y{{> loop}}")]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert!(output.starts_with("xy"));
    assert_eq!(output.matches('y').count(), MAX_DEPTH);
}

#[test]
fn self_referencing_content_block_stops_at_the_depth_limit() {
    let (_temp, site) = site_with(&[(
        "index.hbs",
        "{{#contentFor \"x\"}}A{{block \"x\"}}{{/contentFor}}{{block \"x\"}}",
    )]);
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(output, "A".repeat(MAX_DEPTH));
}

#[test]
fn site_settings_override_store_metadata() {
    let temp = TempDir::new().expect("tempdir");
    write_theme(
        temp.path(),
        "casper",
        &[("index.hbs", "{{@blog.url}}|{{asset \"css/screen.css\"}}"), ("post.hbs", "")],
    );
    let settings = quire_core::SiteSettings {
        url: Some("https://blog.example.org".to_string()),
        asset_path: Some("/static/".to_string()),
    };
    let site = Site::new(temp.path()).with_settings(settings);
    site.compile("casper").expect("compile");
    let output = text(site.render_index(&store(), 1).expect("render"));
    assert_eq!(output, "https://blog.example.org/|/static/css/screen.css");
}
