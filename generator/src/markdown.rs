#![allow(clippy::unused_self)]

use std::{
    cell::RefCell,
    collections::HashSet,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context as _;
use comrak::{
    arena_tree::Node,
    nodes::{Ast, NodeCodeBlock, NodeLink, NodeValue},
    plugins::syntect::SyntectAdapter,
};
use normalize_path::NormalizePath as _;
use regex::Regex;
use serde::Deserialize;

use crate::directives::Directives;

#[derive(Debug, Clone)]
pub struct Markdown {
    /// Relative to the source dir.
    pub file_path: PathBuf,
    pub title: Content,
    pub description: Option<Content>,
    pub html: String,
    /// Names of the directives expanded in this page, in first-use order.
    pub directives: Vec<&'static str>,
    /// Left out of the site navigation.
    pub orphan: bool,
    /// Level 2 and 3 headings, in document order.
    pub headings: Vec<Heading>,
}

/// A section heading linked from the page table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Same as the `id` attribute comrak writes on the heading.
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct Content {
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    orphan: bool,
}

pub struct MarkdownBuilder<'a> {
    file_path: PathBuf,
    original_content: String,
    options: comrak::Options<'static>,
    directives: Option<&'a Directives>,
    highlight_theme: Option<&'a str>,
}

impl Markdown {
    pub fn builder(
        base_dir: impl AsRef<Path>,
        file_path: impl Into<PathBuf>,
    ) -> Result<MarkdownBuilder<'static>, std::io::Error> {
        MarkdownBuilder::new(base_dir, file_path)
    }
}

impl<'a> MarkdownBuilder<'a> {
    pub fn new(
        base_dir: impl AsRef<Path>,
        file_path: impl Into<PathBuf>,
    ) -> Result<Self, std::io::Error> {
        let file_path = file_path.into();
        let original_content = std::fs::read_to_string(base_dir.as_ref().join(&file_path))?;

        Ok(Self::from_content(file_path, original_content))
    }

    pub fn from_content(file_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            original_content: content.into(),
            options: Self::options(),
            directives: None,
            highlight_theme: None,
        }
    }

    pub fn directives<'b>(self, directives: &'b Directives) -> MarkdownBuilder<'b>
    where
        'a: 'b,
    {
        MarkdownBuilder {
            directives: Some(directives),
            ..self
        }
    }

    pub fn highlight_theme<'b>(self, theme: &'b str) -> MarkdownBuilder<'b>
    where
        'a: 'b,
    {
        MarkdownBuilder {
            highlight_theme: Some(theme),
            ..self
        }
    }

    pub fn build(self) -> anyhow::Result<Markdown> {
        let arena = comrak::Arena::new();

        let root = comrak::parse_document(&arena, &self.original_content, &self.options);

        let mut used_directives = Vec::new();

        for node in root.descendants() {
            let mut data = node.data.borrow_mut();

            let replacement = match &mut data.value {
                NodeValue::Link(link) => {
                    self.patch_link(link)?;
                    None
                }
                NodeValue::Image(link) => {
                    self.patch_image_link(link)?;
                    None
                }
                NodeValue::CodeBlock(block) => self.expand_directive(block, &mut used_directives),
                _ => None,
            };

            if let Some(html) = replacement {
                data.value = NodeValue::Raw(html);
            }
        }

        let frontmatter = self.get_frontmatter(root)?;
        let title = self
            .get_title(&frontmatter, root)
            .context("title not found")?;
        let description = self.get_description(&frontmatter, root);
        let headings = self.get_headings(root);

        let mut html = String::new();
        match self.highlight_theme {
            Some(theme) => {
                let adapter = SyntectAdapter::new(Some(theme));
                let mut plugins = comrak::Plugins::default();
                plugins.render.codefence_syntax_highlighter = Some(&adapter);
                comrak::format_html_with_plugins(root, &self.options, &mut html, &plugins)?;
            }
            None => comrak::format_html(root, &self.options, &mut html)?,
        }

        Ok(Markdown {
            file_path: self.file_path,
            title,
            description,
            html,
            directives: used_directives,
            orphan: frontmatter.orphan,
            headings,
        })
    }

    fn options() -> comrak::Options<'static> {
        let extension = comrak::ExtensionOptions::builder()
            .strikethrough(true)
            .table(true)
            .autolink(true)
            .tasklist(true)
            .superscript(true)
            .header_ids(HEADING_ID_PREFIX.to_string())
            .footnotes(true)
            .description_lists(true)
            .front_matter_delimiter("---".to_string())
            .alerts(true)
            .math_dollars(true)
            .math_code(true)
            .shortcodes(true)
            .subscript(true)
            .cjk_friendly_emphasis(true)
            .build();
        let parse = comrak::ParseOptions::builder().build();
        let render = comrak::RenderOptions::builder()
            .experimental_minimize_commonmark(true)
            .build();

        comrak::Options {
            extension,
            parse,
            render,
        }
    }

    fn expand_directive(
        &self,
        block: &NodeCodeBlock,
        used: &mut Vec<&'static str>,
    ) -> Option<String> {
        let directive = self.directives?.for_info(&block.info)?;

        log::debug!(
            "expand directive `{}` in {}",
            directive.name(),
            self.file_path.display()
        );

        if !used.contains(&directive.name()) {
            used.push(directive.name());
        }

        Some(directive.render(&block.literal))
    }

    fn get_frontmatter<'n>(&self, root: &'n Node<'n, RefCell<Ast>>) -> anyhow::Result<Frontmatter> {
        let get_frontmatter_value = |node: &Node<'_, RefCell<Ast>>| -> Option<String> {
            if let NodeValue::FrontMatter(str) = &node.data.borrow().value {
                let str = str.trim().trim_matches('-').trim();
                Some(str.to_string())
            } else {
                None
            }
        };

        let ret = root
            .descendants()
            .find_map(get_frontmatter_value)
            .map(|s| serde_yaml::from_str::<Frontmatter>(&s))
            .transpose()
            .context("failed to parse yaml frontmatter")?
            .unwrap_or_default();

        Ok(ret)
    }

    fn get_title<'n>(
        &self,
        frontmatter: &Frontmatter,
        root: &'n Node<'n, RefCell<Ast>>,
    ) -> Option<Content> {
        let markdown = match &frontmatter.title {
            Some(title) => Some(title.to_string()),
            // find first h1 heading
            None => {
                let node = root.descendants().find(|node| {
                    matches!(
                        node.data.borrow().value,
                        NodeValue::Heading(heading) if heading.level == 1
                    )
                })?;
                let output = self.to_commonmark(node)?;
                Some(output.trim_start_matches('#').trim().to_string())
            }
        };

        markdown.map(|t| self.to_content(t))
    }

    /// Ids are assigned over every heading, so duplicates get the same
    /// `-1`, `-2` suffixes as in the rendered HTML.
    fn get_headings<'n>(&self, root: &'n Node<'n, RefCell<Ast>>) -> Vec<Heading> {
        let mut anchors = Anchors::default();

        root.descendants()
            .filter_map(|node| {
                let level = match &node.data.borrow().value {
                    NodeValue::Heading(heading) => heading.level,
                    _ => return None,
                };

                let mut text = String::new();
                collect_text(node, &mut text);
                let id = format!("{HEADING_ID_PREFIX}{}", anchors.anchorize(&text));

                TOC_LEVELS
                    .contains(&level)
                    .then(|| Heading { level, text, id })
            })
            .collect()
    }

    fn get_description<'n>(
        &self,
        frontmatter: &Frontmatter,
        root: &'n Node<'n, RefCell<Ast>>,
    ) -> Option<Content> {
        let markdown = match &frontmatter.description {
            Some(description) => Some(description.to_string()),
            // find first paragraph
            None => root
                .descendants()
                .find(|node| matches!(node.data.borrow().value, NodeValue::Paragraph))
                .and_then(|node| self.to_commonmark(node))
                .map(|x| x.trim().to_string()),
        };

        markdown.map(|t| self.to_content(t))
    }

    fn to_commonmark<'n>(&self, node: &'n Node<'n, RefCell<Ast>>) -> Option<String> {
        let mut output = String::new();
        comrak::format_commonmark(node, &self.options, &mut output).ok()?;
        Some(output)
    }

    fn to_content(&self, markdown: String) -> Content {
        Content {
            html: comrak::markdown_to_html(&markdown, &self.options),
            markdown,
        }
    }

    fn patch_link(&self, link: &mut NodeLink) -> anyhow::Result<()> {
        let Some(url) = self.resolve_local_url(&link.url)? else {
            return Ok(());
        };

        link.url = url;

        Ok(())
    }

    fn patch_image_link(&self, link: &mut NodeLink) -> anyhow::Result<()> {
        if is_external(&link.url) {
            return Ok(());
        }

        let new_path = get_abs_path(&self.file_path, &link.url)
            .context("the path is points outside current directory")?;

        link.url = new_path.to_string_lossy().to_string();

        Ok(())
    }

    /// `guide.md#setup` -> `/guide#setup`, `api/index.md` -> `/api/`
    fn resolve_local_url(&self, url: &str) -> anyhow::Result<Option<String>> {
        if is_external(url) {
            return Ok(None);
        }

        let (path, fragment) = match url.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (url, None),
        };

        let new_path = get_abs_path(&self.file_path, path)
            .with_context(|| format!("the path is points outside current directory: {url}"))?;

        let mut new_url = if new_path.extension().and_then(|x| x.to_str()) == Some("md") {
            page_url(&new_path)
        } else {
            new_path.to_str().context("the path isn't valid")?.to_string()
        };

        if let Some(fragment) = fragment {
            new_url.push('#');
            new_url.push_str(fragment);
        }

        Ok(Some(new_url))
    }
}

const HEADING_ID_PREFIX: &str = "heading-";

const TOC_LEVELS: std::ops::RangeInclusive<u8> = 2..=3;

static REJECTED_ANCHOR_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\p{Pc} -]").unwrap());

/// Heading ids as comrak derives them: lowercase, punctuation dropped,
/// spaces to `-`, numbered on repeats.
#[derive(Default)]
struct Anchors(HashSet<String>);

impl Anchors {
    fn anchorize(&mut self, text: &str) -> String {
        let base = REJECTED_ANCHOR_CHARS
            .replace_all(&text.to_lowercase(), "")
            .replace(' ', "-");

        let mut anchor = base.clone();
        let mut n = 0;
        while self.0.contains(&anchor) {
            n += 1;
            anchor = format!("{base}-{n}");
        }

        self.0.insert(anchor.clone());
        anchor
    }
}

fn collect_text<'n>(node: &'n Node<'n, RefCell<Ast>>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::LineBreak | NodeValue::SoftBreak => out.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// URL of the page rendered from a Markdown file.
///
/// `index.md` -> `/`, `guide/index.md` -> `/guide/`, `guide/setup.md` -> `/guide/setup`
pub fn page_url(md_path: impl AsRef<Path>) -> String {
    let path = md_path.as_ref().with_extension("");
    let path = path.strip_prefix("/").unwrap_or(&path);

    if path.file_name().and_then(|x| x.to_str()) == Some("index") {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        if dir.as_os_str().is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", dir.display())
        }
    } else {
        format!("/{}", path.display())
    }
}

/// Output file of the page rendered from a Markdown file.
///
/// `index.md` -> `index.html`, `guide/setup.md` -> `guide/setup/index.html`
pub fn page_output_path(md_path: impl AsRef<Path>) -> PathBuf {
    let path = md_path.as_ref().with_extension("");

    if path.file_name().and_then(|x| x.to_str()) == Some("index") {
        path.with_extension("html")
    } else {
        path.join("index.html")
    }
}

/// URLs, in-page anchors and site-absolute paths are left as written.
fn is_external(str: &str) -> bool {
    str.is_empty() || str.starts_with('#') || str.starts_with('/') || str.parse::<url::Url>().is_ok()
}

fn get_abs_path(
    markdown_path: impl AsRef<Path>,
    link_file_path: impl AsRef<Path>,
) -> Option<PathBuf> {
    let dir_path = markdown_path
        .as_ref()
        .parent()
        .unwrap_or_else(|| Path::new(""));
    let path = dir_path.join(link_file_path).try_normalize()?;
    Some(Path::new("/").join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_path(result: Option<PathBuf>, expected: Option<&str>) {
        println!("result: {:?}", result);
        assert_eq!(
            result.and_then(|x| x.to_str().map(|x| x.to_string())),
            expected.map(|x| x.to_string())
        );
    }

    fn build(path: &str, content: &str) -> Markdown {
        let directives = Directives::from_names(&["folders"]).unwrap();
        MarkdownBuilder::from_content(path, content)
            .directives(&directives)
            .build()
            .unwrap()
    }

    #[test]
    fn path_join() {
        test_path(
            get_abs_path("foo/bar.md", "images/image.png"),
            Some("/foo/images/image.png"),
        );

        test_path(
            get_abs_path("foo/bar.md", "./images/image.png"),
            Some("/foo/images/image.png"),
        );

        test_path(
            get_abs_path("foo/bar.md", "../images/image.png"),
            Some("/images/image.png"),
        );

        test_path(get_abs_path("foo/bar.md", "../../images/image.png"), None);
    }

    #[test]
    fn headings_for_toc() {
        let md = build(
            "page.md",
            "# Title\n\n## Getting `started`\n\n### Install, fast!\n\n#### Deep\n\n## Getting started\n",
        );

        let headings: Vec<_> = md
            .headings
            .iter()
            .map(|h| (h.level, h.text.as_str(), h.id.as_str()))
            .collect();
        assert_eq!(
            headings,
            [
                (2, "Getting started", "heading-getting-started"),
                (3, "Install, fast!", "heading-install-fast"),
                (2, "Getting started", "heading-getting-started-1"),
            ]
        );
        // ids match the ones comrak renders
        for heading in &md.headings {
            assert!(md.html.contains(&format!(r#"id="{}""#, heading.id)));
        }
    }

    #[test]
    fn anchors_are_unique() {
        let mut anchors = Anchors::default();
        assert_eq!(anchors.anchorize("Usage"), "usage");
        assert_eq!(anchors.anchorize("Usage"), "usage-1");
        assert_eq!(anchors.anchorize("usage"), "usage-2");
        assert_eq!(anchors.anchorize("snake_case & more"), "snake_case--more");
    }

    #[test]
    fn page_urls() {
        assert_eq!(page_url("index.md"), "/");
        assert_eq!(page_url("/index.md"), "/");
        assert_eq!(page_url("guide/index.md"), "/guide/");
        assert_eq!(page_url("/guide/setup.md"), "/guide/setup");
    }

    #[test]
    fn page_output_paths() {
        assert_eq!(page_output_path("index.md"), Path::new("index.html"));
        assert_eq!(page_output_path("api/index.md"), Path::new("api/index.html"));
        assert_eq!(
            page_output_path("guide/setup.md"),
            Path::new("guide/setup/index.html")
        );
    }

    #[test]
    fn basic_test_not_found() {
        assert!(Markdown::builder("", "tests/pages/not_found.md").is_err());
    }

    #[test]
    fn title_and_description_from_content() {
        let md = Markdown::builder("", "tests/pages/layout.md")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(md.title.markdown, "Project layout");
        let description = md.description.unwrap();
        assert_eq!(description.markdown, "How the sources are organised.");
        assert!(md.directives.is_empty());
    }

    #[test]
    fn title_from_frontmatter() {
        let md = build(
            "page.md",
            "---\ntitle: Custom\ndescription: Short\n---\n\n# Heading\n\nBody.\n",
        );

        assert_eq!(md.title.markdown, "Custom");
        assert_eq!(md.description.unwrap().markdown, "Short");
        assert!(!md.orphan);
    }

    #[test]
    fn orphan_from_frontmatter() {
        let md = build("404.md", "---\norphan: true\n---\n\n# Not found\n");
        assert!(md.orphan);
    }

    #[test]
    fn missing_title_is_an_error() {
        let directives = Directives::default();
        let res = MarkdownBuilder::from_content("page.md", "just text\n")
            .directives(&directives)
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn folders_block_is_expanded() {
        let md = Markdown::builder("", "tests/pages/layout.md")
            .unwrap()
            .directives(&Directives::from_names(&["folders"]).unwrap())
            .build()
            .unwrap();

        assert_eq!(md.directives, ["folders"]);
        assert!(md.html.contains(r#"<div class="line-block folders">"#));
        assert!(md.html.contains("📁 src"));
        assert!(md.html.contains("🖹 main.rs"));
        assert!(!md.html.contains("<code class=\"language-{folders}\">"));
        // plain code blocks are untouched
        assert!(md.html.contains("cargo build"));
    }

    #[test]
    fn plain_info_string_is_expanded() {
        let md = build("page.md", "# T\n\n```folders\n+ a\n  - b\n```\n");

        assert!(md.html.contains("📁 a"));
        assert!(md.html.contains("🖹 b"));
    }

    #[test]
    fn unregistered_directive_stays_code() {
        let directives = Directives::default();
        let md = MarkdownBuilder::from_content("page.md", "# T\n\n```{folders}\n- a\n```\n")
            .directives(&directives)
            .build()
            .unwrap();

        assert!(md.directives.is_empty());
        assert!(!md.html.contains("line-block"));
        assert!(md.html.contains("<pre"));
    }

    #[test]
    fn directive_used_twice_is_listed_once() {
        let md = build(
            "page.md",
            "# T\n\n```{folders}\n- a\n```\n\n```{folders}\n- b\n```\n",
        );

        assert_eq!(md.directives, ["folders"]);
        assert_eq!(md.html.matches("line-block folders").count(), 2);
    }

    #[test]
    fn local_links_are_rewritten() {
        let md = build(
            "guide/setup.md",
            "# T\n\n[a](install.md) [b](../index.md) [c](install.md#linux) [d](https://example.com/x.md) [e](#top) [f](/abs/path)\n",
        );

        assert!(md.html.contains(r#"href="/guide/install""#));
        assert!(md.html.contains(r#"href="/""#));
        assert!(md.html.contains(r#"href="/guide/install#linux""#));
        assert!(md.html.contains(r#"href="https://example.com/x.md""#));
        assert!(md.html.contains(r##"href="#top""##));
        assert!(md.html.contains(r#"href="/abs/path""#));
    }

    #[test]
    fn link_outside_source_dir_is_an_error() {
        let directives = Directives::default();
        let res = MarkdownBuilder::from_content("page.md", "# T\n\n[x](../../secret.md)\n")
            .directives(&directives)
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn image_links_are_made_absolute() {
        let md = build("guide/setup.md", "# T\n\n![shot](img/shot.png)\n");
        assert!(md.html.contains(r#"src="/guide/img/shot.png""#));
    }
}
