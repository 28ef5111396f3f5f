use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, anyhow};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::{
    config::{self, Config},
    directives::Directives,
    markdown::{self, Markdown},
    pages,
};

pub struct Generator {
    src_dir: PathBuf,
    dst_dir: PathBuf,
    config: Config,
    directives: Directives,
    exclude: Gitignore,
    last_updated: Option<String>,
}

#[derive(Debug, Default)]
struct Sources {
    /// Relative to the source dir.
    pages: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl Generator {
    pub fn new(src_dir: impl Into<PathBuf>, dst_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let src_dir = src_dir.into();
        let dst_dir = dst_dir.into();

        if dst_dir.try_exists()? {
            return Err(anyhow!("output dir already exists: {}", dst_dir.display()));
        }

        let config_file = src_dir.join(config::CONFIG_FILE);
        log::info!("read config from: {}", config_file.display());
        let config = Config::from_file(&config_file)?;

        Self::check_highlight_theme(&config.highlight_theme)?;

        let directives = Directives::from_names(&config.directives)?;
        let exclude = Self::exclude_matcher(&src_dir, &dst_dir, &config)?;

        let last_updated = config
            .last_updated_fmt
            .as_deref()
            .map(|fmt| {
                let has_error = chrono::format::StrftimeItems::new(fmt)
                    .any(|item| matches!(item, chrono::format::Item::Error));
                if has_error {
                    Err(anyhow!("invalid last_updated_fmt: {fmt}"))
                } else {
                    Ok(chrono::Local::now().format(fmt).to_string())
                }
            })
            .transpose()?;

        Ok(Self {
            src_dir,
            dst_dir,
            config,
            directives,
            exclude,
            last_updated,
        })
    }

    pub fn build(self) -> anyhow::Result<()> {
        log::info!("create dest dir: {}", self.dst_dir.display());
        fs::create_dir_all(&self.dst_dir)?;

        let static_dst = self.dst_dir.join(config::STATIC_DIR);
        log::info!("copy theme assets: {}", config::STATIC_DIR);
        crate::static_dir::copy_static_dir_to(&static_dst)?;

        for static_path in &self.config.static_paths {
            log::info!("copy static path: {}", static_path.display());
            crate::static_dir::copy_dir_all(self.src_dir.join(static_path), &static_dst)
                .with_context(|| format!("failed to copy static path: {}", static_path.display()))?;
        }

        let sources = self.collect_sources()?;

        for rel_path in &sources.files {
            log::info!("copy file: {}", rel_path.display());
            let dst_path = self.dst_dir.join(rel_path);
            if let Some(parent) = dst_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.src_dir.join(rel_path), dst_path)?;
        }

        let mut all_md = Vec::with_capacity(sources.pages.len());
        for rel_path in &sources.pages {
            log::info!("build md: {}", rel_path.display());
            let md = Markdown::builder(&self.src_dir, rel_path)
                .with_context(|| format!("failed to open the file: {}", rel_path.display()))?
                .directives(&self.directives)
                .highlight_theme(&self.config.highlight_theme)
                .build()
                .with_context(|| format!("failed to build page: {}", rel_path.display()))?;
            all_md.push(md);
        }

        let mut nav_pages: Vec<_> = all_md
            .iter()
            .filter(|md| !md.orphan)
            .map(|md| pages::NavPage::new(&md.file_path, md.title.markdown.clone()))
            .collect();
        pages::NavPage::sort(&mut nav_pages);

        for md in &all_md {
            self.render_markdown(md, &nav_pages)?;
        }

        log::info!("built {} pages", all_md.len());

        Ok(())
    }

    fn exclude_matcher(
        src_dir: &Path,
        dst_dir: &Path,
        config: &Config,
    ) -> anyhow::Result<Gitignore> {
        let mut builder = GitignoreBuilder::new(src_dir);

        // always skipped, anchored to the source root
        builder.add_line(None, &format!("/{}", config::CONFIG_FILE))?;
        builder.add_line(None, "/.git")?;
        for static_path in &config.static_paths {
            builder.add_line(None, &format!("/{}", static_path.display()))?;
        }
        if let Some(rel) = nested_dir(src_dir, dst_dir) {
            log::debug!("exclude dest dir inside source: {rel}");
            builder.add_line(None, &format!("/{rel}"))?;
        }

        for pattern in &config.exclude_patterns {
            builder
                .add_line(None, pattern)
                .with_context(|| format!("invalid exclude pattern: {pattern}"))?;
        }

        Ok(builder.build()?)
    }

    fn check_highlight_theme(name: &str) -> anyhow::Result<()> {
        let themes = syntect::highlighting::ThemeSet::load_defaults();
        if themes.themes.contains_key(name) {
            Ok(())
        } else {
            let mut known: Vec<_> = themes.themes.keys().map(String::as_str).collect();
            known.sort_unstable();
            Err(anyhow!(
                "unknown highlight theme `{name}`, expected one of: {}",
                known.join(", ")
            ))
        }
    }

    fn collect_sources(&self) -> anyhow::Result<Sources> {
        let exclude = self.exclude.clone();

        let walker = ignore::WalkBuilder::new(&self.src_dir)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !exclude.matched(entry.path(), is_dir).is_ignore()
            })
            .build();

        let mut sources = Sources::default();

        for entry in walker {
            let entry = entry?;

            if entry.file_type().is_none_or(|t| t.is_dir()) {
                continue;
            }

            let Ok(rel_path) = entry.path().strip_prefix(&self.src_dir) else {
                log::warn!("cannot get relative path for {}", entry.path().display());
                continue;
            };

            if rel_path.extension().and_then(|x| x.to_str()) == Some("md") {
                sources.pages.push(rel_path.to_path_buf());
            } else {
                sources.files.push(rel_path.to_path_buf());
            }
        }

        Ok(sources)
    }

    fn render_markdown(&self, md: &Markdown, nav_pages: &[pages::NavPage]) -> anyhow::Result<()> {
        let html_path = markdown::page_output_path(&md.file_path);
        let url = markdown::page_url(&md.file_path);

        let title = if md.file_path == Path::new(config::INDEX_MD) {
            self.config.project.clone()
        } else {
            self.title_with_project(&md.title.markdown)
        };

        let stylesheets = self.stylesheets(md);

        let page = pages::Base {
            head: pages::Head {
                title: &title,
                description: md.description.as_ref().map(|x| x.markdown.as_str()),
                author: &self.config.author,
                stylesheets: &stylesheets,
            },
            body: pages::Body {
                header: pages::Header {
                    project: &self.config.project,
                },
                sidebar: self.config.theme.show_sidebar.then_some(pages::Sidebar {
                    pages: nav_pages,
                    active_url: &url,
                    collapse: self.config.theme.collapse_navigation,
                }),
                page_toc: (self.config.theme.show_page_toc && !md.headings.is_empty())
                    .then_some(pages::PageToc {
                        headings: &md.headings,
                    }),
                footer: pages::Footer {
                    copyright: self.config.copyright.as_deref(),
                    last_updated: self.last_updated.as_deref(),
                },
                main: pages::Article { raw_html: &md.html },
            },
        };

        let output_path = self.dst_dir.join(&html_path);
        page.render_into(output_path)
            .context("failed to render page into file")?;

        Ok(())
    }

    /// Theme first, then the directives used on the page, then the user's css files.
    fn stylesheets(&self, md: &Markdown) -> Vec<String> {
        let mut ret = vec![config::static_url(self.config.theme.name.stylesheet())];

        let directive_css = md
            .directives
            .iter()
            .filter_map(|name| self.directives.get(name))
            .flat_map(|d| d.stylesheets());

        for path in directive_css {
            let url = config::static_url(path);
            if !ret.contains(&url) {
                ret.push(url);
            }
        }

        ret.extend(self.config.css_files.iter().map(|x| config::static_url(x)));

        ret
    }

    fn title_with_project(&self, title: &str) -> String {
        format!("{} - {}", title, self.config.project)
    }
}

/// `dst_dir` relative to `src_dir` with `/` separators, if it lies inside it.
fn nested_dir(src_dir: &Path, dst_dir: &Path) -> Option<String> {
    let rel = match dst_dir.strip_prefix(src_dir) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => {
            let src_dir = std::path::absolute(src_dir).ok()?;
            let dst_dir = std::path::absolute(dst_dir).ok()?;
            dst_dir.strip_prefix(src_dir).ok()?.to_path_buf()
        }
    };

    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join("/"))
}

trait RenderIntoExt {
    fn render_into(&self, output_path: impl AsRef<Path>) -> std::io::Result<()>;
}

impl<T: hypertext::Renderable> RenderIntoExt for T {
    fn render_into(&self, output_path: impl AsRef<Path>) -> std::io::Result<()> {
        let rendered = self.render().into_inner();

        let content = minify_html::minify(rendered.as_bytes(), &minify_html::Cfg::new());

        if let Some(parent_dir) = output_path.as_ref().parent() {
            fs::create_dir_all(parent_dir)?;
        }
        std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(output_path)?
            .write_all(&content)
    }
}
