use std::path::{Path, PathBuf};

use hypertext::prelude::*;

use crate::markdown;

#[derive(Debug, Clone)]
pub struct NavPage {
    pub url: String,
    pub title: String,
    /// Directory of the source file, relative to the source dir.
    pub dir: PathBuf,
    pub is_index: bool,
}

impl NavPage {
    pub fn new(md_path: impl AsRef<Path>, title: impl Into<String>) -> Self {
        let md_path = md_path.as_ref();

        Self {
            url: markdown::page_url(md_path),
            title: title.into(),
            dir: md_path.parent().map(Path::to_path_buf).unwrap_or_default(),
            is_index: md_path.file_stem().and_then(|x| x.to_str()) == Some("index"),
        }
    }

    /// The section the page is listed under: its own directory, or the
    /// parent directory for `index.md`.
    fn listed_in(&self) -> &Path {
        if self.is_index {
            self.dir.parent().unwrap_or_else(|| Path::new(""))
        } else {
            &self.dir
        }
    }

    fn level(&self) -> usize {
        self.listed_in().components().count()
    }

    /// Section first, then the index page, then by URL.
    pub fn sort(pages: &mut [Self]) {
        pages.sort_by(|a, b| {
            (&a.dir, !a.is_index, &a.url).cmp(&(&b.dir, !b.is_index, &b.url))
        });
    }
}

#[derive(Clone)]
pub struct Sidebar<'a> {
    pub pages: &'a [NavPage],
    pub active_url: &'a str,
    pub collapse: bool,
}

impl<'a> Sidebar<'a> {
    /// With `collapse`, only sections on the way to the active page are expanded.
    pub fn visible(&self) -> impl Iterator<Item = &'a NavPage> {
        let active_dir = self
            .pages
            .iter()
            .find(|p| p.url == self.active_url)
            .map_or_else(PathBuf::new, |p| p.dir.clone());
        let collapse = self.collapse;

        self.pages
            .iter()
            .filter(move |p| !collapse || active_dir.starts_with(p.listed_in()))
    }
}

impl Renderable for Sidebar<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        let level_class = |page: &NavPage| format!("level-{}", page.level());

        rsx! {
            <nav class="sidebar">
                <ul>
                    @for page in self.visible() {
                        <li class=(level_class(page))>
                            <a href=(page.url) class=@if page.url == self.active_url { "active" }>
                                (page.title)
                            </a>
                        </li>
                    }
                </ul>
            </nav>
        }
        .render_to(buffer);
    }
}
