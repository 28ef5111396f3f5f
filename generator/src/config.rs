use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "docsite.yaml";
pub const INDEX_MD: &str = "index.md";
pub const STATIC_DIR: &str = "_static";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub project: String,
    pub author: String,
    pub copyright: Option<String>,

    #[serde(default)]
    pub theme: Theme,

    /// Directories copied into `_static/`, relative to the source dir.
    #[serde(default)]
    pub static_paths: Vec<PathBuf>,
    /// Extra stylesheets, relative to `_static/`.
    #[serde(default)]
    pub css_files: Vec<String>,
    /// gitignore-style patterns, relative to the source dir.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    #[serde(default = "default_directives")]
    pub directives: Vec<String>,

    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,

    /// chrono format string for the "last updated" footer line.
    pub last_updated_fmt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Theme {
    #[serde(default)]
    pub name: ThemeName,
    #[serde(default = "default_true")]
    pub collapse_navigation: bool,
    #[serde(default = "default_true")]
    pub show_sidebar: bool,
    /// Links to the current page's sections next to the article.
    #[serde(default = "default_true")]
    pub show_page_toc: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Default,
    Plain,
}

impl ThemeName {
    pub fn stylesheet(self) -> &'static str {
        match self {
            Self::Default => "css/theme.css",
            Self::Plain => "css/plain.css",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: ThemeName::default(),
            collapse_navigation: true,
            show_sidebar: true,
            show_page_toc: true,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .with_context(|| format!("failed to open config: {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

pub fn static_url(rel_path: &str) -> String {
    format!("/{}/{}", STATIC_DIR, rel_path.trim_start_matches('/'))
}

fn default_directives() -> Vec<String> {
    vec!["folders".to_string()]
}

fn default_highlight_theme() -> String {
    "InspiredGitHub".to_string()
}

fn default_true() -> bool {
    true
}
