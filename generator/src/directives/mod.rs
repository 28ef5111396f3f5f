//! Fenced code blocks that are expanded into HTML at build time.
//!
//! A block opened with ```` ```{folders} ```` (or ```` ```folders ````) is
//! handed to the directive registered under that name.

mod folders;

use anyhow::anyhow;

pub use folders::FoldersDirective;

pub trait Directive: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stylesheets the output depends on, relative to `_static/`.
    fn stylesheets(&self) -> &'static [&'static str] {
        &[]
    }

    fn render(&self, content: &str) -> String;
}

/// The directives enabled for one build.
#[derive(Default)]
pub struct Directives {
    registered: Vec<Box<dyn Directive>>,
}

impl Directives {
    pub fn builtin() -> Vec<Box<dyn Directive>> {
        vec![Box::new(FoldersDirective)]
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> anyhow::Result<Self> {
        let mut builtin = Self::builtin();
        let mut directives = Self::default();

        for name in names {
            let name = name.as_ref();

            if directives.get(name).is_some() {
                continue;
            }

            let idx = builtin
                .iter()
                .position(|d| d.name() == name)
                .ok_or_else(|| anyhow!("unknown directive: {name}"))?;
            directives.register(builtin.swap_remove(idx));
        }

        Ok(directives)
    }

    pub fn register(&mut self, directive: Box<dyn Directive>) {
        log::debug!("register directive: {}", directive.name());
        self.registered.push(directive);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.registered
            .iter()
            .find(|d| d.name() == name)
            .map(|d| &**d)
    }

    /// Look up the directive for a code block info string.
    pub fn for_info(&self, info: &str) -> Option<&dyn Directive> {
        let name = info.split_whitespace().next()?;
        let name = name
            .strip_prefix('{')
            .and_then(|x| x.strip_suffix('}'))
            .unwrap_or(name);
        self.get(name)
    }

    /// Stylesheets of every registered directive, without duplicates.
    pub fn stylesheets(&self) -> Vec<&'static str> {
        let mut ret = Vec::new();
        for path in self.registered.iter().flat_map(|d| d.stylesheets()) {
            if !ret.contains(path) {
                ret.push(*path);
            }
        }
        ret
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.registered.iter().map(|d| d.name())
    }
}
