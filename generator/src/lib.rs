use std::path::PathBuf;

mod config;
mod directives;
mod generator;
mod markdown;
mod outline;
mod pages;
mod static_dir;

pub use config::{CONFIG_FILE, Config};
pub use directives::{Directive, Directives, FoldersDirective};
pub use outline::{Entry, EntryId, EntryKind, Outline};

pub fn build(in_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> anyhow::Result<()> {
    let generator = generator::Generator::new(in_dir, out_dir)?;
    generator.build()?;
    Ok(())
}
