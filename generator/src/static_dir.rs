use std::{fs, path::Path};

use include_dir::{Dir, include_dir};

static STATIC_DIR: Dir = include_dir!("$OUT_DIR/static");

/// Copy the embedded theme assets.
pub fn copy_static_dir_to(out_dir: impl AsRef<Path>) -> std::io::Result<()> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    copy_embedded_dir(&STATIC_DIR, out_dir)
}

fn copy_embedded_dir(dir: &Dir, out_dir: impl AsRef<Path>) -> std::io::Result<()> {
    let out_dir = out_dir.as_ref();

    for entry in dir.entries() {
        match entry {
            include_dir::DirEntry::Dir(subdir) => {
                copy_embedded_dir(subdir, out_dir)?;
            }
            include_dir::DirEntry::File(file) => {
                // only create dir when needed
                let path = out_dir.join(file.path());
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(path, file.contents())?;
            }
        }
    }

    Ok(())
}

/// Copy a directory from the docs source, merging into `dest_dir`.
pub fn copy_dir_all(source_dir: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> std::io::Result<()> {
    let source_dir = source_dir.as_ref();
    let dest_dir = dest_dir.as_ref();

    fs::create_dir_all(dest_dir)?;

    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;

        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), dest_dir.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dest_dir.join(entry.file_name()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_file_exists(path: &str) -> bool {
        STATIC_DIR.get_file(path).is_some()
    }

    #[test]
    fn theme_assets_are_embedded() {
        assert!(embedded_file_exists("css/theme.css"));
        assert!(embedded_file_exists("css/plain.css"));
        assert!(embedded_file_exists("css/folders.css"));
        // partials are only bundled
        assert!(!embedded_file_exists("css/_base.css"));
    }

    #[test]
    fn copy_embedded() {
        let dir = tempfile::tempdir().unwrap();
        copy_static_dir_to(dir.path().join("_static")).unwrap();

        let css = fs::read_to_string(dir.path().join("_static/css/folders.css")).unwrap();
        assert!(css.contains(".folders"));
    }

    #[test]
    fn copy_nested_dir() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("img/icons")).unwrap();
        fs::write(src.path().join("img/logo.svg"), "<svg/>").unwrap();
        fs::write(src.path().join("img/icons/a.png"), "png").unwrap();

        let dst = tempfile::tempdir().unwrap();
        copy_dir_all(src.path(), dst.path().join("out")).unwrap();

        assert!(dst.path().join("out/img/logo.svg").is_file());
        assert!(dst.path().join("out/img/icons/a.png").is_file());
    }
}
