// src/watch/roots.rs

use std::path::{Path, PathBuf};

use crate::config::WatchSection;
use crate::context::Settings;
use crate::errors::{Result, SitegenError};
use crate::fs::FileSystem;

/// Directories to watch in monitor mode.
///
/// - With `[watch].dirs`, each entry (relative to the source directory) must
///   be an existing directory.
/// - Otherwise every top-level directory of the source tree is watched,
///   skipping hidden directories and the output directory (which the pipeline
///   itself rewrites on every run).
///
/// The result is sorted and free of duplicates.
pub fn resolve_watch_roots(
    fs: &dyn FileSystem,
    settings: &Settings,
    watch: &WatchSection,
) -> Result<Vec<PathBuf>> {
    let mut roots = if watch.dirs.is_empty() {
        top_level_dirs(fs, settings)?
    } else {
        configured_dirs(fs, settings, &watch.dirs)?
    };

    roots.sort();
    roots.dedup();

    if roots.is_empty() {
        return Err(SitegenError::ConfigError(format!(
            "nothing to watch: {} has no directories",
            settings.source_dir.display()
        )));
    }

    Ok(roots)
}

fn configured_dirs(
    fs: &dyn FileSystem,
    settings: &Settings,
    dirs: &[String],
) -> Result<Vec<PathBuf>> {
    dirs.iter()
        .map(|dir| {
            let path = settings.source_dir.join(dir);
            if !fs.is_dir(&path) {
                return Err(SitegenError::ConfigError(format!(
                    "watch directory {} does not exist",
                    path.display()
                )));
            }
            if is_inside(&path, &settings.output_dir) {
                return Err(SitegenError::ConfigError(format!(
                    "watch directory {} is inside the output directory",
                    path.display()
                )));
            }
            Ok(path)
        })
        .collect()
}

fn top_level_dirs(fs: &dyn FileSystem, settings: &Settings) -> Result<Vec<PathBuf>> {
    let entries = fs.read_dir(&settings.source_dir)?;
    Ok(entries
        .into_iter()
        .filter(|p| fs.is_dir(p))
        .filter(|p| !is_hidden(p))
        .filter(|p| !is_inside(p, &settings.output_dir))
        .collect())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_inside(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn site() -> (MockFileSystem, Settings) {
        let fs = MockFileSystem::new();
        fs.add_dir("/site/views");
        fs.add_dir("/site/data");
        fs.add_dir("/site/.git");
        fs.add_dir("/site/_output");
        fs.add_file("/site/sitegen.toml", "");
        (fs, Settings::new("/site"))
    }

    #[test]
    fn defaults_to_top_level_directories() {
        let (fs, settings) = site();
        let roots = resolve_watch_roots(&fs, &settings, &WatchSection::default()).unwrap();
        assert_eq!(
            roots,
            vec![PathBuf::from("/site/data"), PathBuf::from("/site/views")]
        );
    }

    #[test]
    fn configured_directories_must_exist() {
        let (fs, settings) = site();
        let watch = WatchSection {
            dirs: vec!["views".into(), "views".into()],
        };
        assert_eq!(
            resolve_watch_roots(&fs, &settings, &watch).unwrap(),
            vec![PathBuf::from("/site/views")]
        );

        let watch = WatchSection {
            dirs: vec!["assets".into()],
        };
        let err = resolve_watch_roots(&fs, &settings, &watch).unwrap_err();
        assert!(matches!(err, SitegenError::ConfigError(msg) if msg.contains("assets")));
    }

    #[test]
    fn output_directory_is_never_watched() {
        let (fs, settings) = site();
        let watch = WatchSection {
            dirs: vec!["_output".into()],
        };
        assert!(resolve_watch_roots(&fs, &settings, &watch).is_err());
    }
}
