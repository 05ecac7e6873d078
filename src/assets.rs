//! Static asset pass.
//!
//! Files below `[build] static` are copied verbatim into the output root,
//! keeping their relative paths. Up-to-date files are skipped unless the
//! build is clean.

use crate::{config::SiteConfig, log, logger::ProgressBars};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use walkdir::WalkDir;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Whether `dst` exists and is at least as new as `src`.
pub fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let (Ok(src_meta), Ok(dst_meta)) = (src.metadata(), dst.metadata()) else {
        return false;
    };
    let (Ok(src_time), Ok(dst_time)) = (src_meta.modified(), dst_meta.modified()) else {
        return false;
    };
    src_time <= dst_time
}

/// Copy one static file below `output`. Returns whether it was copied.
pub fn copy_asset(path: &Path, static_dir: &Path, output: &Path, clean: bool) -> Result<bool> {
    let relative = path
        .strip_prefix(static_dir)
        .with_context(|| format!("`{}` is outside the static directory", path.display()))?;
    let dest = output.join(relative);

    if !clean && is_up_to_date(path, &dest) {
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &dest)
        .with_context(|| format!("Failed to copy `{}`", relative.display()))?;
    Ok(true)
}

/// Copy the static directory of `config` into the output. Returns the number
/// of files copied.
pub fn copy_static(config: &SiteConfig) -> Result<usize> {
    let static_dir = &config.build.static_dir;
    let output = &config.build.output;
    let clean = config.build.clean;

    let files = collect_all_files(static_dir);
    if files.is_empty() {
        return Ok(0);
    }

    let progress = ProgressBars::new_filtered(&[("assets", files.len())]);
    let has_error = AtomicBool::new(false);
    let copied = AtomicUsize::new(0);

    let result = files.par_iter().try_for_each(|path| {
        if has_error.load(Ordering::Relaxed) {
            return Err(anyhow!("Aborted"));
        }
        match copy_asset(path, static_dir, output, clean) {
            Ok(done) => {
                if done {
                    copied.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(progress) = &progress {
                    progress.inc_by_name("assets");
                }
                Ok(())
            }
            Err(e) => {
                if !has_error.swap(true, Ordering::Relaxed) {
                    log!("error"; "{}: {:#}", path.display(), e);
                }
                Err(anyhow!("Asset copy failed"))
            }
        }
    });

    if let Some(progress) = progress {
        progress.finish();
    }
    result?;

    Ok(copied.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_all_files_skips_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "css/site.css", "body {}");
        write(dir.path(), ".DS_Store", "");
        write(dir.path(), "favicon.ico", "icon");

        let mut files = collect_all_files(dir.path());
        files.sort();
        assert_eq!(
            files,
            vec![dir.path().join("css/site.css"), dir.path().join("favicon.ico")]
        );
    }

    #[test]
    fn test_collect_all_files_missing_dir() {
        assert!(collect_all_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_copy_asset_then_skip() {
        let dir = TempDir::new().unwrap();
        let static_dir = dir.path().join("static");
        let output = dir.path().join("out");
        write(&static_dir, "img/logo.svg", "<svg/>");
        let source = static_dir.join("img/logo.svg");

        assert!(copy_asset(&source, &static_dir, &output, false).unwrap());
        assert_eq!(fs::read_to_string(output.join("img/logo.svg")).unwrap(), "<svg/>");

        assert!(!copy_asset(&source, &static_dir, &output, false).unwrap());
        assert!(copy_asset(&source, &static_dir, &output, true).unwrap());
    }

    #[test]
    fn test_is_up_to_date_missing_dest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "a");
        assert!(!is_up_to_date(&dir.path().join("a.txt"), &dir.path().join("b.txt")));
    }

    #[test]
    fn test_copy_static() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.static_dir = dir.path().join("static");
        config.build.output = dir.path().join("out");
        write(&config.build.static_dir, "robots.txt", "User-agent: *");
        write(&config.build.static_dir, "css/a.css", "a");

        assert_eq!(copy_static(&config).unwrap(), 2);
        assert!(config.build.output.join("css/a.css").exists());
        assert_eq!(copy_static(&config).unwrap(), 0);
    }
}
