//! Runner tool cache: `<root>/<name>/<version>/<arch>/`, with an
//! `<arch>.complete` marker next to each finished entry.

#[cfg(test)]
use mockall::automock;

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Every published butler build targets amd64, which the runner cache files
/// under `x64`.
pub const DEFAULT_CACHE_ARCH: &str = "x64";

#[cfg_attr(test, automock)]
pub trait ToolCache: Send + Sync {
    /// Versions of `name` with a completed cache entry.
    fn find_all_versions(&self, name: &str) -> Vec<String>;

    fn find(&self, name: &str, version: &str) -> Option<PathBuf>;

    /// Copies `source` into the cache and returns the cached directory.
    fn cache_dir(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf>;
}

pub struct FsToolCache {
    root: PathBuf,
    arch: String,
}

impl FsToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            arch: DEFAULT_CACHE_ARCH.to_string(),
        }
    }

    fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }

    fn entry_dir(&self, name: &str, version: &str) -> PathBuf {
        self.version_dir(name, version).join(&self.arch)
    }

    fn marker(&self, name: &str, version: &str) -> PathBuf {
        self.version_dir(name, version)
            .join(format!("{}.complete", self.arch))
    }
}

impl ToolCache for FsToolCache {
    fn find_all_versions(&self, name: &str) -> Vec<String> {
        let tool_dir = self.root.join(name);
        let entries = match fs::read_dir(&tool_dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::debug!("No cache directory at {}", tool_dir.display());
                return Vec::new();
            }
        };

        let mut versions: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|version| self.find(name, version).is_some())
            .collect();
        versions.sort();
        versions
    }

    fn find(&self, name: &str, version: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(name, version);
        if dir.is_dir() && self.marker(name, version).is_file() {
            tracing::debug!("Found {} {} in tool cache: {}", name, version, dir.display());
            Some(dir)
        } else {
            tracing::debug!("{} {} is not in the tool cache", name, version);
            None
        }
    }

    fn cache_dir(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf> {
        if !source.is_dir() {
            return Err(anyhow!("{} is not a directory", source.display()));
        }

        let version_dir = self.version_dir(name, version);
        let dest = self.entry_dir(name, version);
        let marker = self.marker(name, version);
        tracing::debug!("Caching {} into {}", source.display(), dest.display());

        fs::create_dir_all(&version_dir)
            .with_context(|| format!("Could not create {}", version_dir.display()))?;

        // Stage beside the destination so the final move is a rename.
        let staging = TempDir::new_in(&version_dir)?;
        copy_tree(source, staging.path())?;

        if marker.exists() {
            fs::remove_file(&marker)?;
        }
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }
        fs::rename(staging.keep(), &dest)
            .with_context(|| format!("Could not move staged files into {}", dest.display()))?;
        fs::write(&marker, "")?;

        Ok(dest)
    }
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            // fs::copy carries permission bits along.
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Could not copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}
