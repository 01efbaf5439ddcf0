//! Hands PATH entries and environment variables to later workflow steps.

#[cfg(test)]
use mockall::automock;

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg_attr(test, automock)]
pub trait Reporter: Send + Sync {
    /// Prepends `dir` to PATH for subsequent steps.
    fn add_path(&self, dir: &Path) -> Result<()>;

    fn export_variable(&self, name: &str, value: &str) -> Result<()>;
}

/// Writes to the runner's `GITHUB_PATH` / `GITHUB_ENV` command files.
#[derive(Debug, Clone, Default)]
pub struct GithubReporter {
    path_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl GithubReporter {
    pub fn new(path_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            path_file,
            env_file,
        }
    }

    pub fn from_env() -> Self {
        let non_empty = |key: &str| {
            std::env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(non_empty("GITHUB_PATH"), non_empty("GITHUB_ENV"))
    }
}

fn append_line(file: &Path, line: &str) -> Result<()> {
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Could not open {}", file.display()))?;
    writeln!(handle, "{}", line)?;
    Ok(())
}

fn env_file_entry(name: &str, value: &str) -> Result<String> {
    if name.is_empty() || name.contains('=') || name.contains('\n') {
        return Err(anyhow!("Invalid environment variable name: {:?}", name));
    }
    if !value.contains('\n') {
        return Ok(format!("{}={}", name, value));
    }

    let delimiter = format!("ghadelimiter_{}", std::process::id());
    if value.contains(&delimiter) {
        return Err(anyhow!(
            "Value of {} contains the delimiter {}",
            name,
            delimiter
        ));
    }
    Ok(format!("{}<<{}\n{}\n{}", name, delimiter, value, delimiter))
}

impl Reporter for GithubReporter {
    fn add_path(&self, dir: &Path) -> Result<()> {
        match &self.path_file {
            Some(file) => {
                append_line(file, &dir.to_string_lossy())?;
                tracing::debug!("Added {} to {}", dir.display(), file.display());
            }
            None => tracing::warn!(
                "GITHUB_PATH is not set; add {} to PATH yourself",
                dir.display()
            ),
        }
        Ok(())
    }

    fn export_variable(&self, name: &str, value: &str) -> Result<()> {
        let entry = env_file_entry(name, value)?;
        match &self.env_file {
            Some(file) => append_line(file, &entry)?,
            None => tracing::warn!("GITHUB_ENV is not set; run `export {}={}`", name, value),
        }
        Ok(())
    }
}
