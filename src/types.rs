use serde::Serialize;
use std::path::PathBuf;

pub const TOOL_NAME: &str = "butler";
pub const TOOL_PATH_VAR: &str = "BUTLER_PATH";
pub const TOOL_DIR_VAR: &str = "BUTLER_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    pub url: String,
    pub file_name: String,
}

/// A ready-to-use copy of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledTool {
    pub path: PathBuf,
    pub version: String,
    pub directory: PathBuf,
    /// True when the copy came from the cache rather than a fresh download.
    pub cached: bool,
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr; butler prints its version banner to either
    /// depending on the release.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}
