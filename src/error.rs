use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the installer itself. Collaborator errors (network,
/// filesystem, archive) travel as `anyhow::Error` and keep their own chain.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid version string: {0}")]
    InvalidVersion(String),

    #[error("RUNNER_TEMP is not set; set it or pass --temp-dir")]
    MissingTempDir,

    #[error("Unsupported platform '{0}': butler is published for linux, darwin and windows only")]
    UnsupportedPlatform(String),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to extract butler from {}!", archive.display())]
    ExtractionFailed { archive: PathBuf },

    #[error("Expected {} after extraction, but it does not exist", path.display())]
    BinaryMissing { path: PathBuf },

    #[error("Failed to get version from {}!\n{output}", tool.display())]
    VersionParse { tool: PathBuf, output: String },

    #[error("{command} exited with {}\n{output}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("{} is not accessible", path.display())]
    NotAccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
