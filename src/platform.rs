use crate::error::InstallError;
use std::fmt;

/// Host operating systems butler is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

impl Platform {
    pub fn current() -> Result<Self, InstallError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an OS identifier (`std::env::consts::OS` or a Node-style
    /// `process.platform` value) to a platform.
    pub fn from_os(os: &str) -> Result<Self, InstallError> {
        match os.trim().to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::Darwin),
            "windows" | "win32" => Ok(Platform::Windows),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Archive variant segment used by the broth endpoints.
    pub fn variant(self) -> &'static str {
        match self {
            Platform::Linux => "linux-amd64",
            Platform::Darwin => "darwin-amd64",
            Platform::Windows => "windows-amd64",
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// File name of `tool` inside an extracted archive.
    pub fn executable_name(self, tool: &str) -> String {
        format!("{}{}", tool, self.exe_suffix())
    }

    pub fn needs_chmod(self) -> bool {
        self != Platform::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "windows",
        };
        f.write_str(name)
    }
}
