#[cfg(test)]
use mockall::automock;

use crate::error::InstallError;
use crate::types::ExecOutput;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` to completion. A non-zero exit is an error that carries
    /// the captured output.
    async fn exec(&self, program: &Path, args: Vec<String>) -> Result<ExecOutput>;
}

pub struct SystemRunner;

#[async_trait::async_trait]
impl ProcessRunner for SystemRunner {
    async fn exec(&self, program: &Path, args: Vec<String>) -> Result<ExecOutput> {
        let command_line = format!("{} {:?}", program.display(), args);
        tracing::debug!("Executing: {}", command_line);

        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("Failed to start {}", program.display()))?;

        let result = ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success() {
            return Err(InstallError::CommandFailed {
                command: command_line,
                code: result.code,
                output: result.combined(),
            }
            .into());
        }

        Ok(result)
    }
}
