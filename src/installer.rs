//! Resolve-or-fetch: reuse a cached butler when there is one, otherwise
//! download the requested build, verify it and cache it.

use crate::cache::ToolCache;
use crate::config::Settings;
use crate::download::{make_executable, ArchiveFetcher};
use crate::error::InstallError;
use crate::exec::ProcessRunner;
use crate::remote::{archive_descriptor, ReleaseChannel};
use crate::reporter::Reporter;
use crate::types::{InstalledTool, TOOL_DIR_VAR, TOOL_NAME, TOOL_PATH_VAR};
use crate::version::{parse_reported_version, select_latest_installed, VersionRequest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const VERSION_FLAG: &str = "-V";
const UPGRADE_COMMAND: &str = "upgrade";

pub struct Installer {
    settings: Settings,
    cache: Box<dyn ToolCache>,
    fetcher: Box<dyn ArchiveFetcher>,
    channel: Box<dyn ReleaseChannel>,
    runner: Box<dyn ProcessRunner>,
    reporter: Box<dyn Reporter>,
}

impl Installer {
    pub fn new(
        settings: Settings,
        cache: Box<dyn ToolCache>,
        fetcher: Box<dyn ArchiveFetcher>,
        channel: Box<dyn ReleaseChannel>,
        runner: Box<dyn ProcessRunner>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            settings,
            cache,
            fetcher,
            channel,
            runner,
            reporter,
        }
    }

    pub async fn run(&self) -> Result<InstalledTool> {
        let tool = self.find_or_download().await?;

        tracing::debug!("{} -> {}", TOOL_DIR_VAR, tool.directory.display());
        self.reporter.add_path(&tool.directory)?;
        let tool_path = tool.path.to_string_lossy();
        self.reporter.export_variable(TOOL_PATH_VAR, &tool_path)?;
        tracing::info!("{} -> {}", TOOL_PATH_VAR, tool_path);

        let output = self
            .runner
            .exec(&tool.path, vec![VERSION_FLAG.to_string()])
            .await?;
        tracing::info!("{}", output.combined().trim_end());

        Ok(tool)
    }

    async fn find_or_download(&self) -> Result<InstalledTool> {
        let tool = match self.find_cached() {
            Some((version, directory)) => self.use_cached(version, directory).await?,
            None => self.download().await?,
        };

        tokio::fs::metadata(&tool.path)
            .await
            .map_err(|source| InstallError::NotAccessible {
                path: tool.path.clone(),
                source,
            })?;
        tracing::info!("Found {} in {}", tool.path.display(), tool.directory.display());

        Ok(tool)
    }

    fn find_cached(&self) -> Option<(String, PathBuf)> {
        let versions = self.cache.find_all_versions(TOOL_NAME);
        tracing::info!("Found installed versions: {}", versions.join(","));

        let latest = select_latest_installed(&versions)?;
        let directory = self.cache.find(TOOL_NAME, latest)?;
        Some((latest.clone(), directory))
    }

    fn binary_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.settings.platform.executable_name(TOOL_NAME))
    }

    async fn use_cached(&self, version: String, directory: PathBuf) -> Result<InstalledTool> {
        let path = self.binary_in(&directory);

        if self.settings.self_update {
            tracing::debug!("Attempting to upgrade {}...", TOOL_NAME);
            let output = self
                .runner
                .exec(&path, vec![UPGRADE_COMMAND.to_string()])
                .await
                .with_context(|| format!("Failed to upgrade {}", TOOL_NAME))?;
            tracing::info!("{}", output.combined().trim_end());
            tracing::debug!("Successfully upgraded {}!", TOOL_NAME);
        }

        Ok(InstalledTool {
            path,
            version,
            directory,
            cached: true,
        })
    }

    async fn resolve_version(&self) -> Result<String> {
        let request = VersionRequest::parse(self.settings.requested_version.as_deref())?;
        tracing::debug!(
            "Resolving {} {} for {}",
            TOOL_NAME,
            request,
            self.settings.platform
        );
        match request {
            VersionRequest::Exact(version) => Ok(version),
            VersionRequest::Latest => self
                .channel
                .latest_version(self.settings.platform)
                .await
                .context("Failed to look up the latest butler version"),
        }
    }

    async fn download(&self) -> Result<InstalledTool> {
        let version = self.resolve_version().await?;
        let archive = archive_descriptor(&self.settings.base_url, self.settings.platform, &version);

        let download_path = self.settings.temp_dir.join(&archive.file_name);
        tracing::info!(
            "Attempting to download {} from {} to {}",
            TOOL_NAME,
            archive.url,
            download_path.display()
        );
        let archive_path = self
            .fetcher
            .download_tool(&archive.url, &download_path)
            .await?;
        tracing::info!("Successfully downloaded {} to {}", TOOL_NAME, archive_path.display());

        tracing::info!("Extracting {} from {}...", TOOL_NAME, archive_path.display());
        let extract_dir = self.settings.temp_dir.join(TOOL_NAME);
        let extracted = self
            .fetcher
            .extract_archive(&archive_path, &extract_dir)
            .await?
            .ok_or_else(|| InstallError::ExtractionFailed {
                archive: archive_path.clone(),
            })?;

        if self.settings.platform.needs_chmod() {
            make_executable(&extracted)?;
        }
        tracing::debug!("Successfully extracted {} to {}", TOOL_NAME, extracted.display());

        let binary = self.binary_in(&extracted);
        match tokio::fs::metadata(&binary).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(InstallError::BinaryMissing { path: binary }.into()),
        }

        let reported = self.reported_version(&binary).await?;
        tracing::debug!(
            "Setting tool cache: {} | {} | {}",
            extracted.display(),
            TOOL_NAME,
            reported
        );
        let directory = self.cache.cache_dir(&extracted, TOOL_NAME, &reported)?;

        Ok(InstalledTool {
            path: self.binary_in(&directory),
            version: reported,
            directory,
            cached: false,
        })
    }

    async fn reported_version(&self, binary: &Path) -> Result<String> {
        let output = self
            .runner
            .exec(binary, vec![VERSION_FLAG.to_string()])
            .await?;
        let combined = output.combined();
        parse_reported_version(&combined).ok_or_else(|| {
            InstallError::VersionParse {
                tool: binary.to_path_buf(),
                output: combined,
            }
            .into()
        })
    }
}
