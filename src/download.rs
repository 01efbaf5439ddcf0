#[cfg(test)]
use mockall::automock;

use crate::error::InstallError;
use anyhow::{Context, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Fetches an archive and unpacks it.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Downloads `url` to `dest` and returns the path written.
    async fn download_tool(&self, url: &str, dest: &Path) -> Result<PathBuf>;

    /// Unpacks `archive` into `dest_dir`. `None` means nothing was extracted.
    async fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> Result<Option<PathBuf>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn download_tool(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let filename = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());
        tracing::info!("Downloading {}...", filename);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", filename));

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(dest)
            .with_context(|| format!("Could not create {}", dest.display()))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush()?;

        pb.finish_with_message("Download complete");
        Ok(dest.to_path_buf())
    }

    async fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> Result<Option<PathBuf>> {
        tracing::info!(
            "Extracting {}...",
            archive.file_name().unwrap_or_default().to_string_lossy()
        );
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>> {
            let extracted = extract_zip(&archive, &dest_dir)?;
            Ok(if extracted == 0 { None } else { Some(dest_dir) })
        })
        .await?
    }
}

/// Unpacks a zip archive and returns the number of entries written.
pub fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Could not open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;
    fs::create_dir_all(extract_dir)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(name) => extract_dir.join(name),
            None => {
                tracing::warn!("Skipping malicious path in zip: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
                }
            }
        }
        extracted += 1;
    }

    Ok(extracted)
}

/// Marks `dir` and every regular file under it as executable.
pub fn make_executable(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        use walkdir::WalkDir;

        for entry in WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            if !(path.is_dir() || path.is_file()) {
                continue;
            }
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(perms.mode() | 0o755);
            fs::set_permissions(path, perms)?;
        }
    }
    #[cfg(not(unix))]
    {
        tracing::debug!("Skipping chmod of {} on this host", dir.display());
    }
    Ok(())
}
