//! The broth distribution endpoints.

#[cfg(test)]
use mockall::automock;

use crate::error::InstallError;
use crate::platform::Platform;
use crate::types::{ArchiveDescriptor, TOOL_NAME};
use anyhow::Result;

pub const DEFAULT_BASE_URL: &str = "https://broth.itch.zone/butler";

/// Where the newest published version comes from.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseChannel: Send + Sync {
    async fn latest_version(&self, platform: Platform) -> Result<String>;
}

fn trimmed_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub fn latest_url(base_url: &str, platform: Platform) -> String {
    format!("{}/{}/LATEST", trimmed_base(base_url), platform.variant())
}

pub fn archive_descriptor(base_url: &str, platform: Platform, version: &str) -> ArchiveDescriptor {
    let variant = platform.variant();
    let file_name = format!("{}-{}.zip", TOOL_NAME, variant);
    let url = format!(
        "{}/{}/{}/archive/default/{}",
        trimmed_base(base_url),
        variant,
        version,
        file_name
    );
    ArchiveDescriptor { url, file_name }
}

pub struct BrothClient {
    client: reqwest::Client,
    base_url: String,
}

impl BrothClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ReleaseChannel for BrothClient {
    async fn latest_version(&self, platform: Platform) -> Result<String> {
        let url = latest_url(&self.base_url, platform);
        tracing::debug!("Fetching latest {} version from {}", TOOL_NAME, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().await?;
        Ok(body.trim().to_string())
    }
}
