//! Plain-text remote resources: the published version and the shortcut name

use appupdater_core::NetworkConfig;
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Client for the small text resources that accompany an archive
#[derive(Debug, Clone)]
pub struct VersionClient {
    client: reqwest::Client,
}

impl VersionClient {
    /// Create a client bounded by the configured request timeouts
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .connect_timeout(network.connect_timeout())
            .timeout(network.http_timeout())
            .build()
            .map_err(|e| UpdateError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch the published version string
    pub async fn fetch_version(&self, url: &str) -> Result<String> {
        let version = self.fetch_text(url).await?;
        debug!("Remote version: {}", version);
        Ok(version)
    }

    /// Fetch the desktop shortcut display name
    pub async fn fetch_shortcut_name(&self, url: &str) -> Result<String> {
        let name = self.fetch_text(url).await?;
        debug!("Shortcut name: {}", name);
        Ok(name)
    }

    /// Single GET, success status required, body trimmed
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::network(url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdateError::network(url, e))?;

        Ok(body.trim().to_string())
    }
}
