use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

use crate::{ReleaseSource, UpdateError};

/// Whole-request timeout; the check must never hold up a snapshot
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Latest release of a GitHub repository (`owner/name`)
#[derive(Debug, Clone)]
pub struct GithubReleases {
    client: Client,
    url: String,
    user_agent: String,
}

impl GithubReleases {
    /// # Errors
    ///
    /// Returns `UpdateError::Transport` if the HTTP client cannot be built.
    pub fn new(repo: &str, current_version: &str) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UpdateError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{API_BASE}/repos/{repo}/releases/latest"),
            user_agent: format!("codesight/{current_version}"),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReleaseSource for GithubReleases {
    async fn latest_version(&self) -> Result<String, UpdateError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| UpdateError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpdateError::BadResponse(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdateError::Transport(e.to_string()))?;
        version_from_release(&body)
    }
}

/// Version named by a `releases/latest` response body, without its `v` prefix
fn version_from_release(body: &str) -> Result<String, UpdateError> {
    let release: LatestRelease =
        serde_json::from_str(body).map_err(|e| UpdateError::BadResponse(e.to_string()))?;

    let version = release.tag_name.trim().trim_start_matches('v');
    if version.is_empty() {
        return Err(UpdateError::BadResponse("empty tag_name".to_string()));
    }
    Ok(version.to_string())
}
