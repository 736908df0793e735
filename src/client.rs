use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::CheckerConfig;
use crate::error::FetchError;
use crate::version::{VersionCandidate, is_version_shaped, select_latest_tag};

/// Capability to issue a single HTTP GET.
#[cfg_attr(test, automock)]
pub trait Transport {
    /// Returns the body of a 2xx response.
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Transport`] backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    user_agent: String,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &CheckerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().build()?;

        Ok(ReqwestTransport {
            client,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text()?)
    }
}

/// Latest release as returned by any of the supported APIs.
///
/// GitHub and Gitea-style hosts date a release with `published_at`, GitLab
/// with `released_at` and Gitee with `created_at`.
#[derive(Deserialize)]
struct ReleaseResponse {
    tag_name: Option<String>,
    name: Option<String>,
    published_at: Option<String>,
    released_at: Option<String>,
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct TagResponse {
    name: String,
}

#[derive(Deserialize)]
struct ProjectResponse {
    id: Option<u64>,
}

/// The newest published release of a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRelease {
    /// The tag or display name that looked like a version
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
}

fn get_json<T, D>(transport: &T, url: &str) -> Result<D, FetchError>
where
    T: Transport + ?Sized,
    D: DeserializeOwned,
{
    let body = transport.get(url)?;
    Ok(serde_json::from_str(&body)?)
}

/// Queries a "latest release" endpoint.
///
/// # Arguments
///
/// * `transport` - Issues the GET request
/// * `url` - The platform's latest release endpoint for one repository
///
/// # Returns
///
/// * `Some(LatestRelease)` - The tag name, or the display name when the tag
///   is not version-shaped, plus the release date if one parses
/// * `None` - If the request fails or neither name carries a
///   `major.minor.patch` version
pub fn fetch_latest_release<T>(transport: &T, url: &str) -> Option<LatestRelease>
where
    T: Transport + ?Sized,
{
    let release: ReleaseResponse = match get_json(transport, url) {
        Ok(release) => release,
        Err(e) => {
            debug!(%url, error = %e, "no latest release");
            return None;
        }
    };

    let tag = [release.tag_name, release.name]
        .into_iter()
        .flatten()
        .find(|name| is_version_shaped(name))?;

    let published_at = [release.published_at, release.released_at, release.created_at]
        .into_iter()
        .flatten()
        .find_map(|date| DateTime::parse_from_rfc3339(&date).ok())
        .map(|date| date.with_timezone(&Utc));

    Some(LatestRelease { tag, published_at })
}

/// Queries a tag list endpoint and returns the highest-versioned tag.
///
/// # Arguments
///
/// * `transport` - Issues the GET request
/// * `url` - The platform's tag list endpoint for one repository
///
/// # Returns
///
/// * `Some(VersionCandidate)` - The highest-versioned tag, the last one
///   listed among equals
/// * `None` - If the request fails, the list is empty, or not a single tag
///   name parses as a version
pub fn fetch_latest_tag<T>(transport: &T, url: &str) -> Option<VersionCandidate>
where
    T: Transport + ?Sized,
{
    let tags: Vec<TagResponse> = match get_json(transport, url) {
        Ok(tags) => tags,
        Err(e) => {
            debug!(%url, error = %e, "no tags");
            return None;
        }
    };

    let latest = select_latest_tag(tags.into_iter().map(|tag| tag.name))?;
    if !latest.is_usable() {
        debug!(%url, tag = %latest.raw_tag, "no tag parses as a version");
        return None;
    }

    Some(latest)
}

/// Looks up the numeric id of a project on hosts that key releases by id.
pub fn fetch_project_id<T>(transport: &T, url: &str) -> Option<u64>
where
    T: Transport + ?Sized,
{
    match get_json::<T, ProjectResponse>(transport, url) {
        Ok(project) => project.id,
        Err(e) => {
            debug!(%url, error = %e, "project lookup failed");
            None
        }
    }
}
