use std::borrow::Cow;
use std::fmt;
use tracing::{debug, warn};

use crate::client::{Transport, fetch_project_id};
use crate::error::CheckError;

/// Supported Git hosting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    GitHub,
    GitLab,
    Codeberg,
    Gitea,
    GiteaAngry,
    GitCryto,
    Gitee,
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformKind::GitHub => "GitHub",
            PlatformKind::GitLab => "GitLab",
            PlatformKind::Codeberg => "Codeberg",
            PlatformKind::Gitea => "Gitea",
            PlatformKind::GiteaAngry => "Gitea Angry",
            PlatformKind::GitCryto => "Git Cryto",
            PlatformKind::Gitee => "Gitee",
        };
        f.write_str(name)
    }
}

/// One row of the host-to-API table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub kind: PlatformKind,
    /// Matched as a substring of the repository URL
    pub host: Cow<'static, str>,
    /// API root that `{project_id}/...` endpoints hang off
    pub api_base: Cow<'static, str>,
    /// Path after `{project_id}/` for the latest release
    pub latest_release_path: Cow<'static, str>,
    /// Release and tag endpoints are keyed by a numeric id that has to be
    /// looked up from the project path first
    pub project_lookup: bool,
}

const fn repos_api(kind: PlatformKind, host: &'static str, api_base: &'static str) -> Platform {
    Platform {
        kind,
        host: Cow::Borrowed(host),
        api_base: Cow::Borrowed(api_base),
        latest_release_path: Cow::Borrowed("releases/latest"),
        project_lookup: false,
    }
}

/// Built-in platforms in match order. The first host found in a URL wins.
pub static PLATFORMS: [Platform; 7] = [
    repos_api(
        PlatformKind::GitHub,
        "github.com",
        "https://api.github.com/repos",
    ),
    Platform {
        kind: PlatformKind::GitLab,
        host: Cow::Borrowed("gitlab.com"),
        api_base: Cow::Borrowed("https://gitlab.com/api/v4/projects"),
        latest_release_path: Cow::Borrowed("releases/permalink/latest"),
        project_lookup: true,
    },
    repos_api(
        PlatformKind::Codeberg,
        "codeberg.org",
        "https://codeberg.org/api/v1/repos",
    ),
    repos_api(
        PlatformKind::Gitea,
        "gitea.com",
        "https://gitea.com/api/v1/repos",
    ),
    repos_api(
        PlatformKind::GiteaAngry,
        "gitea.angry.im",
        "https://gitea.angry.im/api/v1/repos",
    ),
    repos_api(
        PlatformKind::GitCryto,
        "git.cryto.net",
        "https://git.cryto.net/api/v1/repos",
    ),
    repos_api(
        PlatformKind::Gitee,
        "gitee.com",
        "https://gitee.com/api/v5/repos",
    ),
];

impl Platform {
    /// Copies the API flavour of the built-in `kind` onto another host.
    ///
    /// ```
    /// use repo_updates::{Platform, PlatformKind};
    ///
    /// let forgejo = Platform::self_hosted(
    ///     PlatformKind::Codeberg,
    ///     "git.example.org",
    ///     "https://git.example.org/api/v1/repos",
    /// );
    /// assert!(!forgejo.project_lookup);
    /// ```
    pub fn self_hosted(
        kind: PlatformKind,
        host: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let template = PLATFORMS
            .iter()
            .find(|platform| platform.kind == kind)
            .cloned()
            .unwrap_or_else(|| repos_api(kind, "", ""));

        Platform {
            host: Cow::Owned(host.into()),
            api_base: Cow::Owned(api_base.into().trim_end_matches('/').to_string()),
            ..template
        }
    }
}

/// A repository resolved to the API endpoints that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    /// The repository URL with any `.git` and trailing `/` removed
    pub url: String,
    pub platform: PlatformKind,
    pub api_base: String,
    /// `owner/repo`, or the numeric id for platforms that need a lookup
    pub project_id: String,
    latest_release_path: String,
}

impl RepositoryReference {
    pub fn release_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.api_base, self.project_id, self.latest_release_path
        )
    }

    pub fn tags_url(&self) -> String {
        format!("{}/{}/tags", self.api_base, self.project_id)
    }
}

/// Strips a trailing `.git` and then a trailing `/` until neither is left.
pub fn normalize_url(url: &str) -> &str {
    let mut current = url;
    loop {
        let stripped = current.strip_suffix(".git").unwrap_or(current);
        let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
        if stripped.len() == current.len() {
            return current;
        }
        current = stripped;
    }
}

/// Finds the platform whose host appears in `url` and the path after that host.
///
/// A host only counts where it is followed by `/` or ends the URL, so
/// `git@github.com:owner/repo` and `https://github.com:443/owner/repo` match
/// nothing.
///
/// # Arguments
///
/// * `url` - A normalized repository URL
/// * `platforms` - Candidate platforms, tried in order
///
/// # Returns
///
/// * `Some((platform, path))` - The first matching platform and the path after
///   its host, with leading slashes removed. The path may be empty.
/// * `None` - If no platform host appears in `url`
pub fn classify<'a, 'p>(
    url: &'a str,
    platforms: &'p [Platform],
) -> Option<(&'p Platform, &'a str)> {
    platforms.iter().find_map(|platform| {
        let host = &*platform.host;
        url.match_indices(host).find_map(|(start, _)| {
            let rest = &url[start + host.len()..];
            (rest.is_empty() || rest.starts_with('/'))
                .then(|| (platform, rest.trim_start_matches('/')))
        })
    })
}

/// Resolves a repository URL against `platforms`.
///
/// Platforms with `project_lookup` set cost one extra request to turn the
/// project path into its numeric id. Failure of that request is fatal.
///
/// # Arguments
///
/// * `url` - The repository URL, with or without a `.git` suffix
/// * `platforms` - Platforms to match the URL against, in priority order
/// * `transport` - Used only for the project id lookup
///
/// # Returns
///
/// * `Ok(RepositoryReference)` - The release and tag endpoints for the repository
/// * `Err(CheckError::UnsupportedPlatform)` - If no platform host matches
/// * `Err(CheckError::MissingRepositoryPath)` - If nothing follows the host
/// * `Err(CheckError::ProjectIdLookup)` - If the project id could not be fetched
pub fn resolve<T>(
    url: &str,
    platforms: &[Platform],
    transport: &T,
) -> Result<RepositoryReference, CheckError>
where
    T: Transport + ?Sized,
{
    let url = normalize_url(url);
    let (platform, path) =
        classify(url, platforms).ok_or_else(|| CheckError::UnsupportedPlatform(url.to_string()))?;

    if path.is_empty() {
        return Err(CheckError::MissingRepositoryPath(url.to_string()));
    }

    let project_id = if platform.project_lookup {
        let encoded = urlencoding::encode(path);
        let lookup_url = format!("{}/{}", platform.api_base, encoded);
        match fetch_project_id(transport, &lookup_url) {
            Some(id) => id.to_string(),
            None => {
                warn!(%url, "could not resolve {} project id", platform.kind);
                return Err(CheckError::ProjectIdLookup(path.to_string()));
            }
        }
    } else {
        path.to_string()
    };

    debug!(%url, platform = %platform.kind, %project_id, "resolved repository");

    Ok(RepositoryReference {
        url: url.to_string(),
        platform: platform.kind,
        api_base: platform.api_base.to_string(),
        project_id,
        latest_release_path: platform.latest_release_path.to_string(),
    })
}
