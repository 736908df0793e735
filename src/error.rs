use thiserror::Error;

/// Terminal outcomes of a single update check that are not a verdict.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No repository path found in {0}")]
    MissingRepositoryPath(String),

    #[error("Could not retrieve the project ID for {0}")]
    ProjectIdLookup(String),

    #[error("Could not check for updates. No releases or tags found.")]
    NoReleasesOrTags,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure of a single HTTP GET. Absorbed by the release/tag fallback chain.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}
