//! # repo-updates
//!
//! A Rust library that checks Git hosting platforms for newer releases of a repository.
//!
//! Given a repository URL and the version you are running, **repo-updates** asks the
//! hosting platform's public API for the latest release, falls back to the repository's
//! tags when there is none, and tells you whether what it found is newer.
//!
//! Supported platforms out of the box:
//!
//! - GitHub (`github.com`)
//! - GitLab (`gitlab.com`)
//! - Codeberg (`codeberg.org`)
//! - Gitea (`gitea.com`)
//! - Gitea Angry (`gitea.angry.im`)
//! - Git Cryto (`git.cryto.net`)
//! - Gitee (`gitee.com`)
//!
//! Self-hosted GitLab, Gitea and Forgejo instances can be added with
//! [`Platform::self_hosted`].
//!
//! # Usage
//!
//! ## Basic
//!
//! The easiest way to use this crate is with the [`update_check`] function:
//!
//! ```no_run
//! fn main() {
//!     // Check for updates at startup
//!     repo_updates::update_check(
//!         "https://codeberg.org/owner/my-tool",
//!         env!("CARGO_PKG_VERSION"),
//!     );
//!
//!     // Your application code here...
//!     println!("Hello, world!");
//! }
//! ```
//!
//! If an update is available, it will print to stderr:
//! ```text
//! Version 1.0.0 of https://codeberg.org/owner/my-tool is outdated. Version v1.2.0 was released 3 days ago. Please consider updating your version.
//! ```
//!
//! ## Advanced
//!
//! For more control over the checking process, use [`UpdateChecker`] directly:
//!
//! ```no_run
//! use repo_updates::{CheckError, CheckerConfig, UpdateChecker};
//!
//! let config = CheckerConfig {
//!     timeout_secs: 3,
//!     ..CheckerConfig::default()
//! };
//! let checker = UpdateChecker::with_config(&config).unwrap();
//!
//! match checker.check("https://github.com/owner/my-tool", "0.4.2") {
//!     Ok(verdict) if verdict.has_update => {
//!         println!("Latest version: {}", verdict.latest.unwrap_or_default());
//!     }
//!     Ok(_) => println!("You're on the latest version!"),
//!     Err(CheckError::NoReleasesOrTags) => println!("Nothing published yet"),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! # Network behaviour
//!
//! Each check makes at most three sequential, unauthenticated GET requests, each with a
//! 10 second timeout by default. Nothing is cached between checks. Failed release and
//! tag requests count as "nothing found"; only a failed GitLab project id lookup ends
//! a check early.
//!
//! # Logging
//!
//! Requests and absorbed failures are logged through [`tracing`] at debug level.
//! Install a subscriber in your application to see them.

mod client;
mod config;
mod core;
mod error;
mod notify;
mod platform;
mod version;

pub use client::{LatestRelease, ReqwestTransport, Transport};
pub use config::{CheckerConfig, DEFAULT_TIMEOUT_SECS};
pub use crate::core::{UpdateChecker, UpdateVerdict, update_check};
pub use error::{CheckError, FetchError};
pub use notify::{ConsoleNotifier, Notifier};
pub use platform::{
    PLATFORMS, Platform, PlatformKind, RepositoryReference, normalize_url, resolve,
};
pub use version::{
    InvalidVersion, OrderedVersion, VersionCandidate, is_newer_version, parse_version_tag,
    select_latest_tag,
};
