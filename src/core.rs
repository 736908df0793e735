use chrono::{DateTime, Utc};
use humanly::{HumanDuration, HumanTime};
use serde::Serialize;
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::client::{ReqwestTransport, Transport, fetch_latest_release, fetch_latest_tag};
use crate::config::CheckerConfig;
use crate::error::CheckError;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::platform::{PLATFORMS, Platform, RepositoryReference, resolve};
use crate::version::is_newer_version;

/// Outcome of one update check.
///
/// # Examples
///
/// ```no_run
/// use repo_updates::UpdateChecker;
///
/// let checker = UpdateChecker::new().unwrap();
/// let verdict = checker.check("https://codeberg.org/forgejo/forgejo", "1.0.0").unwrap();
///
/// if verdict.has_update {
///     println!("{}", verdict.message);
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct UpdateVerdict {
    /// Whether `latest` is strictly newer than the local version
    pub has_update: bool,
    /// The newest release or tag found, if the check got that far
    pub latest: Option<String>,
    /// Human-readable summary of the outcome
    pub message: String,
    /// When `latest` was released (releases only, tags carry no date)
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub release_date: Option<DateTime<Utc>>,
}

impl UpdateVerdict {
    fn new(
        reference: &RepositoryReference,
        local_version: &str,
        latest: String,
        release_date: Option<DateTime<Utc>>,
    ) -> Self {
        let has_update = is_newer_version(local_version, &latest);

        let message = if has_update {
            let available = match release_date {
                Some(date) => format!("was released {}", pretty_date(date)),
                None => "is available".to_string(),
            };
            format!(
                "Version {} of {} is outdated. Version {} {}. Please consider updating your version.",
                local_version, reference.url, latest, available
            )
        } else {
            format!(
                "Version {} of {} is up to date.",
                local_version, reference.url
            )
        };

        UpdateVerdict {
            has_update,
            latest: Some(latest),
            message,
            release_date,
        }
    }

    fn failed(error: &CheckError) -> Self {
        UpdateVerdict {
            has_update: false,
            latest: None,
            message: error.to_string(),
            release_date: None,
        }
    }
}

/// Checks Git hosting platforms for versions newer than a local one.
///
/// Every check is independent: nothing is cached between calls, so one
/// checker can be shared across threads when its transport allows it.
///
/// # Examples
///
/// ```no_run
/// use repo_updates::{Platform, PlatformKind, UpdateChecker, PLATFORMS};
///
/// let mut platforms = PLATFORMS.to_vec();
/// platforms.push(Platform::self_hosted(
///     PlatformKind::Gitea,
///     "git.example.org",
///     "https://git.example.org/api/v1/repos",
/// ));
///
/// let checker = UpdateChecker::new().unwrap().with_platforms(platforms);
///
/// match checker.check("https://git.example.org/team/tool", "0.3.1") {
///     Ok(verdict) if verdict.has_update => println!("{}", verdict.message),
///     Ok(_) => println!("Already on latest version"),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub struct UpdateChecker<T = ReqwestTransport> {
    transport: T,
    platforms: Vec<Platform>,
}

impl UpdateChecker<ReqwestTransport> {
    /// Creates a checker with the default timeout and User-Agent.
    pub fn new() -> Result<Self, CheckError> {
        Self::with_config(&CheckerConfig::default())
    }

    pub fn with_config(config: &CheckerConfig) -> Result<Self, CheckError> {
        Ok(Self::with_transport(ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> UpdateChecker<T> {
    /// Creates a checker that issues its requests through `transport`.
    pub fn with_transport(transport: T) -> Self {
        UpdateChecker {
            transport,
            platforms: PLATFORMS.to_vec(),
        }
    }

    /// Replaces the platform table. Order matters: the first host found in
    /// a URL wins.
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Finds the latest version of `repo_url` and compares it to `local_version`.
    ///
    /// The latest release is tried first; if there is none with a
    /// version-shaped name, the highest-versioned tag is used instead.
    ///
    /// # Errors
    ///
    /// * [`CheckError::UnsupportedPlatform`] - no known host in the URL
    /// * [`CheckError::MissingRepositoryPath`] - nothing after the host
    /// * [`CheckError::ProjectIdLookup`] - the numeric project id could not be fetched
    /// * [`CheckError::NoReleasesOrTags`] - neither endpoint yielded a version
    pub fn check(&self, repo_url: &str, local_version: &str) -> Result<UpdateVerdict, CheckError> {
        let reference = resolve(repo_url, &self.platforms, &self.transport)?;

        let (latest, release_date) =
            match fetch_latest_release(&self.transport, &reference.release_url()) {
                Some(release) => (release.tag, release.published_at),
                None => {
                    debug!(url = %reference.url, "no release found, falling back to tags");
                    let tag = fetch_latest_tag(&self.transport, &reference.tags_url())
                        .ok_or(CheckError::NoReleasesOrTags)?;
                    (tag.raw_tag, None)
                }
            };

        debug!(url = %reference.url, %latest, local = %local_version, "latest version found");

        Ok(UpdateVerdict::new(
            &reference,
            local_version,
            latest,
            release_date,
        ))
    }

    /// Runs [`check`](Self::check) and reports the outcome through `notifier`.
    ///
    /// Errors become a single error message, an available update a single
    /// info message. Being up to date produces no message.
    pub fn check_and_notify<N>(&self, repo_url: &str, local_version: &str, notifier: &N) -> UpdateVerdict
    where
        N: Notifier + ?Sized,
    {
        match self.check(repo_url, local_version) {
            Ok(verdict) => {
                if verdict.has_update {
                    notifier.info(&verdict.message);
                }
                verdict
            }
            Err(e) => {
                notifier.error(&e.to_string());
                UpdateVerdict::failed(&e)
            }
        }
    }
}

/// Formats a datetime as a human-readable relative time string.
///
/// Dates more than a week in the past are shown in full.
fn pretty_date(the_datetime: DateTime<Utc>) -> String {
    let now = Utc::now();
    let diff = now.signed_duration_since(the_datetime);

    if diff.num_days() > 7 {
        return the_datetime.format("%x %X").to_string();
    }

    if diff.num_seconds() < 0 {
        let future_duration = Duration::from_secs(diff.num_seconds().unsigned_abs());
        return format!("in {}", HumanTime::from(future_duration));
    }

    let duration = Duration::from_secs(diff.num_seconds().unsigned_abs());
    let past_time = SystemTime::now() - duration;

    HumanDuration::from(Some(past_time)).to_string()
}

/// Checks `repo_url` for a version newer than `local_version` and prints the
/// outcome to stderr.
///
/// This is the simplest way to add update checking to a CLI application.
///
/// # Examples
///
/// ```no_run
/// use repo_updates::update_check;
///
/// fn main() {
///     update_check("https://github.com/owner/my-tool", env!("CARGO_PKG_VERSION"));
///
///     // ... rest of your application
/// }
/// ```
pub fn update_check(repo_url: &str, local_version: &str) -> UpdateVerdict {
    let notifier = ConsoleNotifier;
    match UpdateChecker::new() {
        Ok(checker) => checker.check_and_notify(repo_url, local_version, &notifier),
        Err(e) => {
            notifier.error(&e.to_string());
            UpdateVerdict::failed(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned bodies by URL; anything else is a 404.
    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, String>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or(FetchError::Status(404))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: RefCell<Vec<(&'static str, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.messages.borrow_mut().push(("success", message.to_string()));
        }

        fn info(&self, message: &str) {
            self.messages.borrow_mut().push(("info", message.to_string()));
        }

        fn error(&self, message: &str) {
            self.messages.borrow_mut().push(("error", message.to_string()));
        }
    }

    const GITHUB_RELEASE: &str = "https://api.github.com/repos/owner/tool/releases/latest";
    const GITHUB_TAGS: &str = "https://api.github.com/repos/owner/tool/tags";

    #[test]
    fn test_unsupported_platform_reports_error_without_requests() {
        let checker = UpdateChecker::with_transport(FakeTransport::default());
        let notifier = RecordingNotifier::default();

        let verdict = checker.check_and_notify("https://example.com/x", "0.0.1", &notifier);

        assert!(!verdict.has_update);
        assert_eq!(verdict.latest, None);
        assert!(checker.transport.requests().is_empty());
        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "error");
        assert!(messages[0].1.contains("Unsupported platform"));
    }

    #[test]
    fn test_gitlab_lookup_failure_stops_the_check() {
        let checker = UpdateChecker::with_transport(FakeTransport::default());
        let notifier = RecordingNotifier::default();

        checker.check_and_notify("https://gitlab.com/group/project", "0.0.1", &notifier);

        assert_eq!(
            checker.transport.requests(),
            vec!["https://gitlab.com/api/v4/projects/group%2Fproject".to_string()]
        );
        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "error");
        assert!(messages[0].1.contains("Could not retrieve the project ID"));
    }

    #[test]
    fn test_no_release_and_no_tags_reports_nothing_found() {
        let transport = FakeTransport::default().with(GITHUB_TAGS, "[]");
        let checker = UpdateChecker::with_transport(transport);
        let notifier = RecordingNotifier::default();

        let verdict = checker.check_and_notify("https://github.com/owner/tool", "0.0.1", &notifier);

        assert!(!verdict.has_update);
        assert_eq!(
            checker.transport.requests(),
            vec![GITHUB_RELEASE.to_string(), GITHUB_TAGS.to_string()]
        );
        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "error");
        assert!(messages[0].1.contains("No releases or tags found"));
    }

    #[test]
    fn test_newer_release_is_announced_once() {
        let transport = FakeTransport::default()
            .with(GITHUB_RELEASE, r#"{"tag_name": "v2.0.0", "name": "2.0.0"}"#);
        let checker = UpdateChecker::with_transport(transport);
        let notifier = RecordingNotifier::default();

        let verdict = checker.check_and_notify("https://github.com/owner/tool.git", "0.0.1", &notifier);

        assert!(verdict.has_update);
        assert_eq!(verdict.latest.as_deref(), Some("v2.0.0"));
        assert_eq!(checker.transport.requests(), vec![GITHUB_RELEASE.to_string()]);
        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "info");
        assert!(messages[0].1.contains("v2.0.0"));
        assert!(messages[0].1.contains("is available"));
        assert!(messages[0].1.contains("of https://github.com/owner/tool is outdated"));
    }

    #[test]
    fn test_dated_release_mentions_release_date() {
        let transport = FakeTransport::default().with(
            GITHUB_RELEASE,
            r#"{"tag_name": "v2.0.0", "published_at": "2020-03-01T08:00:00Z"}"#,
        );
        let checker = UpdateChecker::with_transport(transport);

        let verdict = checker.check("https://github.com/owner/tool", "1.0.0").unwrap();

        assert!(verdict.message.contains("was released"));
        assert!(verdict.release_date.is_some());
    }

    #[test]
    fn test_verdict_serializes_release_date_as_unix_seconds() {
        let transport = FakeTransport::default().with(
            GITHUB_RELEASE,
            r#"{"tag_name": "v2.0.0", "published_at": "2020-03-01T08:00:00Z"}"#,
        );
        let checker = UpdateChecker::with_transport(transport);

        let verdict = checker.check("https://github.com/owner/tool", "1.0.0").unwrap();
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["has_update"], true);
        assert_eq!(json["latest"], "v2.0.0");
        assert_eq!(json["release_date"], 1583049600);
    }

    #[test]
    fn test_undated_verdict_serializes_null_release_date() {
        let verdict = UpdateVerdict::failed(&CheckError::NoReleasesOrTags);
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["release_date"], serde_json::Value::Null);
        assert_eq!(json["latest"], serde_json::Value::Null);
        assert_eq!(
            json["message"],
            "Could not check for updates. No releases or tags found."
        );
    }

    #[test]
    fn test_up_to_date_is_silent() {
        let transport =
            FakeTransport::default().with(GITHUB_RELEASE, r#"{"tag_name": "v1.2.0"}"#);
        let checker = UpdateChecker::with_transport(transport);
        let notifier = RecordingNotifier::default();

        let verdict = checker.check_and_notify("https://github.com/owner/tool", "1.2.0", &notifier);

        assert!(!verdict.has_update);
        assert_eq!(verdict.latest.as_deref(), Some("v1.2.0"));
        assert!(notifier.messages.borrow().is_empty());
    }

    #[test]
    fn test_tags_are_used_when_release_is_missing() {
        let transport = FakeTransport::default().with(
            GITHUB_TAGS,
            r#"[{"name": "v1.0.0"}, {"name": "v2.10.0"}, {"name": "v2.9.0"}]"#,
        );
        let checker = UpdateChecker::with_transport(transport);
        let notifier = RecordingNotifier::default();

        let verdict = checker.check_and_notify("https://github.com/owner/tool", "2.9.0", &notifier);

        assert!(verdict.has_update);
        assert_eq!(verdict.latest.as_deref(), Some("v2.10.0"));
        assert_eq!(verdict.release_date, None);
        assert_eq!(notifier.messages.borrow()[0].0, "info");
    }

    #[test]
    fn test_release_without_version_falls_back_to_tags() {
        let transport = FakeTransport::default()
            .with(GITHUB_RELEASE, r#"{"tag_name": "latest", "name": "Rolling"}"#)
            .with(GITHUB_TAGS, r#"[{"name": "1.1.0"}]"#);
        let checker = UpdateChecker::with_transport(transport);

        let verdict = checker.check("https://github.com/owner/tool", "1.0.0").unwrap();

        assert_eq!(verdict.latest.as_deref(), Some("1.1.0"));
        assert!(verdict.has_update);
    }

    #[test]
    fn test_gitlab_check_uses_numeric_id_and_permalink() {
        let transport = FakeTransport::default()
            .with(
                "https://gitlab.com/api/v4/projects/group%2Fproject",
                r#"{"id": 42}"#,
            )
            .with(
                "https://gitlab.com/api/v4/projects/42/releases/permalink/latest",
                r#"{"tag_name": "v3.1.4", "released_at": "2024-02-02T00:00:00Z"}"#,
            );
        let checker = UpdateChecker::with_transport(transport);

        let verdict = checker.check("https://gitlab.com/group/project/", "3.1.3").unwrap();

        assert!(verdict.has_update);
        assert_eq!(verdict.latest.as_deref(), Some("v3.1.4"));
        assert_eq!(checker.transport.requests().len(), 2);
    }

    #[test]
    fn test_unparsable_local_version_compares_lexicographically() {
        let transport =
            FakeTransport::default().with(GITHUB_RELEASE, r#"{"tag_name": "v1.0.0"}"#);
        let checker = UpdateChecker::with_transport(transport);

        let verdict = checker.check("https://github.com/owner/tool", "nightly").unwrap();

        // "v1.0.0" sorts after "nightly"
        assert!(verdict.has_update);
    }
}
