use regex::Regex;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Dotted release, optional pre-release, post-release, dev-release and local label.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        v?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>\d+)?)?
        (?:-(?P<post_implicit>\d+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n>\d+)?)?
        (?:[-_.]?(?P<dev>dev)[-_.]?(?P<dev_n>\d+)?)?
        (?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?
        $",
    )
    .expect("version pattern compiles")
});

/// Anything carrying `major.minor.patch` somewhere, with or without a `v`.
static VERSION_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?\d+\.\d+\.\d+").expect("version shape compiles"));

#[derive(Debug, Error)]
#[error("Invalid version string: {0}")]
pub struct InvalidVersion(pub String);

/// A run of decimal digits of any length.
///
/// Leading zeros are dropped on construction, so comparing by length and then
/// by text is numeric comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Number(String);

impl Number {
    fn new(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Number::zero()
        } else {
            Number(trimmed.to_string())
        }
    }

    fn zero() -> Self {
        Number("0".to_string())
    }

    fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Where a version sits relative to its final release.
///
/// Variant order is the precedence order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    /// `1.0.dev1` with no pre- or post-release segment
    DevOnly,
    Alpha(Number),
    Beta(Number),
    Rc(Number),
    Final,
}

/// A parsed, totally ordered dotted version.
///
/// Release segments compare numerically whatever their length and trailing
/// zeros are insignificant, so `1.0` equals `1.0.0`. Within one release,
/// pre-releases come before the final release and post-releases after it.
/// A `.devN` suffix sorts before the version it is attached to. Local
/// `+label` segments are ignored.
#[derive(Debug, Clone)]
pub struct OrderedVersion {
    release: Vec<Number>,
    phase: Phase,
    post: Option<Number>,
    dev: Option<Number>,
}

impl OrderedVersion {
    fn significant_release(&self) -> &[Number] {
        let end = self
            .release
            .iter()
            .rposition(|segment| !segment.is_zero())
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }
}

fn number(captures: &regex::Captures<'_>, name: &str) -> Option<Number> {
    captures.name(name).map(|m| Number::new(m.as_str()))
}

impl FromStr for OrderedVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = VERSION_PATTERN
            .captures(s.trim())
            .ok_or_else(|| InvalidVersion(s.to_string()))?;

        let release = captures["release"].split('.').map(Number::new).collect();

        let pre_n = number(&captures, "pre_n").unwrap_or_else(Number::zero);
        let implicit_post = number(&captures, "post_implicit");
        let labelled_post = number(&captures, "post_n");
        let dev_n = number(&captures, "dev_n");

        // a bare label such as `1.0.post` or `1.0.dev` means number 0
        let post = implicit_post.or_else(|| {
            captures
                .name("post_l")
                .map(|_| labelled_post.unwrap_or_else(Number::zero))
        });
        let dev = captures
            .name("dev")
            .map(|_| dev_n.unwrap_or_else(Number::zero));

        let phase = match captures.name("pre_l").map(|m| m.as_str().to_ascii_lowercase()) {
            Some(label) => match label.as_str() {
                "a" | "alpha" => Phase::Alpha(pre_n),
                "b" | "beta" => Phase::Beta(pre_n),
                _ => Phase::Rc(pre_n),
            },
            None if post.is_none() && dev.is_some() => Phase::DevOnly,
            None => Phase::Final,
        };

        Ok(OrderedVersion {
            release,
            phase,
            post,
            dev,
        })
    }
}

impl PartialEq for OrderedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedVersion {}

impl Ord for OrderedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.significant_release()
            .cmp(other.significant_release())
            .then_with(|| self.phase.cmp(&other.phase))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| match (&self.dev, &other.dev) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for OrderedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A tag or release name together with its parsed version.
///
/// `parsed` is `None` when the name could not be read as a version. `None`
/// orders below every parsed version, which keeps tag selection total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCandidate {
    pub raw_tag: String,
    pub parsed: Option<OrderedVersion>,
}

impl VersionCandidate {
    pub fn new(raw_tag: impl Into<String>) -> Self {
        let raw_tag = raw_tag.into();
        let parsed = parse_version_tag(&raw_tag);
        Self { raw_tag, parsed }
    }

    pub fn is_usable(&self) -> bool {
        self.parsed.is_some()
    }
}

/// Parses a tag name such as `v5.5.1` or `release-2.0`.
///
/// Any leading run of non-digit characters is dropped before parsing. Empty
/// or unparsable names yield `None`, the sentinel minimum.
pub fn parse_version_tag(tag_name: &str) -> Option<OrderedVersion> {
    let version = tag_name.trim_start_matches(|c: char| !c.is_ascii_digit());
    if version.is_empty() {
        return None;
    }
    version.parse().ok()
}

/// Picks the highest-versioned tag.
///
/// Among tags of equal version the last one in input order wins.
pub fn select_latest_tag<I>(tags: I) -> Option<VersionCandidate>
where
    I: IntoIterator<Item = String>,
{
    tags.into_iter()
        .map(VersionCandidate::new)
        .max_by(|a, b| a.parsed.cmp(&b.parsed))
}

/// Returns `true` if `remote_version` is strictly newer than `local_version`.
///
/// Both strings are compared as dotted versions when both parse; otherwise
/// the raw strings are compared lexicographically.
pub fn is_newer_version(local_version: &str, remote_version: &str) -> bool {
    match (
        local_version.parse::<OrderedVersion>(),
        remote_version.parse::<OrderedVersion>(),
    ) {
        (Ok(local), Ok(remote)) => remote > local,
        _ => remote_version > local_version,
    }
}

pub(crate) fn is_version_shaped(name: &str) -> bool {
    VERSION_SHAPE.is_match(name)
}
