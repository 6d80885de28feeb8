//! Domain entities: jobs and tubes

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::DomainError;

/// Longest tube name the server accepts.
pub const MAX_TUBE_NAME_LEN: usize = 200;

/// Name of the tube every session uses and watches on connect.
pub const DEFAULT_TUBE: &str = "default";

/// Server-assigned job identifier, unique for the lifetime of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

/// Job priority: lower value is more urgent. `0` is the most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u32);

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Priority {
    fn from(p: u32) -> Self {
        Priority(p)
    }
}

/// Lifecycle state of a job. A job is in exactly one state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Ready,
    Delayed,
    Reserved,
    Buried,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Ready => "ready",
            JobState::Delayed => "delayed",
            JobState::Reserved => "reserved",
            JobState::Buried => "buried",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ready" => Ok(JobState::Ready),
            "delayed" => Ok(JobState::Delayed),
            "reserved" => Ok(JobState::Reserved),
            "buried" => Ok(JobState::Buried),
            other => Err(DomainError::InvalidJobState(other.to_string())),
        }
    }
}

/// A job as returned by reserve and peek: id plus opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub body: Vec<u8>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }

    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn tube_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9+/;.$_()][A-Za-z0-9\-+/;.$_()]*$").expect("valid tube name regex")
    })
}

/// Validated tube name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TubeName(String);

impl TubeName {
    /// Validate a tube name against the server's naming rules.
    ///
    /// Names are non-empty, at most 200 bytes, drawn from letters, digits and
    /// `-+/;.$_()`, and must not start with a hyphen.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let invalid = |reason: &str| DomainError::InvalidTubeName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if name.len() > MAX_TUBE_NAME_LEN {
            return Err(invalid("longer than 200 bytes"));
        }
        if name.starts_with('-') {
            return Err(invalid("must not start with '-'"));
        }
        if !tube_name_regex().is_match(&name) {
            return Err(invalid("allowed characters are A-Z a-z 0-9 - + / ; . $ _ ( )"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse an optional tube argument: absent or blank means "no explicit tube".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => Self::new(name).map(Some),
        }
    }
}

impl fmt::Display for TubeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TubeName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TubeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Set of tubes a reserve listens on.
///
/// An empty selector means the session's default watch list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TubeSelector(Vec<TubeName>);

impl TubeSelector {
    /// Parse a comma-separated tube list. Blank entries are skipped and
    /// duplicates collapse to their first occurrence.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let mut tubes: Vec<TubeName> = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let tube = TubeName::new(part)?;
            if !tubes.contains(&tube) {
                tubes.push(tube);
            }
        }
        Ok(Self(tubes))
    }

    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tubes(&self) -> &[TubeName] {
        &self.0
    }
}
