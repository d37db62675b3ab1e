/// Account record definitions
///
/// An account is identified by its numeric VK id and carries the declared sex
/// and a freshness marker telling whether it was first seen in the latest run.
use std::fmt;

/// Opaque numeric VK account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub i64);

impl AccountId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Declared sex of an account, using the VK API encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sex {
    /// Not declared, hidden, or any unrecognized value
    #[default]
    Unknown,
    Female,
    Male,
}

impl Sex {
    /// Maps a raw API code to a sex bucket
    ///
    /// Only 1 and 2 are meaningful; everything else is `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Female,
            2 => Self::Male,
            _ => Self::Unknown,
        }
    }

    /// Returns the API/database integer code
    pub fn code(&self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Female => 1,
            Self::Male => 2,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Female => "female",
            Self::Male => "male",
        };
        write!(f, "{}", name)
    }
}

/// Freshness marker of a stored account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// First seen during the most recent crawl run
    New,

    /// Seen before the most recent crawl run started
    Old,
}

impl Status {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Old => "old",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "old" => Some(Self::Old),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A stored account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub sex: Sex,
    pub status: Status,
    pub first_seen_at: String,
}
