//! Export segments
//!
//! A segment is a named predicate over stored accounts. Segments only exist at
//! query time and are never persisted.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named filter over stored accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    All,
    Male,
    Female,
    New,
    NewMale,
    NewFemale,
}

#[derive(Debug, Error)]
#[error("Unknown segment '{0}' (expected one of: all, male, female, new, new-male, new-female)")]
pub struct ParseSegmentError(String);

impl Segment {
    /// Returns every segment in display order
    pub fn all_segments() -> [Self; 6] {
        [
            Self::All,
            Self::Male,
            Self::Female,
            Self::New,
            Self::NewMale,
            Self::NewFemale,
        ]
    }

    /// Name used in export file names
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Male => "male",
            Self::Female => "female",
            Self::New => "new",
            Self::NewMale => "new_male",
            Self::NewFemale => "new_female",
        }
    }

    /// SQL predicate selecting this segment from the `accounts` table
    ///
    /// Only constant fragments are produced, so the result is safe to splice
    /// into a query.
    pub fn sql_filter(&self) -> &'static str {
        match self {
            Self::All => "1 = 1",
            Self::Male => "sex = 2",
            Self::Female => "sex = 1",
            Self::New => "status = 'new'",
            Self::NewMale => "sex = 2 AND status = 'new'",
            Self::NewFemale => "sex = 1 AND status = 'new'",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

impl FromStr for Segment {
    type Err = ParseSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Ok(Self::All),
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "new" => Ok(Self::New),
            "new_male" => Ok(Self::NewMale),
            "new_female" => Ok(Self::NewFemale),
            _ => Err(ParseSegmentError(s.to_string())),
        }
    }
}
