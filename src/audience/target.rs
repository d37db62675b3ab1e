//! Crawl targets: the groups and users a run harvests

use std::fmt;

/// A source of accounts for one crawl run
///
/// Group ids and user ids may be numeric ids or screen names; the API accepts
/// both, so they are kept as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrawlTarget {
    /// Produces the group's members
    Group(String),

    /// Produces the user's friends and followers
    User(String),
}

impl CrawlTarget {
    /// Builds the ordered target list for a run: groups first, then users
    pub fn from_lists(groups: &[String], users: &[String]) -> Vec<Self> {
        groups
            .iter()
            .cloned()
            .map(Self::Group)
            .chain(users.iter().cloned().map(Self::User))
            .collect()
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group {}", id),
            Self::User(id) => write!(f, "user {}", id),
        }
    }
}
