use crate::model::Contribution;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A GitHub user as returned by the API
///
/// Follower nodes carry only a subset of these fields; the rest stay at
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// GraphQL node id
    pub id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub url: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user who starred the target repository, with everything discovered
/// about them during the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stargazer {
    pub user: User,

    /// When the user starred the target repository
    pub starred_at: Option<DateTime<Utc>>,

    /// Followers in API order
    pub followers: Vec<User>,

    /// Full names of starred repositories, in API order, capped by policy
    pub starred: Vec<String>,

    /// Full names of watched repositories, in API order, capped by policy
    pub subscribed: Vec<String>,

    /// This stargazer's contribution to each qualifying subscribed repo
    pub contributions: BTreeMap<String, Contribution>,
}

impl Stargazer {
    pub fn new(user: User, starred_at: Option<DateTime<Utc>>) -> Self {
        Self {
            user,
            starred_at,
            followers: Vec::new(),
            starred: Vec::new(),
            subscribed: Vec::new(),
            contributions: BTreeMap::new(),
        }
    }

    pub fn login(&self) -> &str {
        &self.user.login
    }
}
