//! Crawl modes and the threshold policy they resolve to

use crate::model::Repo;
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Run-wide breadth selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Only the direct stargazers of the target repository
    Basic,

    /// Stargazers plus followers, starred/watched repos and contributions
    Full,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Full => "full",
        }
    }

    /// Returns true if stages past stargazer discovery should run
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Breadth caps and qualification thresholds for one run
///
/// Caps bound how many starred/subscribed repositories are recorded per
/// stargazer. Minimums gate which repositories get their contribution
/// statistics fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub max_starred: usize,
    pub max_subscribed: usize,
    pub min_stargazers: u64,
    pub min_forks: u64,
    pub min_open_issues: u64,
}

impl ThresholdPolicy {
    /// Policy applied in full mode
    pub const FULL: Self = Self {
        max_starred: 100,
        max_subscribed: 100,
        min_stargazers: 300,
        min_forks: 30,
        min_open_issues: 3,
    };

    /// Policy applied in basic mode
    pub const BASIC: Self = Self {
        max_starred: 0,
        max_subscribed: 0,
        min_stargazers: 0,
        min_forks: 0,
        min_open_issues: 0,
    };

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Basic => Self::BASIC,
            Mode::Full => Self::FULL,
        }
    }

    /// Returns true if the repository meets every minimum (inclusive)
    pub fn qualifies(&self, repo: &Repo) -> bool {
        repo.stargazers_count >= self.min_stargazers
            && repo.forks_count >= self.min_forks
            && repo.open_issues >= self.min_open_issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(stargazers: u64, forks: u64, issues: u64) -> Repo {
        Repo::new("acme/widget", stargazers, forks, issues)
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("basic".parse::<Mode>().unwrap(), Mode::Basic);
        assert_eq!("full".parse::<Mode>().unwrap(), Mode::Full);
        assert!(matches!(
            "Full".parse::<Mode>(),
            Err(ConfigError::InvalidMode(_))
        ));
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_display_roundtrip() {
        for mode in [Mode::Basic, Mode::Full] {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_policy_for_mode() {
        let full = ThresholdPolicy::for_mode(Mode::Full);
        assert_eq!(full.max_starred, 100);
        assert_eq!(full.max_subscribed, 100);
        assert_eq!(full.min_stargazers, 300);
        assert_eq!(full.min_forks, 30);
        assert_eq!(full.min_open_issues, 3);

        assert_eq!(ThresholdPolicy::for_mode(Mode::Basic), ThresholdPolicy::BASIC);
    }

    #[test]
    fn test_qualifies_is_inclusive() {
        let policy = ThresholdPolicy::FULL;
        assert!(policy.qualifies(&repo(300, 30, 3)));
        assert!(policy.qualifies(&repo(5000, 400, 90)));
    }

    #[test]
    fn test_qualifies_requires_every_minimum() {
        let policy = ThresholdPolicy::FULL;
        assert!(!policy.qualifies(&repo(50, 400, 90)));
        assert!(!policy.qualifies(&repo(5000, 29, 90)));
        assert!(!policy.qualifies(&repo(5000, 400, 2)));
    }

    #[test]
    fn test_basic_policy_qualifies_everything() {
        assert!(ThresholdPolicy::BASIC.qualifies(&repo(0, 0, 0)));
    }
}
