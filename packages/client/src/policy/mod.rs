//! Host policy: which hosts take the upgrade path.
//!
//! The default strategy is substring containment, so an entry such as
//! `amazing.today` also covers `sub.amazing.today` and, less desirably,
//! `notamazing.today.evil.com`. Pick [`MatchStrategy::Suffix`] or
//! [`MatchStrategy::Exact`] when that breadth is unwanted.
//!
//! Hosts and entries are compared byte for byte, with no case folding and
//! no trailing-dot trimming on either side.

use serde::{Deserialize, Serialize};

use crate::config::ConfigurationError;
use crate::error::{self, Result};

/// Hosts upgraded when no allow-list is supplied.
pub const DEFAULT_UPGRADE_HOSTS: &[&str] = &["amazing.today", "vtov.studio"];

/// How an allow-list entry is compared with a candidate host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Host contains the entry anywhere
    #[default]
    Substring,
    /// Host equals the entry or ends with `.entry`
    Suffix,
    /// Host equals the entry
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Always,
    Entries {
        entries: Vec<String>,
        strategy: MatchStrategy,
    },
}

/// Immutable allow-list deciding "upgrade" or "default" per host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    rule: Rule,
}

impl HostPolicy {
    /// Substring-matching policy over `entries`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an entry is empty or contains
    /// whitespace or control characters.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_strategy(entries, MatchStrategy::Substring)
    }

    /// Policy over `entries` compared with `strategy`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an entry is malformed.
    pub fn with_strategy<I, S>(entries: I, strategy: MatchStrategy) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.into();
            validate_entry(&entry).map_err(error::config)?;
            if !validated.contains(&entry) {
                validated.push(entry);
            }
        }

        Ok(Self {
            rule: Rule::Entries {
                entries: validated,
                strategy,
            },
        })
    }

    /// Policy that upgrades every non-empty host.
    ///
    /// Used when the caller decides per connection which factory to apply.
    #[must_use]
    pub fn always() -> Self {
        Self { rule: Rule::Always }
    }

    /// Policy that never upgrades.
    #[must_use]
    pub fn never() -> Self {
        Self {
            rule: Rule::Entries {
                entries: Vec::new(),
                strategy: MatchStrategy::Substring,
            },
        }
    }

    /// Returns true iff `host` must take the upgrade path.
    #[must_use]
    pub fn should_upgrade(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        match &self.rule {
            Rule::Always => true,
            Rule::Entries { entries, strategy } => {
                entries.iter().any(|entry| matches(host, entry, *strategy))
            }
        }
    }

    /// Allow-list entries in insertion order; empty for [`HostPolicy::always`].
    #[must_use]
    pub fn entries(&self) -> &[String] {
        match &self.rule {
            Rule::Always => &[],
            Rule::Entries { entries, .. } => entries,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Option<MatchStrategy> {
        match &self.rule {
            Rule::Always => None,
            Rule::Entries { strategy, .. } => Some(*strategy),
        }
    }
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self {
            rule: Rule::Entries {
                entries: DEFAULT_UPGRADE_HOSTS.iter().map(|h| (*h).to_owned()).collect(),
                strategy: MatchStrategy::Substring,
            },
        }
    }
}

fn matches(host: &str, entry: &str, strategy: MatchStrategy) -> bool {
    match strategy {
        MatchStrategy::Substring => host.contains(entry),
        MatchStrategy::Suffix => {
            host == entry
                || host
                    .strip_suffix(entry)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        MatchStrategy::Exact => host == entry,
    }
}

fn validate_entry(entry: &str) -> std::result::Result<(), ConfigurationError> {
    if entry.is_empty() {
        return Err(ConfigurationError::HostEntry(entry.to_owned(), "entry is empty"));
    }
    if entry.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigurationError::HostEntry(
            entry.to_owned(),
            "entry contains whitespace or control characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_covers_subdomains() {
        let policy = HostPolicy::new(["amazing.today"]).unwrap();
        assert!(policy.should_upgrade("amazing.today"));
        assert!(policy.should_upgrade("sub.amazing.today"));
        assert!(!policy.should_upgrade("www.google.com"));
    }

    #[test]
    fn substring_over_matches_unrelated_hosts() {
        let policy = HostPolicy::new(["amazing.today"]).unwrap();
        assert!(policy.should_upgrade("notamazing.today.evil.com"));
        assert!(policy.should_upgrade("evil-amazing.today.attacker.com"));
    }

    #[test]
    fn suffix_requires_label_boundary() {
        let policy = HostPolicy::with_strategy(["amazing.today"], MatchStrategy::Suffix).unwrap();
        assert!(policy.should_upgrade("amazing.today"));
        assert!(policy.should_upgrade("sub.amazing.today"));
        assert!(!policy.should_upgrade("notamazing.today"));
        assert!(!policy.should_upgrade("amazing.today.evil.com"));
    }

    #[test]
    fn exact_matches_only_the_entry() {
        let policy = HostPolicy::with_strategy(["vtov.studio"], MatchStrategy::Exact).unwrap();
        assert!(policy.should_upgrade("vtov.studio"));
        assert!(!policy.should_upgrade("api.vtov.studio"));
    }

    #[test]
    fn empty_host_and_empty_list_never_upgrade() {
        assert!(!HostPolicy::new(["amazing.today"]).unwrap().should_upgrade(""));
        assert!(!HostPolicy::always().should_upgrade(""));
        assert!(!HostPolicy::never().should_upgrade("amazing.today"));
        assert!(!HostPolicy::new(Vec::<String>::new()).unwrap().should_upgrade("amazing.today"));
    }

    #[test]
    fn always_upgrades_any_host() {
        let policy = HostPolicy::always();
        assert!(policy.should_upgrade("example.org"));
        assert!(policy.entries().is_empty());
        assert_eq!(policy.strategy(), None);
    }

    #[test]
    fn malformed_entries_are_configuration_errors() {
        let err = HostPolicy::new(["ok.example", ""]).unwrap_err();
        assert!(err.is_config());

        let err = HostPolicy::new(["bad host"]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn default_list_matches_builtin_hosts() {
        let policy = HostPolicy::default();
        assert!(policy.should_upgrade("amazing.today"));
        assert!(policy.should_upgrade("cdn.vtov.studio"));
        assert!(!policy.should_upgrade("www.google.com"));
        assert_eq!(policy.entries().len(), DEFAULT_UPGRADE_HOSTS.len());
    }

    #[test]
    fn duplicate_entries_collapse() {
        let policy = HostPolicy::new(["amazing.today", "vtov.studio", "amazing.today"]).unwrap();
        assert_eq!(policy.entries(), ["amazing.today".to_string(), "vtov.studio".to_string()]);
    }

    #[test]
    fn trailing_dot_is_part_of_the_host() {
        let policy = HostPolicy::new(["today."]).unwrap();
        assert!(policy.should_upgrade("amazing.today."));
        assert!(!policy.should_upgrade("amazing.today"));

        let policy = HostPolicy::new(["amazing.today"]).unwrap();
        assert!(policy.should_upgrade("amazing.today."));
        assert!(!policy.should_upgrade("."));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let policy = HostPolicy::new(["amazing.today"]).unwrap();
        assert!(!policy.should_upgrade("AMAZING.TODAY"));
        assert!(!policy.should_upgrade("cdn.Amazing.today"));

        let policy = HostPolicy::new(["Amazing.Today"]).unwrap();
        assert!(policy.should_upgrade("www.Amazing.Today"));
        assert_eq!(policy.entries(), ["Amazing.Today".to_string()]);
    }
}
