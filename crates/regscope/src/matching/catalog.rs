use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for catalog rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Jurisdiction level a rule is issued at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Federal,
    State,
    City,
}

impl Level {
    pub const fn ordered() -> [Self; 3] {
        [Self::Federal, Self::State, Self::City]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Federal => "Federal",
            Self::State => "State",
            Self::City => "City",
        }
    }
}

/// Externally authored regulatory rule. Treated as read-only by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    pub level: Level,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Open condition document; absent or `null` means the rule always applies.
    #[serde(default)]
    pub conditions: Value,
}

impl Rule {
    /// Whether the rule's jurisdiction intersects the given footprint.
    ///
    /// `states` are uppercase codes and `cities` lowercase names.
    pub fn in_footprint(&self, states: &[String], cities: &[String]) -> bool {
        let state_listed = || {
            self.state
                .as_deref()
                .map(|code| code.trim().to_ascii_uppercase())
                .map(|code| states.iter().any(|candidate| *candidate == code))
                .unwrap_or(false)
        };

        match self.level {
            Level::Federal => true,
            Level::State => state_listed(),
            Level::City => {
                state_listed()
                    && self
                        .city
                        .as_deref()
                        .map(|city| city.trim().to_lowercase())
                        .map(|city| cities.iter().any(|candidate| *candidate == city))
                        .unwrap_or(false)
            }
        }
    }
}

/// Candidate retrieval contract backing the matcher.
///
/// Implementations return every federal rule plus the state and city rules inside
/// the footprint, ordered federal, state, city and by ascending title within a level.
/// They never inspect `conditions`. Timeouts and retries belong to the implementation.
pub trait RuleStore: Send + Sync {
    fn fetch_candidates(
        &self,
        states: &[String],
        cities: &[String],
    ) -> Result<Vec<Rule>, StoreError>;
}

/// Error enumeration for candidate retrieval failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rule store unavailable: {0}")]
    Unavailable(String),
    #[error("rule store query timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("rule store returned corrupt data: {0}")]
    Corrupt(String),
}

/// Failure loading a rule catalog into memory.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read rule catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate rule id '{0}' in catalog")]
    DuplicateId(RuleId),
}

/// Process-local catalog answering candidate queries from memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    rules: Vec<Rule>,
}

impl InMemoryRuleStore {
    pub fn new(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(&rule.id) {
                return Err(CatalogError::DuplicateId(rule.id.clone()));
            }
        }

        let mut rules = rules;
        rules.sort_by(|left, right| {
            left.level
                .cmp(&right.level)
                .then_with(|| left.title.cmp(&right.title))
                .then_with(|| left.id.cmp(&right.id))
        });

        Ok(Self { rules })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let rules: Vec<Rule> = serde_json::from_reader(reader)?;
        Self::new(rules)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl RuleStore for InMemoryRuleStore {
    fn fetch_candidates(
        &self,
        states: &[String],
        cities: &[String],
    ) -> Result<Vec<Rule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.in_footprint(states, cities))
            .cloned()
            .collect())
    }
}
