use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::{Level, Rule, RuleId};
use super::conditions::RuleDirectives;
use super::due_date::due_date;
use super::profile::BusinessProfile;

/// A rule that passed evaluation, awaiting assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRule {
    pub rule: Rule,
    pub reasons: Vec<String>,
    pub directives: RuleDirectives,
}

/// Public shape of one applicable rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: RuleId,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub level: Level,
    pub state: Option<String>,
    pub city: Option<String>,
    pub reasons: Vec<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<Value>,
}

/// Matches partitioned by level, each bucket in retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedMatches {
    pub federal: Vec<MatchResult>,
    pub state: Vec<MatchResult>,
    pub city: Vec<MatchResult>,
}

impl GroupedMatches {
    pub fn bucket(&self, level: Level) -> &[MatchResult] {
        match level {
            Level::Federal => &self.federal,
            Level::State => &self.state,
            Level::City => &self.city,
        }
    }

    fn bucket_mut(&mut self, level: Level) -> &mut Vec<MatchResult> {
        match level {
            Level::Federal => &mut self.federal,
            Level::State => &mut self.state,
            Level::City => &mut self.city,
        }
    }

    pub fn len(&self) -> usize {
        Level::ordered()
            .into_iter()
            .map(|level| self.bucket(level).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grouped matches plus the total across all buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub grouped: GroupedMatches,
    pub count: usize,
}

impl MatchResult {
    fn from_matched(matched: MatchedRule, profile: &BusinessProfile) -> Self {
        let MatchedRule {
            rule,
            reasons,
            directives,
        } = matched;
        let due_date = due_date(&directives, profile);

        Self {
            id: rule.id,
            title: rule.title,
            summary: rule.summary,
            source: rule.source,
            level: rule.level,
            state: rule.state,
            city: rule.city,
            reasons,
            due_date,
            action: directives.action,
            owner: directives.owner,
            effort: directives.effort,
        }
    }
}

/// Convert matched rules into grouped results, preserving their incoming order.
pub fn assemble(matched: Vec<MatchedRule>, profile: &BusinessProfile) -> MatchOutcome {
    let mut grouped = GroupedMatches::default();
    for entry in matched {
        let result = MatchResult::from_matched(entry, profile);
        grouped.bucket_mut(result.level).push(result);
    }

    let count = grouped.len();
    MatchOutcome { grouped, count }
}
