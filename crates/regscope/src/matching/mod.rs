//! Regulatory rule matching for business profiles.
//!
//! A profile is normalized into an [`EvaluationContext`], candidate rules are pulled
//! for its jurisdiction footprint (through a short-lived [`CandidateCache`]), each
//! candidate's condition document is evaluated, and the survivors are grouped by
//! level with their reasons and due dates.

pub mod assembly;
pub mod cache;
pub mod catalog;
pub mod conditions;
pub mod context;
pub mod due_date;
pub mod evaluation;
pub mod profile;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assembly::{assemble, GroupedMatches, MatchOutcome, MatchResult, MatchedRule};
pub use cache::{CacheStatus, CandidateCache, DEFAULT_CANDIDATE_TTL};
pub use catalog::{CatalogError, InMemoryRuleStore, Level, Rule, RuleId, RuleStore, StoreError};
pub use conditions::{
    AllowListField, BooleanFlag, Bound, Condition, ConditionSet, DerivedGate, DueOffset,
    RuleDirectives,
};
pub use context::{footprint_key, EvaluationContext};
pub use due_date::due_date;
pub use evaluation::{evaluate, Rejection, RejectionCause, Verdict, UNCONDITIONAL_REASON};
pub use profile::BusinessProfile;
pub use router::match_router;
pub use service::{MatchError, RuleMatcher};
