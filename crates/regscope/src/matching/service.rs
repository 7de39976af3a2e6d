use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::assembly::{assemble, MatchOutcome, MatchedRule};
use super::cache::{CacheStatus, CandidateCache};
use super::catalog::{Level, Rule, RuleStore, StoreError};
use super::conditions::ConditionSet;
use super::context::EvaluationContext;
use super::evaluation::{evaluate, RejectionCause, Verdict};
use super::profile::BusinessProfile;

/// Entry point composing candidate retrieval, caching, evaluation, and assembly.
pub struct RuleMatcher<S> {
    store: Arc<S>,
    cache: CandidateCache,
}

impl<S> RuleMatcher<S>
where
    S: RuleStore + 'static,
{
    pub fn new(store: Arc<S>, candidate_ttl: Duration) -> Self {
        Self {
            store,
            cache: CandidateCache::new(candidate_ttl),
        }
    }

    pub fn cache(&self) -> &CandidateCache {
        &self.cache
    }

    /// Determine which catalog rules apply to `profile`.
    pub fn match_profile(&self, profile: &BusinessProfile) -> Result<MatchOutcome, MatchError> {
        let context = EvaluationContext::from_profile(profile);
        let candidates = self.candidates(&context)?;

        let matched: Vec<MatchedRule> = candidates
            .iter()
            .filter_map(|rule| evaluate_rule(rule, &context))
            .collect();

        let outcome = assemble(matched, profile);
        info!(
            footprint = %context.footprint_key(),
            candidates = candidates.len(),
            federal = outcome.grouped.bucket(Level::Federal).len(),
            state = outcome.grouped.bucket(Level::State).len(),
            city = outcome.grouped.bucket(Level::City).len(),
            count = outcome.count,
            "matched rules for business profile"
        );

        Ok(outcome)
    }

    fn candidates(&self, context: &EvaluationContext) -> Result<Arc<Vec<Rule>>, MatchError> {
        let key = context.footprint_key();
        let (candidates, status) = self.cache.get_or_fetch(&key, || {
            self.store
                .fetch_candidates(&context.states, &context.cities)
        })?;

        match status {
            CacheStatus::Hit => debug!(%key, "candidate cache hit"),
            CacheStatus::Miss => debug!(%key, fetched = candidates.len(), "candidate cache miss"),
        }

        Ok(candidates)
    }
}

fn evaluate_rule(rule: &Rule, context: &EvaluationContext) -> Option<MatchedRule> {
    let conditions = ConditionSet::parse(&rule.conditions);

    match evaluate(&conditions, context) {
        Verdict::Matched { reasons } => Some(MatchedRule {
            rule: rule.clone(),
            reasons,
            directives: conditions.into_directives(),
        }),
        Verdict::Rejected(rejection) => {
            if let RejectionCause::Malformed(detail) = &rejection.cause {
                warn!(
                    rule_id = %rule.id,
                    key = %rejection.key,
                    %detail,
                    "rule skipped because of a malformed condition"
                );
            } else {
                debug!(
                    rule_id = %rule.id,
                    key = %rejection.key,
                    outcome = %rejection.summary(),
                    "rule conditions not met"
                );
            }
            None
        }
    }
}

/// Error raised by the rule matcher.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("candidate retrieval failed: {0}")]
    Retrieval(#[from] StoreError),
}
