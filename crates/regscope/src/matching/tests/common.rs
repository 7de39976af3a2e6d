use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::{json, Value};

use crate::matching::catalog::{InMemoryRuleStore, Level, Rule, RuleId, RuleStore, StoreError};
use crate::matching::conditions::ConditionSet;
use crate::matching::context::EvaluationContext;
use crate::matching::profile::BusinessProfile;
use crate::matching::service::RuleMatcher;

pub(super) fn alcohol_retailer() -> BusinessProfile {
    BusinessProfile {
        business_name: "Sunset Bottle Shop".to_string(),
        industry: "Retail".to_string(),
        state: "CA".to_string(),
        city: "Los Angeles".to_string(),
        employees_total: 3,
        sells_alcohol: true,
        alcohol_sales_context: Some("off-premise".to_string()),
        accepts_card_payments: true,
        first_payroll_date: Some("2024-01-01".to_string()),
        ..BusinessProfile::default()
    }
}

pub(super) fn multistate_seller() -> BusinessProfile {
    BusinessProfile {
        business_name: "Empire Goods".to_string(),
        industry: "ecommerce".to_string(),
        state: "ny".to_string(),
        city: " New York ".to_string(),
        employees_total: 12,
        sales_states: vec!["CA".to_string(), "NY".to_string()],
        collects_from_ca: true,
        collects_customer_data: true,
        ..BusinessProfile::default()
    }
}

pub(super) fn rule(id: &str, title: &str, level: Level, conditions: Value) -> Rule {
    let (state, city) = match level {
        Level::Federal => (None, None),
        Level::State => (Some("CA".to_string()), None),
        Level::City => (Some("CA".to_string()), Some("Los Angeles".to_string())),
    };

    Rule {
        id: RuleId(id.to_string()),
        title: title.to_string(),
        summary: format!("{title} summary"),
        source: "https://example.gov/regulation".to_string(),
        level,
        state,
        city,
        conditions,
    }
}

pub(super) fn state_rule(id: &str, title: &str, state: &str, conditions: Value) -> Rule {
    Rule {
        state: Some(state.to_string()),
        ..rule(id, title, Level::State, conditions)
    }
}

pub(super) fn sample_catalog() -> Vec<Rule> {
    vec![
        rule("fed-ein", "Employer Identification Number", Level::Federal, Value::Null),
        rule(
            "fed-i9",
            "Form I-9 employment verification",
            Level::Federal,
            json!({ "employeesMin": 1, "action": "Complete I-9 for each hire", "owner": "HR" }),
        ),
        rule(
            "fed-osha-300",
            "OSHA injury log",
            Level::Federal,
            json!({ "employeesMin": 11 }),
        ),
        rule(
            "ca-abc-offsale",
            "ABC Type 21 off-sale general license",
            Level::State,
            json!({
                "requiresAlcohol": true,
                "alcoholSalesContext": ["off-premise", "both"],
                "dueFrom": "firstPayrollDate",
                "dueInDays": 30,
                "effort": "high"
            }),
        ),
        rule(
            "ca-heat-illness",
            "Heat illness prevention plan",
            Level::State,
            json!({ "employeesMin": 10 }),
        ),
        rule(
            "ca-food-handler",
            "California food handler card",
            Level::State,
            json!({ "requiresFood": true }),
        ),
        rule("ca-seller-permit", "Seller's permit", Level::State, json!({})),
        rule(
            "la-btrc",
            "Business tax registration certificate",
            Level::City,
            json!({ "cities": ["Los Angeles"] }),
        ),
        state_rule("ny-wage-notice", "Wage theft prevention notice", "NY", Value::Null),
    ]
}

pub(super) fn sample_store() -> InMemoryRuleStore {
    InMemoryRuleStore::new(sample_catalog()).expect("sample catalog builds")
}

pub(super) fn context_for(profile: &BusinessProfile) -> EvaluationContext {
    EvaluationContext::from_profile(profile)
}

pub(super) fn conditions(document: Value) -> ConditionSet {
    ConditionSet::parse(&document)
}

/// Store wrapper counting how often candidates are fetched.
#[derive(Default)]
pub(super) struct CountingStore {
    inner: InMemoryRuleStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    pub(super) fn new(rules: Vec<Rule>) -> Self {
        Self {
            inner: InMemoryRuleStore::new(rules).expect("catalog builds"),
            fetches: AtomicUsize::new(0),
        }
    }

    pub(super) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RuleStore for CountingStore {
    fn fetch_candidates(
        &self,
        states: &[String],
        cities: &[String],
    ) -> Result<Vec<Rule>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_candidates(states, cities)
    }
}

pub(super) struct UnavailableStore;

impl RuleStore for UnavailableStore {
    fn fetch_candidates(
        &self,
        _states: &[String],
        _cities: &[String],
    ) -> Result<Vec<Rule>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Store whose query always exceeds its deadline.
pub(super) struct TimeoutStore {
    pub(super) deadline: Duration,
    attempts: AtomicUsize,
}

impl TimeoutStore {
    pub(super) fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            attempts: AtomicUsize::new(0),
        }
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RuleStore for TimeoutStore {
    fn fetch_candidates(
        &self,
        _states: &[String],
        _cities: &[String],
    ) -> Result<Vec<Rule>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Timeout(self.deadline))
    }
}

pub(super) fn matcher_with<S: RuleStore + 'static>(store: Arc<S>) -> RuleMatcher<S> {
    RuleMatcher::new(store, Duration::from_secs(60))
}

pub(super) fn sample_matcher() -> RuleMatcher<InMemoryRuleStore> {
    matcher_with(Arc::new(sample_store()))
}

pub(super) fn ids(results: &[crate::matching::MatchResult]) -> Vec<&str> {
    results.iter().map(|result| result.id.0.as_str()).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
