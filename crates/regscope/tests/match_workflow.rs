//! End-to-end matching scenarios driven through the public service facade.
//!
//! The catalog and profiles are supplied as JSON, the way the HTTP layer and the
//! catalog loader receive them.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use regscope::matching::{BusinessProfile, InMemoryRuleStore, RuleMatcher};
    use serde_json::json;

    pub(super) fn catalog_json() -> serde_json::Value {
        json!([
            {
                "id": "fed-ein",
                "title": "Employer Identification Number",
                "summary": "Obtain an EIN from the IRS before hiring.",
                "source": "26 U.S.C. 6109",
                "level": "federal",
                "conditions": {}
            },
            {
                "id": "fed-w4",
                "title": "Collect Form W-4",
                "summary": "Collect withholding certificates from employees.",
                "source": "26 U.S.C. 3402",
                "level": "federal",
                "conditions": {
                    "employeesMin": 1,
                    "dueFrom": "firstPayrollDate",
                    "dueInDays": 30,
                    "action": "Collect W-4 from each employee",
                    "owner": "Payroll"
                }
            },
            {
                "id": "fed-coppa",
                "title": "COPPA parental consent",
                "summary": "Obtain verifiable parental consent.",
                "source": "15 U.S.C. 6501",
                "level": "federal",
                "conditions": { "childrenUnder13": true }
            },
            {
                "id": "ca-abc-21",
                "title": "ABC off-sale general license",
                "summary": "License to sell beer, wine, and spirits for off-site consumption.",
                "source": "Cal. Bus. & Prof. Code 23393",
                "level": "state",
                "state": "CA",
                "conditions": {
                    "requiresAlcohol": true,
                    "alcoholSalesContext": ["off-premise", "both"]
                }
            },
            {
                "id": "ca-ccpa",
                "title": "CCPA privacy notice",
                "summary": "Publish a notice at collection.",
                "source": "Cal. Civ. Code 1798.100",
                "level": "state",
                "state": "CA",
                "conditions": { "collectsFromCA": true, "dataVolumeBand": ["100k+"] }
            },
            {
                "id": "ca-sexual-harassment",
                "title": "Sexual harassment prevention training",
                "summary": "Train supervisors and staff.",
                "source": "Cal. Gov. Code 12950.1",
                "level": "state",
                "state": "CA",
                "conditions": { "employeesMin": 5 }
            },
            {
                "id": "ca-sos",
                "title": "Statement of Information",
                "summary": "File with the Secretary of State.",
                "source": "Cal. Corp. Code 1502",
                "level": "state",
                "state": "CA"
            },
            {
                "id": "ny-sales-tax",
                "title": "Certificate of Authority",
                "summary": "Register for NY sales tax.",
                "source": "N.Y. Tax Law 1134",
                "level": "state",
                "state": "NY",
                "conditions": null
            },
            {
                "id": "la-btrc",
                "title": "Business Tax Registration Certificate",
                "summary": "Register with the LA Office of Finance.",
                "source": "LAMC 21.03",
                "level": "city",
                "state": "CA",
                "city": "Los Angeles"
            },
            {
                "id": "nyc-cards",
                "title": "Cashless ban compliance",
                "summary": "Accept cash at brick-and-mortar locations.",
                "source": "NYC Admin Code 20-840",
                "level": "city",
                "state": "NY",
                "city": "New York",
                "conditions": { "acceptsCardPayments": true }
            }
        ])
    }

    pub(super) fn matcher() -> RuleMatcher<InMemoryRuleStore> {
        let bytes = serde_json::to_vec(&catalog_json()).expect("serialize catalog");
        let store = InMemoryRuleStore::from_reader(bytes.as_slice()).expect("catalog loads");
        RuleMatcher::new(Arc::new(store), Duration::from_secs(60))
    }

    pub(super) fn profile(value: serde_json::Value) -> BusinessProfile {
        serde_json::from_value(value).expect("profile deserializes")
    }

    pub(super) fn ids(results: &[regscope::matching::MatchResult]) -> Vec<&str> {
        results.iter().map(|result| result.id.0.as_str()).collect()
    }
}

use common::*;
use regscope::matching::{Level, UNCONDITIONAL_REASON};
use serde_json::json;

#[test]
fn off_premise_alcohol_retailer_in_los_angeles() {
    let matcher = matcher();
    let profile = profile(json!({
        "businessName": "Sunset Bottle Shop",
        "state": "CA",
        "city": "Los Angeles",
        "sellsAlcohol": true,
        "alcoholSalesContext": "off-premise",
        "employeesTotal": 3,
        "firstPayrollDate": "2024-01-01"
    }));

    let outcome = matcher.match_profile(&profile).expect("match succeeds");

    assert_eq!(ids(&outcome.grouped.federal), vec!["fed-w4", "fed-ein"]);
    assert_eq!(ids(&outcome.grouped.state), vec!["ca-abc-21", "ca-sos"]);
    assert_eq!(ids(&outcome.grouped.city), vec!["la-btrc"]);
    assert_eq!(outcome.count, 5);

    let license = &outcome.grouped.state[0];
    assert!(license
        .reasons
        .iter()
        .any(|reason| reason.starts_with("Alcohol sales context")));

    let w4 = &outcome.grouped.federal[0];
    assert_eq!(
        w4.due_date.map(|date| date.to_string()),
        Some("2024-01-31".to_string())
    );
    assert_eq!(w4.owner, Some(json!("Payroll")));
}

#[test]
fn headcount_gate_rejects_small_employer() {
    let matcher = matcher();
    let profile = profile(json!({
        "state": "CA",
        "city": "Los Angeles",
        "employeesTotal": 3
    }));

    let outcome = matcher.match_profile(&profile).expect("match succeeds");

    assert!(!ids(&outcome.grouped.state).contains(&"ca-sexual-harassment"));
}

#[test]
fn new_york_seller_collecting_california_data() {
    let matcher = matcher();
    let profile = profile(json!({
        "state": "NY",
        "city": "New York",
        "salesStates": ["CA", "NY"],
        "collectsFromCA": true,
        "dataVolumeBand": "100k+",
        "acceptsCardPayments": true
    }));

    let outcome = matcher.match_profile(&profile).expect("match succeeds");

    let state = ids(&outcome.grouped.state);
    assert_eq!(state, vec!["ca-ccpa", "ny-sales-tax", "ca-sos"]);
    assert_eq!(ids(&outcome.grouped.city), vec!["nyc-cards"]);

    let sos = &outcome.grouped.state[2];
    assert_eq!(sos.reasons, vec![UNCONDITIONAL_REASON.to_string()]);
}

#[test]
fn results_serialize_into_level_buckets() {
    let matcher = matcher();
    let profile = profile(json!({ "state": "NY", "employeesTotal": 2 }));

    let outcome = matcher.match_profile(&profile).expect("match succeeds");
    let payload = serde_json::to_value(&outcome).expect("serialize outcome");

    assert_eq!(payload["count"], json!(outcome.count));
    for level in Level::ordered() {
        let key = level.label().to_lowercase();
        assert!(payload["grouped"][key.as_str()].is_array(), "missing {key}");
    }
    assert_eq!(payload["grouped"]["federal"][0]["level"], json!("federal"));
}

#[test]
fn matching_is_deterministic_across_runs() {
    let profile = profile(json!({
        "state": "CA",
        "city": "los angeles",
        "employeesTotal": 8,
        "childrenUnder13": true
    }));

    let first = matcher().match_profile(&profile).expect("first run");
    let second = matcher().match_profile(&profile).expect("second run");
    let repeated = {
        let shared = matcher();
        let _ = shared.match_profile(&profile).expect("prime");
        shared.match_profile(&profile).expect("cached run")
    };

    assert_eq!(first, second);
    assert_eq!(first, repeated);
    assert!(ids(&first.grouped.federal).contains(&"fed-coppa"));
}
