use crate::infra::{load_profile, load_rule_store};
use clap::Args;
use regscope::config::AppConfig;
use regscope::error::AppError;
use regscope::matching::{Level, MatchOutcome, MatchResult, RuleMatcher};
use regscope::telemetry;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Path to a business profile JSON document
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Rule catalog to match against (defaults to APP_RULES_PATH)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Print the grouped result as JSON instead of a text report
    #[arg(long, default_value_t = false)]
    pub(crate) json: bool,
    /// Omit match reasons from the text report
    #[arg(long, default_value_t = false)]
    pub(crate) hide_reasons: bool,
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let CheckArgs {
        profile,
        rules,
        json,
        hide_reasons,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let rules_path = rules.unwrap_or(config.matching.rules_path);
    let store = load_rule_store(&rules_path)?;
    let profile = load_profile(&profile)?;

    let matcher = RuleMatcher::new(Arc::new(store), config.matching.candidate_cache_ttl);
    let outcome = matcher.match_profile(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome, !hide_reasons));
    }
    Ok(())
}

fn render_outcome(outcome: &MatchOutcome, show_reasons: bool) -> String {
    let mut lines = vec![format!("Applicable rules: {}", outcome.count)];

    for level in Level::ordered() {
        let bucket = outcome.grouped.bucket(level);
        lines.push(format!("\n{} ({})", level.label(), bucket.len()));
        if bucket.is_empty() {
            lines.push("- none".to_string());
        }
        for result in bucket {
            lines.extend(render_result(result, show_reasons));
        }
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn render_result(result: &MatchResult, show_reasons: bool) -> Vec<String> {
    let jurisdiction = match (&result.state, &result.city) {
        (Some(state), Some(city)) => format!(" [{city}, {state}]"),
        (Some(state), None) => format!(" [{state}]"),
        _ => String::new(),
    };
    let mut lines = vec![format!("- {}{} ({})", result.title, jurisdiction, result.id)];

    if let Some(due) = result.due_date {
        lines.push(format!("    due {due}"));
    }
    if let Some(action) = result.action.as_ref().map(display_value) {
        lines.push(format!("    action: {action}"));
    }
    if let Some(owner) = result.owner.as_ref().map(display_value) {
        lines.push(format!("    owner: {owner}"));
    }
    if show_reasons {
        lines.extend(result.reasons.iter().map(|reason| format!("    * {reason}")));
    }

    lines
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regscope::matching::{GroupedMatches, RuleId};
    use serde_json::json;

    fn result(id: &str, title: &str, level: Level) -> MatchResult {
        MatchResult {
            id: RuleId(id.to_string()),
            title: title.to_string(),
            summary: String::new(),
            source: String::new(),
            level,
            state: None,
            city: None,
            reasons: vec!["Applies to every business in this jurisdiction".to_string()],
            due_date: None,
            action: None,
            owner: None,
            effort: None,
        }
    }

    fn outcome() -> MatchOutcome {
        let mut permit = result("ca-seller-permit", "Seller's permit", Level::State);
        permit.state = Some("CA".to_string());
        permit.due_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        permit.action = Some(json!("Apply with CDTFA"));
        permit.owner = Some(json!({ "team": "Finance" }));

        let grouped = GroupedMatches {
            federal: vec![result("fed-ein", "Employer Identification Number", Level::Federal)],
            state: vec![permit],
            city: Vec::new(),
        };
        MatchOutcome { count: 2, grouped }
    }

    #[test]
    fn report_lists_levels_in_order() {
        let report = render_outcome(&outcome(), true);

        let federal = report.find("Federal (1)").expect("federal heading");
        let state = report.find("State (1)").expect("state heading");
        let city = report.find("City (0)").expect("city heading");
        assert!(federal < state && state < city);
        assert!(report.starts_with("Applicable rules: 2"));
        assert!(report.contains("- Seller's permit [CA] (ca-seller-permit)"));
        assert!(report.contains("    due 2024-03-01"));
        assert!(report.contains("    action: Apply with CDTFA"));
        assert!(report.contains(r#"    owner: {"team":"Finance"}"#));
        assert!(report.contains("- none"));
    }

    #[test]
    fn reasons_can_be_hidden() {
        let shown = render_outcome(&outcome(), true);
        let hidden = render_outcome(&outcome(), false);

        assert!(shown.contains("* Applies to every business"));
        assert!(!hidden.contains("* Applies to every business"));
    }
}
