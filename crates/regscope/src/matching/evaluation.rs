use super::conditions::{Bound, Condition, ConditionSet, DerivedGate};
use super::context::EvaluationContext;

/// Reason attached to rules whose conditions place no constraint on the business.
pub const UNCONDITIONAL_REASON: &str = "Applies to every business in this jurisdiction";

/// Outcome of evaluating one rule's conditions against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Matched { reasons: Vec<String> },
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched { .. })
    }

    /// Reasons explaining a match. Rejected verdicts carry none.
    pub fn reasons(&self) -> &[String] {
        match self {
            Verdict::Matched { reasons } => reasons,
            Verdict::Rejected(_) => &[],
        }
    }
}

/// First condition key that failed, short-circuiting the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub key: String,
    pub cause: RejectionCause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionCause {
    NotSatisfied,
    Malformed(String),
}

impl Rejection {
    fn not_satisfied(key: &str) -> Self {
        Self {
            key: key.to_string(),
            cause: RejectionCause::NotSatisfied,
        }
    }

    pub fn summary(&self) -> String {
        match &self.cause {
            RejectionCause::NotSatisfied => format!("rejected: '{}' not satisfied", self.key),
            RejectionCause::Malformed(detail) => {
                format!("rejected: malformed '{}' condition ({detail})", self.key)
            }
        }
    }
}

enum Check {
    Passed(String),
    Skipped,
    Failed(Rejection),
}

/// Evaluate a condition set as an implicit conjunction.
///
/// Every recognized condition that passes contributes one reason; the first one that
/// fails rejects the rule and discards the reasons gathered so far.
pub fn evaluate(conditions: &ConditionSet, context: &EvaluationContext) -> Verdict {
    if conditions.is_unconditional() {
        return Verdict::Matched {
            reasons: vec![UNCONDITIONAL_REASON.to_string()],
        };
    }

    let mut reasons = Vec::new();

    for condition in conditions.conditions() {
        match check(condition, context) {
            Check::Passed(reason) => reasons.push(reason),
            Check::Skipped => {}
            Check::Failed(rejection) => return Verdict::Rejected(rejection),
        }
    }

    Verdict::Matched { reasons }
}

fn check(condition: &Condition, context: &EvaluationContext) -> Check {
    match condition {
        Condition::NumericBound { bound, value } => {
            let employees = u64::from(context.employees_total);
            match bound {
                Bound::Min if employees >= *value => Check::Passed(format!(
                    "Employs {employees} people, meeting the minimum of {value}"
                )),
                Bound::Max if employees <= *value => Check::Passed(format!(
                    "Employs {employees} people, within the maximum of {value}"
                )),
                _ => Check::Failed(Rejection::not_satisfied(bound.key())),
            }
        }
        Condition::SetMembership { allowed } => {
            let industry = context.industry.as_str();
            if !industry.is_empty()
                && allowed
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(industry))
            {
                Check::Passed(format!("Industry '{industry}' is covered"))
            } else {
                Check::Failed(Rejection::not_satisfied("industry"))
            }
        }
        Condition::BooleanGate(gate) => {
            let active = match gate {
                DerivedGate::RequiresFood => context.requires_food,
                DerivedGate::RequiresAlcohol => context.requires_alcohol,
            };
            if active {
                Check::Passed(gate.label().to_string())
            } else {
                Check::Failed(Rejection::not_satisfied(gate.key()))
            }
        }
        Condition::AllowList { field, allowed } => {
            let hit = context
                .allow_list_values(*field)
                .iter()
                .find(|value| allowed.iter().any(|candidate| candidate == *value));
            match hit {
                Some(value) => Check::Passed(format!("{} '{value}' is covered", field.label())),
                None => Check::Failed(Rejection::not_satisfied(field.key())),
            }
        }
        Condition::Location { cities } => {
            let hit = cities.iter().find(|candidate| {
                let candidate = candidate.to_lowercase();
                context.cities.iter().any(|city| *city == candidate)
            });
            match hit {
                Some(city) => Check::Passed(format!("Operates in {city}")),
                None => Check::Failed(Rejection::not_satisfied("cities")),
            }
        }
        Condition::ExactBoolean { flag, expected } => {
            if context.flag(*flag) == *expected {
                let answer = if *expected { "yes" } else { "no" };
                Check::Passed(format!("{}: {answer}", flag.label()))
            } else {
                Check::Failed(Rejection::not_satisfied(flag.key()))
            }
        }
        Condition::Malformed { key, detail } => Check::Failed(Rejection {
            key: key.clone(),
            cause: RejectionCause::Malformed(detail.clone()),
        }),
        Condition::Unrecognized(key) => {
            tracing::trace!(%key, "ignoring unrecognized condition key");
            Check::Skipped
        }
    }
}
