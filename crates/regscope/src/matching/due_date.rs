use chrono::{DateTime, Duration, NaiveDate};

use super::conditions::{DueOffset, RuleDirectives};
use super::profile::BusinessProfile;

/// Compute a rule's due date from the profile date field named by `dueFrom`.
///
/// Arithmetic is on calendar days; timestamps are reduced to their UTC date first.
/// Returns `None` when the rule names no source field, the profile leaves it empty,
/// the date cannot be parsed, or `dueInDays` is not a whole number.
pub fn due_date(directives: &RuleDirectives, profile: &BusinessProfile) -> Option<NaiveDate> {
    let field = directives.due_from.as_deref()?;
    let raw = profile.date_field(field)?;
    let start = parse_calendar_date(raw)?;

    let offset = match &directives.due_in_days {
        DueOffset::Omitted => 0,
        DueOffset::Days(days) => *days,
        DueOffset::Malformed(detail) => {
            tracing::debug!(%field, %detail, "skipping due date with malformed offset");
            return None;
        }
    };

    start.checked_add_signed(Duration::try_days(offset)?)
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|timestamp| timestamp.naive_utc().date())
    })
}
