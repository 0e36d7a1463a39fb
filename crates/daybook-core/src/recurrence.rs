use crate::model::{Recurrence, RecurrenceKind};
use chrono::{Days, Months, NaiveDate};

/// Next occurrence for a completed recurring task. The base is the current
/// due date, or `today` when the task never had one. Monthly arithmetic
/// clamps to the last day of shorter months.
pub fn next_due_date(current: Option<NaiveDate>, rule: &Recurrence, today: NaiveDate) -> NaiveDate {
    let base = current.unwrap_or(today);
    let interval = rule.interval.max(1);

    let advanced = match rule.kind {
        RecurrenceKind::Daily => base.checked_add_days(Days::new(u64::from(interval))),
        RecurrenceKind::Weekly => base.checked_add_days(Days::new(7 * u64::from(interval))),
        RecurrenceKind::Monthly => base.checked_add_months(Months::new(interval)),
    };

    advanced.unwrap_or(base)
}
