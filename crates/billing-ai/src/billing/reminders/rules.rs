use super::domain::{InvoiceRecord, InvoiceStatus, ReminderType};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeSet;

/// Day offsets from the due date at which each milestone is reached, in
/// escalation order. Positive is before the due date.
const DUE_DATE_LADDER: [(ReminderType, i64); 5] = [
    (ReminderType::UpcomingInvoice, 7),
    (ReminderType::InvoiceDue, 0),
    (ReminderType::OverdueGentle, -7),
    (ReminderType::OverdueReminder, -14),
    (ReminderType::OverdueUrgent, -30),
];

const GRACE_WARNING_DAYS_BEFORE_END: i64 = 7;

/// Whole days from `now` until midnight of `date`, floored. An invoice due
/// tomorrow reports 0 until midnight passes, then -1 the day after due.
pub fn days_until(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    (midnight - now).num_seconds().div_euclid(86_400)
}

/// Reminder types due for one invoice right now, given the types already
/// recorded for it.
///
/// Each rule is a reached-milestone check (`days_until_due <= offset`) gated
/// by the dedup set, so a run skipped on the exact milestone day catches up
/// on the next run instead of missing the type forever. An empty result is a
/// legitimate "no reminder due" outcome, not an error.
pub fn due_reminders(
    invoice: &InvoiceRecord,
    now: DateTime<Utc>,
    already_sent: &BTreeSet<ReminderType>,
) -> Vec<ReminderType> {
    let mut due = Vec::new();
    let days_until_due = days_until(invoice.due_date, now);

    for (reminder_type, offset) in DUE_DATE_LADDER {
        if days_until_due <= offset && !already_sent.contains(&reminder_type) {
            due.push(reminder_type);
        }
    }

    if invoice.status == InvoiceStatus::Overdue {
        if let Some(grace) = invoice.grace_period_days {
            let grace_end = invoice.due_date + Duration::days(grace.days() as i64);
            if days_until(grace_end, now) <= GRACE_WARNING_DAYS_BEFORE_END
                && !already_sent.contains(&ReminderType::GracePeriodWarning)
            {
                due.push(ReminderType::GracePeriodWarning);
            }
        }
    }

    due
}
