use crate::billing::grace::GracePeriodDays;
use crate::billing::{InvoiceId, ReminderId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Platform invoice lifecycle. Only open states are eligible for reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Overdue,
    Paid,
    Void,
    Waived,
}

impl InvoiceStatus {
    /// Unpaid and still collectible.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Overdue
        )
    }
}

/// Billing notification categories, in escalation order. Each fires at most
/// once in an invoice's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    UpcomingInvoice,
    InvoiceDue,
    OverdueGentle,
    OverdueReminder,
    OverdueUrgent,
    GracePeriodWarning,
}

impl ReminderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderType::UpcomingInvoice => "upcoming_invoice",
            ReminderType::InvoiceDue => "invoice_due",
            ReminderType::OverdueGentle => "overdue_gentle",
            ReminderType::OverdueReminder => "overdue_reminder",
            ReminderType::OverdueUrgent => "overdue_urgent",
            ReminderType::GracePeriodWarning => "grace_period_warning",
        }
    }
}

/// Delivery state of a persisted reminder row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
}

/// Billing fields of one platform invoice, as read from the datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub tenant_id: TenantId,
    pub invoice_number: String,
    pub total: f64,
    pub status: InvoiceStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub due_date: NaiveDate,
    /// Set from a prior grace evaluation when the invoice went overdue.
    pub grace_period_days: Option<GracePeriodDays>,
}

/// Who to reach for a tenant's billing matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingContact {
    pub tenant_name: String,
    pub billing_email: Option<String>,
}

/// An unpaid invoice joined with its tenant's billing contact, the unit the
/// dispatch runner works through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInvoice {
    pub invoice: InvoiceRecord,
    pub contact: BillingContact,
}

/// One persisted reminder row. Rows are append-only: created as `pending`,
/// moved to a terminal status in the same pass, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: ReminderId,
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub reminder_type: ReminderType,
    pub status: ReminderStatus,
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}
