use super::domain::{OpenInvoice, ReminderRecord, ReminderType};
use crate::billing::{InvoiceId, ReminderId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read side of the invoice datastore for reminder dispatch.
pub trait InvoiceStore: Send + Sync {
    /// Every unpaid invoice joined with its tenant's billing contact,
    /// ordered by due date ascending.
    fn open_invoices(&self) -> Result<Vec<OpenInvoice>, StoreError>;
}

/// Fields the notifier supplies when claiming a reminder slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReminder {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub reminder_type: ReminderType,
    pub subject: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Reminder rows keyed on `(invoice_id, reminder_type)`.
///
/// `begin` is the dedup gate: it must atomically insert a `pending` row and
/// refuse with [`BeginError::Duplicate`] when any row already holds the key,
/// whatever its status. Concurrent runners then cannot both claim the same
/// reminder.
pub trait ReminderStore: Send + Sync {
    /// Reminder types with any recorded row for the invoice.
    fn recorded_types(&self, invoice: &InvoiceId) -> Result<BTreeSet<ReminderType>, StoreError>;
    /// Insert-if-absent. Returns the new row's id, or `Duplicate` when the
    /// slot is taken.
    fn begin(&self, pending: PendingReminder) -> Result<ReminderId, BeginError>;
    fn mark_sent(&self, id: &ReminderId, sent_at: DateTime<Utc>) -> Result<(), StoreError>;
    fn mark_failed(&self, id: &ReminderId, error: &str) -> Result<(), StoreError>;
    fn mark_skipped(&self, id: &ReminderId, reason: &str) -> Result<(), StoreError>;
    /// Full history for an invoice, oldest first.
    fn history(&self, invoice: &InvoiceId) -> Result<Vec<ReminderRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reminder row not found")]
    NotFound,
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BeginError {
    /// The `(invoice_id, reminder_type)` slot is already claimed.
    #[error("reminder already recorded for this invoice and type")]
    Duplicate,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admin-facing heads-up about a billing event, e.g. an invoice entering the
/// urgent ladder rung. Publishing is best effort and never blocks dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminNotice {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub reminder_type: ReminderType,
    pub message: String,
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, notice: AdminNotice) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
#[error("notification sink failed: {0}")]
pub struct SinkError(pub String);

/// Outbound billing email, already rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery boundary. One attempt per call; timeouts and retries live in the
/// notifier, not here.
#[async_trait::async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("recipient rejected: {0}")]
    RecipientRejected(String),
    #[error("transport failure: {0}")]
    Failed(String),
}
