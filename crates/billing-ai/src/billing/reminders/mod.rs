//! Invoice reminder dispatch: the escalation ladder, the dedup-gated
//! notifier, and the run loop that works through every open invoice.

pub mod dispatch;
mod domain;
pub mod notifier;
pub mod repository;
mod rules;
mod templates;

pub use dispatch::{DispatchRunner, ReminderResult, ResultStatus, RunError, RunReport, RunSummary};
pub use domain::{
    BillingContact, InvoiceRecord, InvoiceStatus, OpenInvoice, ReminderRecord, ReminderStatus,
    ReminderType,
};
pub use notifier::{DeliveryPolicy, Notifier, NotifyError, NotifyOutcome, SkipReason};
pub use repository::{
    AdminNotice, BeginError, EmailMessage, EmailTransport, InvoiceStore, NotificationSink,
    PendingReminder, ReminderStore, SinkError, StoreError, TransportError,
};
pub use rules::{days_until, due_reminders};
pub use templates::{body_for, format_guaranies, subject_for};
