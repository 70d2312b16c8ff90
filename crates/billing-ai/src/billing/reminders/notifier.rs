use super::domain::{OpenInvoice, ReminderType};
use super::repository::{
    AdminNotice, BeginError, EmailMessage, EmailTransport, NotificationSink, PendingReminder,
    ReminderStore, StoreError,
};
use super::templates;
use crate::billing::ReminderId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Delivery knobs, normally sourced from
/// [`DispatchConfig`](crate::config::DispatchConfig).
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    pub send_timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl DeliveryPolicy {
    fn backoff_before(&self, attempt: u32) -> Duration {
        // Doubles per retry: backoff, 2*backoff, 4*backoff, ...
        self.retry_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// What happened to one reminder, short of a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent { reminder_id: ReminderId },
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another run (or a concurrent worker) already holds the slot.
    AlreadyRecorded,
    /// Tenant has no billing email on file; the row is kept as `skipped`.
    NoBillingEmail,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadyRecorded => "already recorded",
            SkipReason::NoBillingEmail => "no billing email on file",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Every delivery attempt failed; the row is already marked `failed`.
    #[error("delivery failed after {attempts} attempt(s): {message}")]
    Delivery { attempts: u32, message: String },
}

/// Sends one reminder end to end: claims the `(invoice, type)` slot, renders
/// the email, drives the transport with timeout and retry, and records the
/// terminal status. Failures are isolated per reminder; the caller decides
/// what a failed reminder means for the run.
pub struct Notifier<T, R, N> {
    transport: Arc<T>,
    reminders: Arc<R>,
    notifications: Arc<N>,
    policy: DeliveryPolicy,
}

impl<T, R, N> Notifier<T, R, N>
where
    T: EmailTransport,
    R: ReminderStore,
    N: NotificationSink,
{
    pub fn new(
        transport: Arc<T>,
        reminders: Arc<R>,
        notifications: Arc<N>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            transport,
            reminders,
            notifications,
            policy,
        }
    }

    pub async fn send_reminder(
        &self,
        open: &OpenInvoice,
        reminder_type: ReminderType,
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, NotifyError> {
        let invoice = &open.invoice;
        let subject = templates::subject_for(reminder_type, invoice);

        let reminder_id = match self.reminders.begin(PendingReminder {
            tenant_id: invoice.tenant_id.clone(),
            invoice_id: invoice.id.clone(),
            reminder_type,
            subject: subject.clone(),
            scheduled_for: now,
        }) {
            Ok(id) => id,
            Err(BeginError::Duplicate) => {
                debug!(
                    invoice = %invoice.id,
                    reminder_type = reminder_type.as_str(),
                    "reminder slot already claimed, skipping"
                );
                return Ok(NotifyOutcome::Skipped {
                    reason: SkipReason::AlreadyRecorded,
                });
            }
            Err(BeginError::Store(err)) => return Err(err.into()),
        };

        let Some(to) = open.contact.billing_email.clone() else {
            self.reminders
                .mark_skipped(&reminder_id, SkipReason::NoBillingEmail.as_str())?;
            warn!(
                tenant = %invoice.tenant_id,
                invoice = %invoice.id,
                "tenant has no billing email, reminder skipped"
            );
            return Ok(NotifyOutcome::Skipped {
                reason: SkipReason::NoBillingEmail,
            });
        };

        let message = EmailMessage {
            to,
            subject,
            body: templates::body_for(reminder_type, open),
        };

        match self.deliver(&message).await {
            Ok(attempts) => {
                self.reminders.mark_sent(&reminder_id, now)?;
                debug!(
                    invoice = %invoice.id,
                    reminder_type = reminder_type.as_str(),
                    attempts,
                    "reminder sent"
                );
                self.publish_sent_notice(open, reminder_type);
                Ok(NotifyOutcome::Sent { reminder_id })
            }
            Err(message) => {
                self.reminders.mark_failed(&reminder_id, &message)?;
                Err(NotifyError::Delivery {
                    attempts: self.policy.max_attempts,
                    message,
                })
            }
        }
    }

    /// Drives the transport until one attempt lands or the budget runs out.
    /// Returns the attempt count on success, the last error message otherwise.
    async fn deliver(&self, message: &EmailMessage) -> Result<u32, String> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.backoff_before(attempt)).await;
            }
            match tokio::time::timeout(self.policy.send_timeout, self.transport.send(message)).await
            {
                Ok(Ok(())) => return Ok(attempt),
                Ok(Err(err)) => {
                    last_error = err.to_string();
                    warn!(to = %message.to, attempt, error = %last_error, "email send failed");
                }
                Err(_) => {
                    last_error =
                        format!("send timed out after {:?}", self.policy.send_timeout);
                    warn!(to = %message.to, attempt, "email send timed out");
                }
            }
        }

        Err(last_error)
    }

    /// Every successful send also raises an in-app admin notice. The notice
    /// is best effort: a sink failure is logged and never affects the
    /// reminder.
    fn publish_sent_notice(&self, open: &OpenInvoice, reminder_type: ReminderType) {
        let invoice = &open.invoice;
        let notice = AdminNotice {
            tenant_id: invoice.tenant_id.clone(),
            invoice_id: invoice.id.clone(),
            reminder_type,
            message: format!(
                "{} sent to {} for invoice {}",
                reminder_type.as_str(),
                open.contact.tenant_name,
                invoice.invoice_number
            ),
        };
        if let Err(err) = self.notifications.publish(notice) {
            warn!(invoice = %invoice.id, error = %err, "admin notice dropped");
        }
    }
}
