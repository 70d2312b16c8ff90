use super::domain::{OpenInvoice, ReminderType};
use super::notifier::{Notifier, NotifyOutcome};
use super::repository::{EmailTransport, InvoiceStore, NotificationSink, ReminderStore, StoreError};
use super::rules;
use crate::billing::{InvoiceId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Terminal state of one reminder attempt within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Sent,
    Skipped,
    Error,
}

/// One line of the run report. `reminder_type` is absent for whole-invoice
/// outcomes such as "no reminder due".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderResult {
    pub tenant_id: TenantId,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub reminder_type: Option<ReminderType>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub invoices_scanned: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunSummary {
    fn tally(results: &[ReminderResult], invoices_scanned: usize) -> Self {
        let mut summary = RunSummary {
            invoices_scanned,
            ..RunSummary::default()
        };
        for result in results {
            match result.status {
                ResultStatus::Sent => summary.sent += 1,
                ResultStatus::Skipped => summary.skipped += 1,
                ResultStatus::Error => summary.errors += 1,
            }
        }
        summary
    }
}

/// Full outcome of one dispatch pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub results: Vec<ReminderResult>,
}

/// The only failure that aborts a whole run. Everything downstream of the
/// invoice listing degrades to per-reminder error results instead.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to list open invoices: {0}")]
    ListInvoices(#[from] StoreError),
}

/// Walks every open invoice, evaluates the reminder ladder, and hands due
/// reminders to the notifier under a concurrency cap and a run deadline.
pub struct DispatchRunner<I, T, R, N> {
    invoices: Arc<I>,
    reminders: Arc<R>,
    notifier: Arc<Notifier<T, R, N>>,
    max_concurrency: usize,
    run_deadline: Duration,
}

impl<I, T, R, N> DispatchRunner<I, T, R, N>
where
    I: InvoiceStore + 'static,
    T: EmailTransport + 'static,
    R: ReminderStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        invoices: Arc<I>,
        reminders: Arc<R>,
        notifier: Arc<Notifier<T, R, N>>,
        max_concurrency: usize,
        run_deadline: Duration,
    ) -> Self {
        Self {
            invoices,
            reminders,
            notifier,
            max_concurrency: max_concurrency.max(1),
            run_deadline,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, RunError> {
        let open: Vec<OpenInvoice> = self
            .invoices
            .open_invoices()?
            .into_iter()
            .filter(|open| open.invoice.status.is_open())
            .collect();
        let invoices_scanned = open.len();
        info!(invoices = invoices_scanned, "reminder dispatch run started");

        let deadline = tokio::time::Instant::now() + self.run_deadline;
        let gate = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, open_invoice) in open.iter().cloned().enumerate() {
            let gate = Arc::clone(&gate);
            let reminders = Arc::clone(&self.reminders);
            let notifier = Arc::clone(&self.notifier);
            tasks.spawn(async move {
                // A closed gate means the run deadline passed before this
                // invoice started; nothing is claimed for it.
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, None),
                };
                (
                    index,
                    Some(
                        process_invoice(&open_invoice, reminders.as_ref(), notifier.as_ref(), now)
                            .await,
                    ),
                )
            });
        }

        // Slots stay None for invoices refused at the deadline or lost to a
        // panicked worker.
        let mut slots: Vec<Option<Vec<ReminderResult>>> = vec![None; invoices_scanned];
        let mut deadline_passed = false;
        loop {
            let joined = if deadline_passed {
                tasks.join_next().await
            } else {
                match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        // In-flight sends keep running to their terminal mark
                        // so no claimed slot is left pending; only un-started
                        // invoices are refused.
                        warn!(
                            deadline = ?self.run_deadline,
                            "run deadline exceeded, refusing un-started invoices"
                        );
                        gate.close();
                        deadline_passed = true;
                        continue;
                    }
                }
            };
            match joined {
                Some(Ok((index, results))) => slots[index] = results,
                Some(Err(err)) => {
                    error!(error = %err, "reminder worker panicked");
                }
                None => break,
            }
        }

        let mut results = Vec::new();
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(invoice_results) => results.extend(invoice_results),
                None => {
                    let open_invoice = &open[index];
                    results.push(ReminderResult {
                        tenant_id: open_invoice.invoice.tenant_id.clone(),
                        invoice_id: open_invoice.invoice.id.clone(),
                        invoice_number: open_invoice.invoice.invoice_number.clone(),
                        reminder_type: None,
                        status: ResultStatus::Error,
                        reason: Some("run deadline exceeded before processing".to_string()),
                    });
                }
            }
        }

        let summary = RunSummary::tally(&results, invoices_scanned);
        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "reminder dispatch run finished"
        );
        Ok(RunReport { summary, results })
    }
}

/// Evaluates and delivers every due reminder for one invoice. Never fails the
/// run: storage and delivery problems become error results.
async fn process_invoice<T, R, N>(
    open: &OpenInvoice,
    reminders: &R,
    notifier: &Notifier<T, R, N>,
    now: DateTime<Utc>,
) -> Vec<ReminderResult>
where
    T: EmailTransport,
    R: ReminderStore,
    N: NotificationSink,
{
    let invoice = &open.invoice;
    let result = |reminder_type, status, reason: Option<String>| ReminderResult {
        tenant_id: invoice.tenant_id.clone(),
        invoice_id: invoice.id.clone(),
        invoice_number: invoice.invoice_number.clone(),
        reminder_type,
        status,
        reason,
    };

    let recorded = match reminders.recorded_types(&invoice.id) {
        Ok(recorded) => recorded,
        Err(err) => {
            error!(invoice = %invoice.id, error = %err, "could not read reminder history");
            return vec![result(None, ResultStatus::Error, Some(err.to_string()))];
        }
    };

    let due = rules::due_reminders(invoice, now, &recorded);
    if due.is_empty() {
        return vec![result(
            None,
            ResultStatus::Skipped,
            Some("no reminder due".to_string()),
        )];
    }

    let mut results = Vec::with_capacity(due.len());
    for reminder_type in due {
        match notifier.send_reminder(open, reminder_type, now).await {
            Ok(NotifyOutcome::Sent { .. }) => {
                results.push(result(Some(reminder_type), ResultStatus::Sent, None));
            }
            Ok(NotifyOutcome::Skipped { reason }) => {
                results.push(result(
                    Some(reminder_type),
                    ResultStatus::Skipped,
                    Some(reason.as_str().to_string()),
                ));
            }
            Err(err) => {
                error!(
                    invoice = %invoice.id,
                    reminder_type = reminder_type.as_str(),
                    error = %err,
                    "reminder delivery failed"
                );
                results.push(result(
                    Some(reminder_type),
                    ResultStatus::Error,
                    Some(err.to_string()),
                ));
            }
        }
    }
    results
}
