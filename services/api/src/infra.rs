use billing_ai::billing::grace::{
    GraceEngine, InvoiceHistory, MetricsCollector, MetricsError, MetricsSource, SubscriptionTier,
    TenantProfile,
};
use billing_ai::billing::reminders::{
    AdminNotice, BeginError, DeliveryPolicy, DispatchRunner, EmailMessage, EmailTransport,
    InvoiceStore, NotificationSink, Notifier, OpenInvoice, PendingReminder, ReminderRecord,
    ReminderStatus, ReminderStore, ReminderType, SinkError, StoreError, TransportError,
};
use billing_ai::billing::router::BillingService;
use billing_ai::billing::{InvoiceId, ReminderId, TenantId};
use billing_ai::config::AppConfig;
use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryInvoiceStore {
    rows: Mutex<Vec<OpenInvoice>>,
}

impl InMemoryInvoiceStore {
    pub(crate) fn seeded(rows: Vec<OpenInvoice>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn open_invoices(&self) -> Result<Vec<OpenInvoice>, StoreError> {
        let mut rows = self.rows.lock().expect("invoice mutex poisoned").clone();
        rows.sort_by_key(|open| open.invoice.due_date);
        Ok(rows)
    }
}

/// Reminder rows keyed on `(invoice_id, reminder_type)`. The map entry is the
/// dedup gate: `begin` refuses the key if any row already holds it.
#[derive(Default)]
pub(crate) struct InMemoryReminderStore {
    rows: Mutex<HashMap<(InvoiceId, ReminderType), ReminderRecord>>,
    next_id: AtomicU64,
}

impl InMemoryReminderStore {
    fn update(
        &self,
        id: &ReminderId,
        apply: impl FnOnce(&mut ReminderRecord),
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("reminder mutex poisoned");
        let row = rows
            .values_mut()
            .find(|row| &row.id == id)
            .ok_or(StoreError::NotFound)?;
        apply(row);
        Ok(())
    }
}

impl ReminderStore for InMemoryReminderStore {
    fn recorded_types(&self, invoice: &InvoiceId) -> Result<BTreeSet<ReminderType>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("reminder mutex poisoned")
            .keys()
            .filter(|(id, _)| id == invoice)
            .map(|(_, reminder_type)| *reminder_type)
            .collect())
    }

    fn begin(&self, pending: PendingReminder) -> Result<ReminderId, BeginError> {
        let mut rows = self.rows.lock().expect("reminder mutex poisoned");
        let key = (pending.invoice_id.clone(), pending.reminder_type);
        if rows.contains_key(&key) {
            return Err(BeginError::Duplicate);
        }
        let id = ReminderId(format!(
            "rem-{:06}",
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        ));
        rows.insert(
            key,
            ReminderRecord {
                id: id.clone(),
                tenant_id: pending.tenant_id,
                invoice_id: pending.invoice_id,
                reminder_type: pending.reminder_type,
                status: ReminderStatus::Pending,
                subject: pending.subject,
                scheduled_for: pending.scheduled_for,
                sent_at: None,
                error_message: None,
            },
        );
        Ok(id)
    }

    fn mark_sent(&self, id: &ReminderId, sent_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update(id, |row| {
            row.status = ReminderStatus::Sent;
            row.sent_at = Some(sent_at);
        })
    }

    fn mark_failed(&self, id: &ReminderId, error: &str) -> Result<(), StoreError> {
        self.update(id, |row| {
            row.status = ReminderStatus::Failed;
            row.error_message = Some(error.to_string());
        })
    }

    fn mark_skipped(&self, id: &ReminderId, reason: &str) -> Result<(), StoreError> {
        self.update(id, |row| {
            row.status = ReminderStatus::Skipped;
            row.error_message = Some(reason.to_string());
        })
    }

    fn history(&self, invoice: &InvoiceId) -> Result<Vec<ReminderRecord>, StoreError> {
        let mut rows: Vec<ReminderRecord> = self
            .rows
            .lock()
            .expect("reminder mutex poisoned")
            .values()
            .filter(|row| &row.invoice_id == invoice)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.reminder_type);
        Ok(rows)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryNotificationSink {
    events: Mutex<Vec<AdminNotice>>,
}

impl InMemoryNotificationSink {
    pub(crate) fn events(&self) -> Vec<AdminNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn publish(&self, notice: AdminNotice) -> Result<(), SinkError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Stand-in transport until an SMTP relay is wired in. Logs the envelope and
/// reports success.
#[derive(Default)]
pub(crate) struct LogOnlyEmailTransport;

#[async_trait::async_trait]
impl EmailTransport for LogOnlyEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        info!(to = %message.to, subject = %message.subject, "email delivered (log-only transport)");
        Ok(())
    }
}

/// Canned per-tenant figures backing the grace endpoint until the platform
/// datastore is connected.
pub(crate) struct InMemoryMetricsSource {
    anchored_at: DateTime<Utc>,
    tenants: HashMap<TenantId, DemoTenant>,
}

pub(crate) struct DemoTenant {
    pub(crate) profile: TenantProfile,
    pub(crate) recent_totals: Vec<f64>,
    pub(crate) previous_totals: Vec<f64>,
    pub(crate) active_clients: u32,
    pub(crate) appointments: u32,
    pub(crate) store_orders: u32,
    pub(crate) history: InvoiceHistory,
    pub(crate) outstanding: f64,
}

impl InMemoryMetricsSource {
    pub(crate) fn with_demo_tenants(now: DateTime<Utc>) -> Self {
        let mut tenants = HashMap::new();
        tenants.insert(
            TenantId("clinic-sanroque".to_string()),
            DemoTenant {
                profile: TenantProfile {
                    tier: SubscriptionTier::Professional,
                    signed_up_at: now - chrono::Duration::days(820),
                },
                recent_totals: vec![9_500_000.0, 11_000_000.0, 8_200_000.0],
                previous_totals: vec![10_000_000.0, 9_100_000.0],
                active_clients: 64,
                appointments: 132,
                store_orders: 21,
                history: InvoiceHistory {
                    total_paid: 24,
                    overdue_instances: 1,
                },
                outstanding: 1_200_000.0,
            },
        );
        tenants.insert(
            TenantId("clinic-nueva".to_string()),
            DemoTenant {
                profile: TenantProfile {
                    tier: SubscriptionTier::Basic,
                    signed_up_at: now - chrono::Duration::days(40),
                },
                recent_totals: vec![1_800_000.0],
                previous_totals: Vec::new(),
                active_clients: 7,
                appointments: 14,
                store_orders: 2,
                history: InvoiceHistory {
                    total_paid: 1,
                    overdue_instances: 0,
                },
                outstanding: 600_000.0,
            },
        );
        Self {
            anchored_at: now,
            tenants,
        }
    }

    fn tenant(&self, tenant: &TenantId) -> Result<&DemoTenant, MetricsError> {
        self.tenants.get(tenant).ok_or(MetricsError::TenantNotFound)
    }
}

impl MetricsSource for InMemoryMetricsSource {
    fn tenant_profile(&self, tenant: &TenantId) -> Result<TenantProfile, MetricsError> {
        Ok(self.tenant(tenant)?.profile.clone())
    }

    fn paid_invoice_totals(
        &self,
        tenant: &TenantId,
        _from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<f64>, MetricsError> {
        let demo = self.tenant(tenant)?;
        // The collector's first window ends near the anchor, the second one
        // 30 days earlier.
        if (self.anchored_at - to).num_days().abs() <= 1 {
            Ok(demo.recent_totals.clone())
        } else {
            Ok(demo.previous_totals.clone())
        }
    }

    fn active_client_count(
        &self,
        tenant: &TenantId,
        _since: DateTime<Utc>,
    ) -> Result<u32, MetricsError> {
        Ok(self.tenant(tenant)?.active_clients)
    }

    fn appointment_count(
        &self,
        tenant: &TenantId,
        _since: DateTime<Utc>,
    ) -> Result<u32, MetricsError> {
        Ok(self.tenant(tenant)?.appointments)
    }

    fn store_order_count(
        &self,
        tenant: &TenantId,
        _since: DateTime<Utc>,
    ) -> Result<u32, MetricsError> {
        Ok(self.tenant(tenant)?.store_orders)
    }

    fn invoice_history(&self, tenant: &TenantId) -> Result<InvoiceHistory, MetricsError> {
        Ok(self.tenant(tenant)?.history)
    }

    fn outstanding_balance(&self, tenant: &TenantId) -> Result<f64, MetricsError> {
        Ok(self.tenant(tenant)?.outstanding)
    }
}

pub(crate) type InMemoryBillingService = BillingService<
    InMemoryInvoiceStore,
    LogOnlyEmailTransport,
    InMemoryReminderStore,
    InMemoryNotificationSink,
    InMemoryMetricsSource,
>;

pub(crate) struct BillingWiring {
    pub(crate) service: Arc<InMemoryBillingService>,
    pub(crate) reminders: Arc<InMemoryReminderStore>,
    pub(crate) notices: Arc<InMemoryNotificationSink>,
}

/// Wires the dispatch runner, collector, and scorer over the in-memory
/// adapters using the delivery knobs from config.
pub(crate) fn build_billing_service(
    config: &AppConfig,
    invoices: Vec<OpenInvoice>,
) -> BillingWiring {
    let invoice_store = Arc::new(InMemoryInvoiceStore::seeded(invoices));
    let reminders = Arc::new(InMemoryReminderStore::default());
    let notices = Arc::new(InMemoryNotificationSink::default());
    let notifier = Arc::new(Notifier::new(
        Arc::new(LogOnlyEmailTransport),
        Arc::clone(&reminders),
        Arc::clone(&notices),
        DeliveryPolicy {
            send_timeout: config.dispatch.send_timeout,
            max_attempts: config.dispatch.max_send_attempts,
            retry_backoff: config.dispatch.retry_backoff,
        },
    ));
    let runner = DispatchRunner::new(
        invoice_store,
        Arc::clone(&reminders),
        notifier,
        config.dispatch.max_concurrency,
        config.dispatch.run_deadline,
    );
    let collector = MetricsCollector::new(Arc::new(InMemoryMetricsSource::with_demo_tenants(
        Utc::now(),
    )));
    let service = Arc::new(BillingService {
        runner,
        collector,
        engine: GraceEngine::default(),
        cron_secret: config.dispatch.cron_secret.clone(),
    });
    BillingWiring {
        service,
        reminders,
        notices,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
