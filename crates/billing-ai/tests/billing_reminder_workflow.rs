//! Integration specifications for the billing reminder dispatch workflow.
//!
//! Scenarios exercise the end-to-end path through the public dispatch runner
//! and HTTP router so ladder evaluation, dedup, delivery isolation, and the
//! cron trigger contract are validated without reaching into private modules.

mod common {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, NaiveDate, Utc};

    use billing_ai::billing::grace::{
        GraceEngine, InvoiceHistory, MetricsCollector, MetricsError, MetricsSource, SubscriptionTier,
        TenantProfile,
    };
    use billing_ai::billing::reminders::{
        AdminNotice, BeginError, BillingContact, DeliveryPolicy, DispatchRunner, EmailMessage,
        EmailTransport, InvoiceRecord, InvoiceStatus, InvoiceStore, NotificationSink, Notifier,
        OpenInvoice, PendingReminder, ReminderRecord, ReminderStatus, ReminderStore, ReminderType,
        SinkError, StoreError, TransportError,
    };
    use billing_ai::billing::router::BillingService;
    use billing_ai::billing::{InvoiceId, ReminderId, TenantId};

    #[derive(Default)]
    pub(super) struct MemoryInvoices {
        pub(super) rows: Mutex<Vec<OpenInvoice>>,
    }

    impl InvoiceStore for MemoryInvoices {
        fn open_invoices(&self) -> Result<Vec<OpenInvoice>, StoreError> {
            let mut rows = self.rows.lock().expect("lock").clone();
            rows.sort_by_key(|open| open.invoice.due_date);
            Ok(rows)
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryReminders {
        rows: Mutex<HashMap<(InvoiceId, ReminderType), ReminderRecord>>,
        next_id: AtomicU32,
    }

    impl MemoryReminders {
        pub(super) fn rows_for(&self, invoice: &InvoiceId) -> Vec<ReminderRecord> {
            let mut rows: Vec<ReminderRecord> = self
                .rows
                .lock()
                .expect("lock")
                .values()
                .filter(|row| &row.invoice_id == invoice)
                .cloned()
                .collect();
            rows.sort_by_key(|row| row.reminder_type);
            rows
        }

        fn update(
            &self,
            id: &ReminderId,
            apply: impl FnOnce(&mut ReminderRecord),
        ) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().expect("lock");
            let row = rows
                .values_mut()
                .find(|row| &row.id == id)
                .ok_or(StoreError::NotFound)?;
            apply(row);
            Ok(())
        }
    }

    impl ReminderStore for MemoryReminders {
        fn recorded_types(
            &self,
            invoice: &InvoiceId,
        ) -> Result<BTreeSet<ReminderType>, StoreError> {
            Ok(self
                .rows
                .lock()
                .expect("lock")
                .keys()
                .filter(|(id, _)| id == invoice)
                .map(|(_, reminder_type)| *reminder_type)
                .collect())
        }

        fn begin(&self, pending: PendingReminder) -> Result<ReminderId, BeginError> {
            let mut rows = self.rows.lock().expect("lock");
            let key = (pending.invoice_id.clone(), pending.reminder_type);
            if rows.contains_key(&key) {
                return Err(BeginError::Duplicate);
            }
            let id = ReminderId(format!("rem-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
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
            Ok(self.rows_for(invoice))
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryAlerts {
        pub(super) notices: Mutex<Vec<AdminNotice>>,
    }

    impl NotificationSink for MemoryAlerts {
        fn publish(&self, notice: AdminNotice) -> Result<(), SinkError> {
            self.notices.lock().expect("lock").push(notice);
            Ok(())
        }
    }

    /// Succeeds for everyone except addresses on the reject list, after an
    /// optional per-send delay.
    #[derive(Default)]
    pub(super) struct SelectiveTransport {
        pub(super) reject: Vec<String>,
        pub(super) delay: Duration,
        pub(super) sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait::async_trait]
    impl EmailTransport for SelectiveTransport {
        async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.reject.iter().any(|addr| addr == &message.to) {
                return Err(TransportError::RecipientRejected(message.to.clone()));
            }
            self.sent.lock().expect("lock").push(message.clone());
            Ok(())
        }
    }

    /// Listing always fails, for the run-level error path.
    pub(super) struct FailingInvoices;

    impl InvoiceStore for FailingInvoices {
        fn open_invoices(&self) -> Result<Vec<OpenInvoice>, StoreError> {
            Err(StoreError::Unavailable("invoice index offline".to_string()))
        }
    }

    pub(super) struct MemorySource {
        pub(super) known_tenant: TenantId,
        pub(super) signed_up_at: DateTime<Utc>,
    }

    impl MetricsSource for MemorySource {
        fn tenant_profile(&self, tenant: &TenantId) -> Result<TenantProfile, MetricsError> {
            if tenant != &self.known_tenant {
                return Err(MetricsError::TenantNotFound);
            }
            Ok(TenantProfile {
                tier: SubscriptionTier::Professional,
                signed_up_at: self.signed_up_at,
            })
        }

        fn paid_invoice_totals(
            &self,
            tenant: &TenantId,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<f64>, MetricsError> {
            if tenant != &self.known_tenant {
                return Err(MetricsError::TenantNotFound);
            }
            Ok(vec![8_000_000.0, 12_000_000.0])
        }

        fn active_client_count(
            &self,
            _tenant: &TenantId,
            _since: DateTime<Utc>,
        ) -> Result<u32, MetricsError> {
            Ok(60)
        }

        fn appointment_count(
            &self,
            _tenant: &TenantId,
            _since: DateTime<Utc>,
        ) -> Result<u32, MetricsError> {
            Ok(120)
        }

        fn store_order_count(
            &self,
            _tenant: &TenantId,
            _since: DateTime<Utc>,
        ) -> Result<u32, MetricsError> {
            Ok(25)
        }

        fn invoice_history(&self, _tenant: &TenantId) -> Result<InvoiceHistory, MetricsError> {
            Ok(InvoiceHistory {
                total_paid: 18,
                overdue_instances: 1,
            })
        }

        fn outstanding_balance(&self, _tenant: &TenantId) -> Result<f64, MetricsError> {
            Ok(1_000_000.0)
        }
    }

    pub(super) fn tenant() -> TenantId {
        TenantId("clinic-sanroque".to_string())
    }

    pub(super) fn open_invoice(
        id: &str,
        due_date: NaiveDate,
        status: InvoiceStatus,
        email: Option<&str>,
    ) -> OpenInvoice {
        OpenInvoice {
            invoice: InvoiceRecord {
                id: InvoiceId(id.to_string()),
                tenant_id: tenant(),
                invoice_number: format!("PLAT-2026-{id}"),
                total: 1_500_000.0,
                status,
                issued_at: None,
                due_date,
                grace_period_days: None,
            },
            contact: BillingContact {
                tenant_name: "Clinica San Roque".to_string(),
                billing_email: email.map(str::to_string),
            },
        }
    }

    pub(super) fn policy() -> DeliveryPolicy {
        DeliveryPolicy {
            send_timeout: Duration::from_millis(500),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(1),
        }
    }

    pub(super) type Service =
        BillingService<MemoryInvoices, SelectiveTransport, MemoryReminders, MemoryAlerts, MemorySource>;

    pub(super) struct Harness {
        pub(super) service: Arc<Service>,
        pub(super) reminders: Arc<MemoryReminders>,
        pub(super) alerts: Arc<MemoryAlerts>,
    }

    /// Wires a dispatch runner over shared stores, so tests can run several
    /// passes against the same reminder history.
    pub(super) fn runner_over(
        invoices: Arc<MemoryInvoices>,
        reminders: Arc<MemoryReminders>,
        alerts: Arc<MemoryAlerts>,
        transport: SelectiveTransport,
        max_concurrency: usize,
        run_deadline: Duration,
    ) -> DispatchRunner<MemoryInvoices, SelectiveTransport, MemoryReminders, MemoryAlerts> {
        let notifier = Arc::new(Notifier::new(
            Arc::new(transport),
            Arc::clone(&reminders),
            alerts,
            policy(),
        ));
        DispatchRunner::new(invoices, reminders, notifier, max_concurrency, run_deadline)
    }

    pub(super) fn harness(
        invoices: Vec<OpenInvoice>,
        transport: SelectiveTransport,
        cron_secret: Option<&str>,
    ) -> Harness {
        let invoice_store = Arc::new(MemoryInvoices {
            rows: Mutex::new(invoices),
        });
        let reminders = Arc::new(MemoryReminders::default());
        let alerts = Arc::new(MemoryAlerts::default());
        let runner = runner_over(
            invoice_store,
            Arc::clone(&reminders),
            Arc::clone(&alerts),
            transport,
            4,
            Duration::from_secs(30),
        );
        let collector = MetricsCollector::new(Arc::new(MemorySource {
            known_tenant: tenant(),
            signed_up_at: Utc::now() - chrono::Duration::days(800),
        }));
        let service = Arc::new(BillingService {
            runner,
            collector,
            engine: GraceEngine::default(),
            cron_secret: cron_secret.map(str::to_string),
        });
        Harness {
            service,
            reminders,
            alerts,
        }
    }

    /// Service whose invoice listing always fails, for the run-level error
    /// surface.
    pub(super) fn failing_service(
        cron_secret: Option<&str>,
    ) -> Arc<BillingService<FailingInvoices, SelectiveTransport, MemoryReminders, MemoryAlerts, MemorySource>>
    {
        let reminders = Arc::new(MemoryReminders::default());
        let notifier = Arc::new(Notifier::new(
            Arc::new(SelectiveTransport::default()),
            Arc::clone(&reminders),
            Arc::new(MemoryAlerts::default()),
            policy(),
        ));
        let runner = DispatchRunner::new(
            Arc::new(FailingInvoices),
            reminders,
            notifier,
            4,
            Duration::from_secs(30),
        );
        let collector = MetricsCollector::new(Arc::new(MemorySource {
            known_tenant: tenant(),
            signed_up_at: Utc::now() - chrono::Duration::days(800),
        }));
        Arc::new(BillingService {
            runner,
            collector,
            engine: GraceEngine::default(),
            cron_secret: cron_secret.map(str::to_string),
        })
    }
}

mod dispatch {
    use super::common::*;
    use billing_ai::billing::reminders::{
        InvoiceStatus, ReminderStatus, ReminderType, ResultStatus, RunError,
    };
    use billing_ai::billing::InvoiceId;
    use chrono::{Duration, Utc};
    use std::sync::{Arc, Mutex};
    use std::time::Duration as WallDuration;

    #[tokio::test]
    async fn run_walks_the_ladder_and_reports_per_invoice() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![
                open_invoice(
                    "000001",
                    today + Duration::days(5),
                    InvoiceStatus::Sent,
                    Some("billing@sanroque.example"),
                ),
                open_invoice(
                    "000002",
                    today + Duration::days(20),
                    InvoiceStatus::Sent,
                    Some("billing@sanroque.example"),
                ),
            ],
            SelectiveTransport::default(),
            Some("s3cret"),
        );

        let report = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("run completes");

        assert_eq!(report.summary.invoices_scanned, 2);
        assert_eq!(report.summary.sent, 1);
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.summary.errors, 0);

        let sent = report
            .results
            .iter()
            .find(|result| result.status == ResultStatus::Sent)
            .expect("one sent result");
        assert_eq!(sent.reminder_type, Some(ReminderType::UpcomingInvoice));

        let skipped = report
            .results
            .iter()
            .find(|result| result.status == ResultStatus::Skipped)
            .expect("one skipped result");
        assert_eq!(skipped.reason.as_deref(), Some("no reminder due"));
    }

    #[tokio::test]
    async fn second_run_sends_nothing_new() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![open_invoice(
                "000003",
                today - Duration::days(8),
                InvoiceStatus::Overdue,
                Some("billing@sanroque.example"),
            )],
            SelectiveTransport::default(),
            Some("s3cret"),
        );

        let first = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("first run");
        assert!(first.summary.sent >= 3, "catches up through the ladder");

        let second = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("second run");
        assert_eq!(second.summary.sent, 0);
        assert_eq!(second.summary.skipped, 1);
        let result = &second.results[0];
        assert_eq!(result.reason.as_deref(), Some("no reminder due"));
    }

    #[tokio::test]
    async fn stale_invoice_records_every_ladder_rung() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![open_invoice(
                "000004",
                today - Duration::days(31),
                InvoiceStatus::Overdue,
                Some("billing@sanroque.example"),
            )],
            SelectiveTransport::default(),
            Some("s3cret"),
        );

        let report = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("run completes");
        assert_eq!(report.summary.sent, 5);

        let rows = harness.reminders.rows_for(&InvoiceId("000004".to_string()));
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.status == ReminderStatus::Sent));

        // Each sent rung also raises an admin notice.
        let notices = harness.alerts.notices.lock().expect("lock");
        assert_eq!(notices.len(), 5);
        assert!(notices
            .iter()
            .any(|notice| notice.reminder_type == ReminderType::OverdueUrgent));
    }

    #[tokio::test]
    async fn delivery_failure_is_isolated_to_its_invoice() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![
                open_invoice(
                    "000005",
                    today + Duration::days(3),
                    InvoiceStatus::Sent,
                    Some("bounce@sanroque.example"),
                ),
                open_invoice(
                    "000006",
                    today + Duration::days(4),
                    InvoiceStatus::Sent,
                    Some("billing@sanroque.example"),
                ),
            ],
            SelectiveTransport {
                reject: vec!["bounce@sanroque.example".to_string()],
                ..SelectiveTransport::default()
            },
            Some("s3cret"),
        );

        let report = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("run completes despite the bounce");

        assert_eq!(report.summary.sent, 1);
        assert_eq!(report.summary.errors, 1);

        let failed_rows = harness.reminders.rows_for(&InvoiceId("000005".to_string()));
        assert_eq!(failed_rows.len(), 1);
        assert_eq!(failed_rows[0].status, ReminderStatus::Failed);
        assert!(failed_rows[0]
            .error_message
            .as_deref()
            .expect("failure recorded")
            .contains("bounce@sanroque.example"));
    }

    #[tokio::test]
    async fn missing_billing_email_leaves_a_skipped_row_per_due_type() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![open_invoice(
                "000007",
                today - Duration::days(31),
                InvoiceStatus::Overdue,
                None,
            )],
            SelectiveTransport::default(),
            Some("s3cret"),
        );

        let report = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("run completes");

        // Every due rung gets its own result line even though none can land.
        assert_eq!(report.summary.skipped, 5);
        assert_eq!(report.summary.sent, 0);

        let rows = harness.reminders.rows_for(&InvoiceId("000007".to_string()));
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.status == ReminderStatus::Skipped));
    }

    #[tokio::test]
    async fn settled_invoices_are_never_scanned() {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![open_invoice(
                "000008",
                today - Duration::days(10),
                InvoiceStatus::Paid,
                Some("billing@sanroque.example"),
            )],
            SelectiveTransport::default(),
            Some("s3cret"),
        );

        let report = harness
            .service
            .runner
            .run(Utc::now())
            .await
            .expect("run completes");
        assert_eq!(report.summary.invoices_scanned, 0);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn deadline_refuses_unstarted_invoices_without_stranding_rows() {
        let today = Utc::now().date_naive();
        let invoices = Arc::new(MemoryInvoices {
            rows: Mutex::new(vec![
                open_invoice(
                    "000010",
                    today + Duration::days(5),
                    InvoiceStatus::Sent,
                    Some("billing@sanroque.example"),
                ),
                open_invoice(
                    "000011",
                    today + Duration::days(6),
                    InvoiceStatus::Sent,
                    Some("billing@sanroque.example"),
                ),
            ]),
        });
        let reminders = Arc::new(MemoryReminders::default());
        let alerts = Arc::new(MemoryAlerts::default());

        // One worker, a transport slower than the deadline: whichever invoice
        // starts first finishes past the deadline, the other never starts.
        let runner = runner_over(
            Arc::clone(&invoices),
            Arc::clone(&reminders),
            Arc::clone(&alerts),
            SelectiveTransport {
                delay: WallDuration::from_millis(150),
                ..SelectiveTransport::default()
            },
            1,
            WallDuration::from_millis(50),
        );
        let report = runner.run(Utc::now()).await.expect("run completes");

        assert_eq!(report.summary.sent, 1);
        assert_eq!(report.summary.errors, 1);
        let refused = report
            .results
            .iter()
            .find(|result| result.status == ResultStatus::Error)
            .expect("one refused invoice");
        assert_eq!(
            refused.reason.as_deref(),
            Some("run deadline exceeded before processing")
        );

        // The in-flight send reached a terminal mark and the refused invoice
        // claimed nothing, so a later run can finish the job.
        let mut recorded = 0;
        for id in ["000010", "000011"] {
            for row in reminders.rows_for(&InvoiceId(id.to_string())) {
                assert_ne!(row.status, ReminderStatus::Pending);
                recorded += 1;
            }
        }
        assert_eq!(recorded, 1);

        let resume = runner_over(
            invoices,
            Arc::clone(&reminders),
            alerts,
            SelectiveTransport::default(),
            4,
            WallDuration::from_secs(30),
        );
        let second = resume.run(Utc::now()).await.expect("resume run");
        assert_eq!(second.summary.sent, 1);
        assert_eq!(second.summary.skipped, 1);
    }

    #[tokio::test]
    async fn invoice_listing_failure_aborts_the_run() {
        let service = failing_service(Some("s3cret"));

        let err = service
            .runner
            .run(Utc::now())
            .await
            .expect_err("listing failure aborts the run");

        assert!(matches!(err, RunError::ListInvoices(_)));
        assert!(err.to_string().contains("invoice index offline"));
    }
}

mod http {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use billing_ai::billing::reminders::InvoiceStatus;
    use billing_ai::billing::router::billing_router;
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    fn seeded_router(cron_secret: Option<&str>) -> axum::Router {
        let today = Utc::now().date_naive();
        let harness = harness(
            vec![open_invoice(
                "000009",
                today + Duration::days(6),
                InvoiceStatus::Sent,
                Some("billing@sanroque.example"),
            )],
            SelectiveTransport::default(),
            cron_secret,
        );
        billing_router(harness.service)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn cron_trigger_rejects_missing_token() {
        let response = seeded_router(Some("s3cret"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cron/billing/send-reminders")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cron_trigger_rejects_wrong_token_and_unset_secret() {
        for (secret, token) in [(Some("s3cret"), "Bearer nope"), (None, "Bearer anything")] {
            let response = seeded_router(secret)
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/cron/billing/send-reminders")
                        .header("authorization", token)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("router dispatch");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn cron_trigger_runs_dispatch_and_reports_a_summary() {
        let response = seeded_router(Some("s3cret"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cron/billing/send-reminders")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["success"], true);
        assert_eq!(payload["summary"]["invoices_scanned"], 1);
        assert_eq!(payload["summary"]["sent"], 1);
        assert_eq!(
            payload["results"][0]["reminder_type"],
            "upcoming_invoice"
        );
    }

    #[tokio::test]
    async fn cron_trigger_maps_a_run_failure_to_500() {
        let response = billing_router(failing_service(Some("s3cret")))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cron/billing/send-reminders")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = json_body(response).await;
        assert_eq!(payload["success"], false);
        assert!(payload["error"]
            .as_str()
            .expect("error message")
            .contains("failed to list open invoices"));
        assert_eq!(payload["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn grace_evaluation_returns_a_recommendation() {
        let response = seeded_router(Some("s3cret"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/grace/evaluate")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "tenant_id": "clinic-sanroque" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["tenant_id"], "clinic-sanroque");
        let evaluation = &payload["evaluation"];
        assert!(evaluation["total_score"].as_f64().is_some());
        assert!(evaluation["reasoning"].as_str().is_some());
        assert_eq!(evaluation["model_version"], "v1.0");
        // Healthy fixture tenant lands in the extended band.
        assert_eq!(evaluation["recommended_grace_days"], 90);
        assert_eq!(evaluation["risk_level"], "low");
    }

    #[tokio::test]
    async fn grace_evaluation_for_unknown_tenant_is_not_found() {
        let response = seeded_router(Some("s3cret"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/billing/grace/evaluate")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "tenant_id": "clinic-unknown" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
