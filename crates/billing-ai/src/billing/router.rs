use super::grace::{GraceEngine, GraceEvaluation, MetricsCollector, MetricsError, MetricsSource};
use super::reminders::dispatch::{DispatchRunner, ReminderResult, RunSummary};
use super::reminders::repository::{EmailTransport, InvoiceStore, NotificationSink, ReminderStore};
use crate::billing::TenantId;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Everything the billing endpoints need, wired once at startup.
pub struct BillingService<I, T, R, N, S> {
    pub runner: DispatchRunner<I, T, R, N>,
    pub collector: MetricsCollector<S>,
    pub engine: GraceEngine,
    /// Shared secret for the cron trigger. Unset means the trigger is
    /// disabled and every call is rejected.
    pub cron_secret: Option<String>,
}

/// Router builder exposing the reminder trigger and the grace evaluation
/// endpoint.
pub fn billing_router<I, T, R, N, S>(service: Arc<BillingService<I, T, R, N, S>>) -> Router
where
    I: InvoiceStore + 'static,
    T: EmailTransport + 'static,
    R: ReminderStore + 'static,
    N: NotificationSink + 'static,
    S: MetricsSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/cron/billing/send-reminders",
            post(send_reminders_handler::<I, T, R, N, S>),
        )
        .route(
            "/api/v1/billing/grace/evaluate",
            post(evaluate_grace_handler::<I, T, R, N, S>),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub(crate) struct SendRemindersResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) summary: RunSummary,
    pub(crate) results: Vec<ReminderResult>,
}

pub(crate) async fn send_reminders_handler<I, T, R, N, S>(
    State(service): State<Arc<BillingService<I, T, R, N, S>>>,
    headers: HeaderMap,
) -> Response
where
    I: InvoiceStore + 'static,
    T: EmailTransport + 'static,
    R: ReminderStore + 'static,
    N: NotificationSink + 'static,
    S: MetricsSource + 'static,
{
    if !bearer_authorized(&headers, service.cron_secret.as_deref()) {
        warn!("cron trigger rejected: missing or invalid bearer token");
        let payload = json!({ "error": "unauthorized" });
        return (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response();
    }

    match service.runner.run(Utc::now()).await {
        Ok(report) => {
            let summary = report.summary;
            let body = SendRemindersResponse {
                success: true,
                message: format!(
                    "processed {} invoice(s): {} sent, {} skipped, {} error(s)",
                    summary.invoices_scanned, summary.sent, summary.skipped, summary.errors
                ),
                summary,
                results: report.results,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(err) => {
            error!(error = %err, "reminder dispatch run aborted");
            let payload = json!({
                "success": false,
                "error": err.to_string(),
                "results": [],
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateGraceRequest {
    pub(crate) tenant_id: TenantId,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateGraceResponse {
    pub(crate) tenant_id: TenantId,
    pub(crate) evaluation: GraceEvaluation,
}

pub(crate) async fn evaluate_grace_handler<I, T, R, N, S>(
    State(service): State<Arc<BillingService<I, T, R, N, S>>>,
    axum::Json(request): axum::Json<EvaluateGraceRequest>,
) -> Response
where
    I: InvoiceStore + 'static,
    T: EmailTransport + 'static,
    R: ReminderStore + 'static,
    N: NotificationSink + 'static,
    S: MetricsSource + 'static,
{
    match service.collector.collect(&request.tenant_id, Utc::now()) {
        Ok(metrics) => {
            let evaluation = service.engine.evaluate(&metrics);
            let body = EvaluateGraceResponse {
                tenant_id: request.tenant_id,
                evaluation,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(MetricsError::TenantNotFound) => {
            let payload = json!({ "error": "tenant not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => {
            error!(tenant = %request.tenant_id, error = %err, "grace evaluation failed");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Constant-shape bearer check. An unset secret fails closed.
fn bearer_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {secret}"))
        .unwrap_or(false)
}
