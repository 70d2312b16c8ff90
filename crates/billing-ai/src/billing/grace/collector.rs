use super::metrics::{seasonality_for_month, GraceMetrics, SubscriptionTier};
use crate::billing::TenantId;
use chrono::{DateTime, Datelike, Duration, Utc};
use std::sync::Arc;

/// Tenant account facts needed to anchor the snapshot.
#[derive(Debug, Clone)]
pub struct TenantProfile {
    pub tier: SubscriptionTier,
    pub signed_up_at: DateTime<Utc>,
}

/// Platform-invoice payment track record for a tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceHistory {
    pub total_paid: u32,
    /// Times the tenant went overdue, including invoices paid late.
    pub overdue_instances: u32,
}

/// Read contracts against the platform datastore. The collector only ever
/// reads; it never persists the snapshot it builds.
pub trait MetricsSource: Send + Sync {
    fn tenant_profile(&self, tenant: &TenantId) -> Result<TenantProfile, MetricsError>;
    /// Paid client-invoice totals with `from <= paid_at < to`.
    fn paid_invoice_totals(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<f64>, MetricsError>;
    fn active_client_count(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
    ) -> Result<u32, MetricsError>;
    fn appointment_count(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
    ) -> Result<u32, MetricsError>;
    fn store_order_count(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
    ) -> Result<u32, MetricsError>;
    fn invoice_history(&self, tenant: &TenantId) -> Result<InvoiceHistory, MetricsError>;
    fn outstanding_balance(&self, tenant: &TenantId) -> Result<f64, MetricsError>;
    /// External economic indicator, 0.5..1.5. Defaults to par until a feed
    /// is wired in.
    fn economic_index(&self) -> f64 {
        1.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("tenant not found")]
    TenantNotFound,
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),
}

/// Flattens a tenant's history into a [`GraceMetrics`] snapshot.
pub struct MetricsCollector<S> {
    source: Arc<S>,
}

impl<S: MetricsSource> MetricsCollector<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn collect(
        &self,
        tenant: &TenantId,
        now: DateTime<Utc>,
    ) -> Result<GraceMetrics, MetricsError> {
        let profile = self.source.tenant_profile(tenant)?;
        let thirty_days_ago = now - Duration::days(30);
        let sixty_days_ago = now - Duration::days(60);

        let account_age_days = (now - profile.signed_up_at).num_days().max(0) as u32;

        let current = self
            .source
            .paid_invoice_totals(tenant, thirty_days_ago, now)?;
        let monthly_revenue: f64 = current.iter().sum();
        let average_order_value = if current.is_empty() {
            0.0
        } else {
            monthly_revenue / current.len() as f64
        };

        let previous = self
            .source
            .paid_invoice_totals(tenant, sixty_days_ago, thirty_days_ago)?;
        let previous_revenue: f64 = previous.iter().sum();
        let revenue_growth_rate = if previous_revenue > 0.0 {
            (monthly_revenue - previous_revenue) / previous_revenue
        } else {
            0.0
        };

        let active_clients = self.source.active_client_count(tenant, thirty_days_ago)?;
        let appointments_last_30d = self.source.appointment_count(tenant, thirty_days_ago)?;
        let store_orders_last_30d = self.source.store_order_count(tenant, thirty_days_ago)?;

        let history = self.source.invoice_history(tenant)?;
        let payment_history_score = if history.total_paid > 0 {
            ((history.total_paid as f64 - history.overdue_instances as f64)
                / history.total_paid as f64)
                .clamp(0.0, 1.0)
        } else {
            // Neutral until the first platform invoice settles.
            0.5
        };

        let outstanding_balance = self.source.outstanding_balance(tenant)?;

        Ok(GraceMetrics {
            monthly_revenue,
            revenue_growth_rate,
            average_order_value,
            active_clients,
            appointments_last_30d,
            store_orders_last_30d,
            account_age_days,
            payment_history_score,
            total_paid_invoices: history.total_paid,
            total_overdue_instances: history.overdue_instances,
            outstanding_balance,
            seasonality_factor: seasonality_for_month(now.month()),
            economic_index: self.source.economic_index(),
            tier: profile.tier,
        })
    }
}
