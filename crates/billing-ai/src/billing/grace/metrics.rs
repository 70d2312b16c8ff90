use serde::{Deserialize, Serialize};

/// Subscription tiers, lowest to highest. Higher tiers get modestly more
/// favorable grace treatment via [`SubscriptionTier::multiplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Basic,
    Growth,
    Professional,
    Enterprise,
}

impl SubscriptionTier {
    pub fn multiplier(self) -> f64 {
        match self {
            SubscriptionTier::Free => 1.00,
            SubscriptionTier::Basic => 1.05,
            SubscriptionTier::Growth => 1.10,
            SubscriptionTier::Professional => 1.15,
            SubscriptionTier::Enterprise => 1.20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Growth => "growth",
            SubscriptionTier::Professional => "professional",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }
}

/// Veterinary industry seasonality by calendar month: December-February run
/// hot around the holidays, June-August are the slow season.
pub fn seasonality_for_month(month: u32) -> f64 {
    match month {
        1 => 1.1,
        2 => 1.0,
        3 => 0.95,
        4 => 0.9,
        5 => 0.85,
        6 => 0.8,
        7 => 0.75,
        8 => 0.8,
        9 => 0.9,
        10 => 0.95,
        11 => 1.0,
        12 => 1.2,
        _ => 1.0,
    }
}

/// Immutable snapshot of a tenant's history, consumed by the grace scorer.
/// Recomputed on demand and never persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraceMetrics {
    pub monthly_revenue: f64,
    /// Month-over-month change, -1..+1.
    pub revenue_growth_rate: f64,
    pub average_order_value: f64,
    pub active_clients: u32,
    pub appointments_last_30d: u32,
    pub store_orders_last_30d: u32,
    pub account_age_days: u32,
    /// Share of on-time payments, 0..1.
    pub payment_history_score: f64,
    pub total_paid_invoices: u32,
    pub total_overdue_instances: u32,
    pub outstanding_balance: f64,
    /// Industry seasonality, 0.5..1.5.
    pub seasonality_factor: f64,
    /// External economic indicator, 0.5..1.5.
    pub economic_index: f64,
    pub tier: SubscriptionTier,
}

impl GraceMetrics {
    /// Neutral snapshot for a tenant with no history yet: a 0.5 payment score
    /// stands in for the missing track record, contextual factors sit at par.
    pub fn for_new_account(tier: SubscriptionTier) -> Self {
        Self {
            monthly_revenue: 0.0,
            revenue_growth_rate: 0.0,
            average_order_value: 0.0,
            active_clients: 0,
            appointments_last_30d: 0,
            store_orders_last_30d: 0,
            account_age_days: 0,
            payment_history_score: 0.5,
            total_paid_invoices: 0,
            total_overdue_instances: 0,
            outstanding_balance: 0.0,
            seasonality_factor: 1.0,
            economic_index: 1.0,
            tier,
        }
    }

    /// Copy with every float pulled back into its declared range. NaN falls
    /// back to the field's neutral value so the scorer stays total.
    pub(crate) fn sanitized(&self) -> Self {
        Self {
            monthly_revenue: finite_or(self.monthly_revenue, 0.0).max(0.0),
            revenue_growth_rate: finite_or(self.revenue_growth_rate, 0.0).clamp(-1.0, 1.0),
            average_order_value: finite_or(self.average_order_value, 0.0).max(0.0),
            payment_history_score: finite_or(self.payment_history_score, 0.5).clamp(0.0, 1.0),
            outstanding_balance: finite_or(self.outstanding_balance, 0.0).max(0.0),
            seasonality_factor: finite_or(self.seasonality_factor, 1.0).clamp(0.5, 1.5),
            economic_index: finite_or(self.economic_index, 1.0).clamp(0.5, 1.5),
            ..self.clone()
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else if value == f64::INFINITY {
        f64::MAX
    } else if value == f64::NEG_INFINITY {
        f64::MIN
    } else {
        value
    }
}
