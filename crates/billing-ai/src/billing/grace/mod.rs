//! Grace-period scoring: maps a tenant's historical metrics to a recommended
//! grace window (30/60/90 days), a risk banding, and an audit trail.

pub mod collector;
mod config;
mod evaluation;
mod metrics;
mod scoring;

pub use collector::{InvoiceHistory, MetricsCollector, MetricsError, MetricsSource, TenantProfile};
pub use config::{Band, FactorWeights, ScoringConfig};
pub use evaluation::{FactorScores, GraceEvaluation, GracePeriodDays, RiskLevel};
pub use metrics::{seasonality_for_month, GraceMetrics, SubscriptionTier};

use evaluation::{confidence_for, reasoning_for};

pub const MODEL_VERSION: &str = "v1.0";

/// Pure scorer over a [`GraceMetrics`] snapshot. Total over its input type:
/// no I/O, no side effects, no failure path.
pub struct GraceEngine {
    config: ScoringConfig,
}

impl GraceEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, metrics: &GraceMetrics) -> GraceEvaluation {
        let metrics = metrics.sanitized();

        let scores = FactorScores {
            payment_history: scoring::score_payment_history(&metrics),
            revenue: scoring::score_revenue(&metrics, &self.config),
            activity: scoring::score_activity(&metrics, &self.config),
            account_age: scoring::score_account_age(&metrics, &self.config),
            economic: scoring::score_economic(&metrics),
        };

        let weights = &self.config.weights;
        let weighted = scores.payment_history * weights.payment_history
            + scores.revenue * weights.revenue
            + scores.activity * weights.activity
            + scores.account_age * weights.account_age
            + scores.economic * weights.economic;

        let total_score = (weighted * metrics.tier.multiplier()).min(1.0);

        let recommended_grace_days = GracePeriodDays::from_total_score(total_score);
        let risk_level = RiskLevel::from_total_score(total_score);
        let confidence = confidence_for(&metrics);
        let reasoning = reasoning_for(&scores, total_score, &metrics, recommended_grace_days);

        GraceEvaluation {
            recommended_grace_days,
            scores,
            total_score: round2(total_score),
            confidence: round2(confidence),
            reasoning,
            risk_level,
            model_version: MODEL_VERSION.to_string(),
        }
    }
}

impl Default for GraceEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Convenience entry point using the default scoring configuration.
pub fn calculate_grace_period(metrics: &GraceMetrics) -> GraceEvaluation {
    GraceEngine::default().evaluate(metrics)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
