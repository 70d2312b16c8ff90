use super::config::{Band, ScoringConfig};
use super::metrics::GraceMetrics;

/// Linear normalization into 0..1 over the band.
pub(crate) fn normalize(value: f64, band: Band) -> f64 {
    if value <= band.min {
        0.0
    } else if value >= band.max {
        1.0
    } else {
        (value - band.min) / (band.max - band.min)
    }
}

/// Payment history: base on-time score, blended 70/30 with the paid/overdue
/// success ratio once any invoice has been paid, then penalized when the
/// outstanding balance is large relative to monthly revenue.
pub(crate) fn score_payment_history(metrics: &GraceMetrics) -> f64 {
    let mut score = metrics.payment_history_score;

    if metrics.total_paid_invoices > 0 {
        let success_ratio = metrics.total_paid_invoices as f64
            / (metrics.total_paid_invoices + metrics.total_overdue_instances) as f64;
        score = score * 0.7 + success_ratio * 0.3;
    }

    if metrics.monthly_revenue > 0.0 && metrics.outstanding_balance > 0.0 {
        let balance_ratio = metrics.outstanding_balance / metrics.monthly_revenue;
        if balance_ratio > 0.5 {
            score *= 0.8;
        } else if balance_ratio > 0.25 {
            score *= 0.9;
        }
    }

    score.clamp(0.0, 1.0)
}

pub(crate) fn score_revenue(metrics: &GraceMetrics, config: &ScoringConfig) -> f64 {
    let revenue_score = normalize(metrics.monthly_revenue, config.revenue_band);
    let growth_score = ((metrics.revenue_growth_rate + 1.0) / 2.0).clamp(0.0, 1.0);
    let order_value_score = normalize(metrics.average_order_value, config.order_value_band);

    revenue_score * 0.5 + growth_score * 0.3 + order_value_score * 0.2
}

pub(crate) fn score_activity(metrics: &GraceMetrics, config: &ScoringConfig) -> f64 {
    let client_score = normalize(metrics.active_clients as f64, config.active_clients_band);
    let appointment_score = normalize(
        metrics.appointments_last_30d as f64,
        config.appointments_band,
    );
    let order_score = normalize(metrics.store_orders_last_30d as f64, config.store_orders_band);

    client_score * 0.4 + appointment_score * 0.4 + order_score * 0.2
}

/// Account age maxes out at the configured cap; long-standing accounts with a
/// strong payment record get a capped 1.2x trust boost.
pub(crate) fn score_account_age(metrics: &GraceMetrics, config: &ScoringConfig) -> f64 {
    let age_score = (metrics.account_age_days as f64 / config.account_age_cap_days as f64).min(1.0);

    if metrics.account_age_days > 365 && metrics.payment_history_score > 0.8 {
        return (age_score * 1.2).min(1.0);
    }

    age_score
}

pub(crate) fn score_economic(metrics: &GraceMetrics) -> f64 {
    let season_score = metrics.seasonality_factor / 1.5;
    let economic_score = metrics.economic_index / 1.5;

    season_score * 0.5 + economic_score * 0.5
}
