use serde::{Deserialize, Serialize};

/// Inclusive-linear normalization band: values at or below `min` score 0,
/// at or above `max` score 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Relative importance of each factor. Defaults sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub payment_history: f64,
    pub revenue: f64,
    pub activity: f64,
    pub account_age: f64,
    pub economic: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            payment_history: 0.30,
            revenue: 0.25,
            activity: 0.20,
            account_age: 0.15,
            economic: 0.10,
        }
    }
}

/// Scoring model configuration. The healthy-range bands are business
/// assumptions inherited from the platform's pricing team, not invariants;
/// they are exposed here so operators can tune them without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    /// Healthy monthly invoiced revenue, in currency units.
    pub revenue_band: Band,
    /// Healthy average transaction size.
    pub order_value_band: Band,
    /// Unique clients with activity in the trailing 30 days.
    pub active_clients_band: Band,
    pub appointments_band: Band,
    pub store_orders_band: Band,
    /// Account age that earns the full longevity score, in days.
    pub account_age_cap_days: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            revenue_band: Band::new(5_000_000.0, 50_000_000.0),
            order_value_band: Band::new(50_000.0, 500_000.0),
            active_clients_band: Band::new(10.0, 100.0),
            appointments_band: Band::new(20.0, 200.0),
            store_orders_band: Band::new(5.0, 50.0),
            account_age_cap_days: 730,
        }
    }
}
