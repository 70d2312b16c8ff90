use super::metrics::GraceMetrics;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// The only grace periods the platform offers. Serialized as the plain day
/// count so downstream billing rows can store the number directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GracePeriodDays {
    Thirty,
    Sixty,
    Ninety,
}

impl GracePeriodDays {
    pub fn days(self) -> u32 {
        match self {
            GracePeriodDays::Thirty => 30,
            GracePeriodDays::Sixty => 60,
            GracePeriodDays::Ninety => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            30 => Some(GracePeriodDays::Thirty),
            60 => Some(GracePeriodDays::Sixty),
            90 => Some(GracePeriodDays::Ninety),
            _ => None,
        }
    }

    /// Score-to-days mapping with fixed transition points at 0.4 and 0.7.
    pub fn from_total_score(total_score: f64) -> Self {
        if total_score >= 0.7 {
            GracePeriodDays::Ninety
        } else if total_score >= 0.4 {
            GracePeriodDays::Sixty
        } else {
            GracePeriodDays::Thirty
        }
    }
}

impl Serialize for GracePeriodDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.days())
    }
}

impl<'de> Deserialize<'de> for GracePeriodDays {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = u32::deserialize(deserializer)?;
        GracePeriodDays::from_days(days)
            .ok_or_else(|| de::Error::custom(format!("grace period must be 30, 60, or 90 days, got {days}")))
    }
}

/// Risk banding uses its own cut points (0.35 and 0.6), deliberately distinct
/// from the grace-days thresholds; the two derivations must not be unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_total_score(total_score: f64) -> Self {
        if total_score >= 0.6 {
            RiskLevel::Low
        } else if total_score >= 0.35 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Per-factor sub-scores, each 0..1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub payment_history: f64,
    pub revenue: f64,
    pub activity: f64,
    pub account_age: f64,
    pub economic: f64,
}

/// Output of the grace scorer. `reasoning` is audit prose only and is never
/// parsed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraceEvaluation {
    pub recommended_grace_days: GracePeriodDays,
    pub scores: FactorScores,
    pub total_score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    pub model_version: String,
}

/// Confidence grows with data volume: 0.5 base plus fixed increments for
/// paid-invoice history, account age, and recent activity, capped at 1.0.
pub(crate) fn confidence_for(metrics: &GraceMetrics) -> f64 {
    let mut confidence: f64 = 0.5;

    if metrics.total_paid_invoices > 0 {
        confidence += 0.1;
    }
    if metrics.total_paid_invoices > 5 {
        confidence += 0.1;
    }
    if metrics.account_age_days > 90 {
        confidence += 0.1;
    }
    if metrics.account_age_days > 365 {
        confidence += 0.1;
    }
    if metrics.appointments_last_30d > 0 {
        confidence += 0.05;
    }
    if metrics.active_clients > 0 {
        confidence += 0.05;
    }

    confidence.min(1.0)
}

pub(crate) fn reasoning_for(
    scores: &FactorScores,
    total_score: f64,
    metrics: &GraceMetrics,
    grace: GracePeriodDays,
) -> String {
    let mut parts: Vec<&str> = Vec::new();

    parts.push(if scores.payment_history >= 0.8 {
        "excellent payment history"
    } else if scores.payment_history >= 0.5 {
        "acceptable payment history"
    } else {
        "limited or delinquent payment history"
    });

    parts.push(if scores.revenue >= 0.7 {
        "strong financial health"
    } else if scores.revenue >= 0.4 {
        "moderate revenue"
    } else {
        "developing revenue"
    });

    parts.push(if scores.activity >= 0.6 {
        "high platform activity"
    } else if scores.activity >= 0.3 {
        "regular activity"
    } else {
        "low activity"
    });

    parts.push(if metrics.account_age_days > 365 {
        "established account"
    } else if metrics.account_age_days > 180 {
        "growing relationship"
    } else {
        "recent account"
    });

    let summary = parts.join(", ");
    let conclusion = if total_score >= 0.6 {
        format!("Extended grace period of {} days recommended.", grace.days())
    } else {
        format!("Standard grace period of {} days recommended.", grace.days())
    };

    format!("{summary}. {conclusion}")
}
