//! Qualitative banding of numeric severities and rain probabilities.
//!
//! All intervals are closed on the lower bound and open on the upper one,
//! so boundary values land in the upper band. These functions are pure and
//! total; callers clamp or default their inputs, nothing is rejected here.

/// Presentation tier for a severity band, usable as a CSS class hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityBand {
    pub label: &'static str,
    pub tier: RiskTier,
}

/// Map a severity score to its risk band. Values outside [0, 1] are not
/// rejected, only compared.
pub fn classify_severity(severity: f64) -> SeverityBand {
    if severity < 0.3 {
        SeverityBand {
            label: "Low Risk",
            tier: RiskTier::Low,
        }
    } else if severity < 0.7 {
        SeverityBand {
            label: "Medium Risk",
            tier: RiskTier::Medium,
        }
    } else {
        SeverityBand {
            label: "High Risk",
            tier: RiskTier::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainChance {
    pub category: &'static str,
    /// Severity score equivalent to this category, on the same scale the
    /// backend uses for its assessments.
    pub equivalent_severity: f64,
}

/// Map a rain probability (0-100) to a qualitative category.
pub fn classify_rain_chance(percent: f64) -> RainChance {
    if percent < 30.0 {
        RainChance {
            category: "Low Chance",
            equivalent_severity: 0.0,
        }
    } else if percent < 60.0 {
        RainChance {
            category: "Possible",
            equivalent_severity: 0.3,
        }
    } else if percent < 80.0 {
        RainChance {
            category: "Likely",
            equivalent_severity: 0.6,
        }
    } else {
        RainChance {
            category: "Very Likely",
            equivalent_severity: 0.9,
        }
    }
}
