//! Risk assessment output types

use serde::{Deserialize, Serialize};

/// Overall health status derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    /// Score >= 85
    Safe,
    /// Score >= 60
    Caution,
    /// Score >= 35
    Unsafe,
    /// Score < 35
    Dangerous,
}

impl OverallStatus {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => OverallStatus::Safe,
            60..=84 => OverallStatus::Caution,
            35..=59 => OverallStatus::Unsafe,
            _ => OverallStatus::Dangerous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatStressRisk {
    Low,
    Moderate,
    High,
}

impl HeatStressRisk {
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, HeatStressRisk::Moderate | HeatStressRisk::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RespiratoryRisk {
    Low,
    #[serde(rename = "Low-Moderate")]
    LowModerate,
    Moderate,
    High,
    Critical,
    /// No AQI was available to score
    Unknown,
}

impl RespiratoryRisk {
    /// Whether the air alone already puts sensitive people at risk
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(
            self,
            RespiratoryRisk::LowModerate
                | RespiratoryRisk::Moderate
                | RespiratoryRisk::High
                | RespiratoryRisk::Critical
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsthmaAttackRisk {
    Low,
    Moderate,
    High,
}

/// Structured output of the environmental risk engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Health score in [0, 100]
    pub health_score: u8,
    pub overall_status: OverallStatus,
    pub heat_stress_risk: HeatStressRisk,
    pub respiratory_risk: RespiratoryRisk,
    pub asthma_attack_risk: AsthmaAttackRisk,
    pub active_alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, OverallStatus::Safe)]
    #[case(85, OverallStatus::Safe)]
    #[case(84, OverallStatus::Caution)]
    #[case(60, OverallStatus::Caution)]
    #[case(59, OverallStatus::Unsafe)]
    #[case(35, OverallStatus::Unsafe)]
    #[case(34, OverallStatus::Dangerous)]
    #[case(0, OverallStatus::Dangerous)]
    fn test_status_bands(#[case] score: u8, #[case] expected: OverallStatus) {
        assert_eq!(OverallStatus::from_score(score), expected);
    }

    #[test]
    fn test_respiratory_labels() {
        assert_eq!(
            serde_json::to_string(&RespiratoryRisk::LowModerate).unwrap(),
            "\"Low-Moderate\""
        );
        assert_eq!(
            serde_json::to_string(&RespiratoryRisk::Unknown).unwrap(),
            "\"Unknown\""
        );
    }
}
