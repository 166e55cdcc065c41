//! Environmental Risk Engine
//!
//! Scores temperature, humidity, AQI and self-reported symptoms into a health
//! score in [0, 100]. Scoring starts at 100 and runs four stages in a fixed
//! order; every stage can only subtract:
//!
//! 1. heat stress from temperature and humidity
//! 2. respiratory risk from the AQI band, plus a humidity interaction penalty
//! 3. symptom severity, which also drives the asthma attack risk
//! 4. aggregation into a clamped score and a status band

use crate::models::{
    AsthmaAttackRisk, HeatStressRisk, OverallStatus, RespiratoryRisk, RiskAssessment, SymptomLog,
};

const BASE_SCORE: i32 = 100;

/// Symptom scores above this are capped
pub const MAX_SYMPTOM_SCORE: u32 = 9;

/// Points deducted per symptom score unit
const SYMPTOM_PENALTY: i32 = 3;

pub const ALERT_HIGH_HEAT: &str = "High Heat Stress";
pub const ALERT_HAZARDOUS_AIR: &str = "Hazardous Air Quality";
pub const ALERT_UNHEALTHY_AIR: &str = "Unhealthy Air Quality";
pub const ALERT_ASTHMA: &str = "Elevated Asthma Attack Risk";

pub const DEFAULT_RECOMMENDATION: &str = "Conditions are optimal. Safe for all activities.";

const REC_HEAT_HIGH: &str = "Hydrate immediately and avoid outdoor physical activity.";
const REC_HEAT_MODERATE: &str = "Drink water regularly and take breaks in cool areas.";
const REC_AQI_UNKNOWN: &str =
    "Air quality data is currently unavailable. Limit time outdoors if you notice breathing discomfort.";
const REC_AQI_CRITICAL: &str =
    "Stay indoors with windows closed and run an air purifier if available. Keep rescue medication within reach.";
const REC_AQI_HIGH: &str = "Avoid outdoor exertion and wear an N95 mask if you must go outside.";
const REC_AQI_MODERATE: &str = "Sensitive groups should limit prolonged outdoor activity.";
const REC_AQI_LOW_MODERATE: &str =
    "Air quality is acceptable, but unusually sensitive people should reduce heavy outdoor exertion.";
const REC_HUMID_POLLUTION: &str =
    "Humid air is trapping pollutants. Ventilate indoor spaces or run a dehumidifier.";
const REC_ASTHMA_HIGH: &str =
    "Use your reliever inhaler as prescribed and seek medical help if breathing does not improve.";
const REC_ASTHMA_MODERATE: &str = "Monitor your symptoms closely and keep your inhaler nearby.";
const REC_MILD_SYMPTOMS: &str = "Mild symptoms logged. Keep track of any changes over the day.";

/// Running totals shared by the scoring stages
#[derive(Debug)]
struct Scorecard {
    score: i32,
    alerts: Vec<String>,
    recommendations: Vec<String>,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            score: BASE_SCORE,
            alerts: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn deduct(&mut self, points: i32) {
        self.score -= points;
    }

    fn alert(&mut self, alert: &str) {
        self.alerts.push(alert.to_string());
    }

    fn recommend(&mut self, recommendation: &str) {
        self.recommendations.push(recommendation.to_string());
    }
}

/// Assess the health risk of the current environment.
///
/// `aqi` is `None` when every AQI source failed; the respiratory stage then
/// reports `Unknown` without deducting. The symptom stage only runs when a log
/// is supplied.
#[must_use]
pub fn assess(
    temperature: f64,
    humidity: f64,
    aqi: Option<i32>,
    symptoms: Option<&SymptomLog>,
) -> RiskAssessment {
    let mut card = Scorecard::new();

    let heat_stress_risk = heat_stage(temperature, humidity, &mut card);
    let respiratory_risk = respiratory_stage(aqi, humidity, &mut card);
    let asthma_attack_risk = match symptoms {
        Some(log) => symptom_stage(log, heat_stress_risk, respiratory_risk, &mut card),
        None => AsthmaAttackRisk::Low,
    };

    let health_score = card.score.clamp(0, 100) as u8;

    if card.recommendations.is_empty() {
        card.recommend(DEFAULT_RECOMMENDATION);
    }

    RiskAssessment {
        health_score,
        overall_status: OverallStatus::from_score(health_score),
        heat_stress_risk,
        respiratory_risk,
        asthma_attack_risk,
        active_alerts: card.alerts,
        recommendations: card.recommendations,
    }
}

/// Weighted symptom severity over both symptom lists, capped at 9
#[must_use]
pub fn symptom_score(log: &SymptomLog) -> u32 {
    log.all_symptoms()
        .map(|item| item.severity.weight())
        .sum::<u32>()
        .min(MAX_SYMPTOM_SCORE)
}

fn heat_stage(temperature: f64, humidity: f64, card: &mut Scorecard) -> HeatStressRisk {
    if temperature > 32.0 && humidity > 70.0 {
        card.deduct(40);
        card.alert(ALERT_HIGH_HEAT);
        card.recommend(REC_HEAT_HIGH);
        HeatStressRisk::High
    } else if temperature > 29.0 && humidity > 60.0 {
        card.deduct(15);
        card.recommend(REC_HEAT_MODERATE);
        HeatStressRisk::Moderate
    } else {
        HeatStressRisk::Low
    }
}

fn respiratory_stage(aqi: Option<i32>, humidity: f64, card: &mut Scorecard) -> RespiratoryRisk {
    let Some(aqi) = aqi else {
        card.recommend(REC_AQI_UNKNOWN);
        return RespiratoryRisk::Unknown;
    };

    let risk = match aqi {
        201.. => {
            card.deduct(45);
            card.alert(ALERT_HAZARDOUS_AIR);
            card.recommend(REC_AQI_CRITICAL);
            RespiratoryRisk::Critical
        }
        151..=200 => {
            card.deduct(35);
            card.alert(ALERT_UNHEALTHY_AIR);
            card.recommend(REC_AQI_HIGH);
            RespiratoryRisk::High
        }
        101..=150 => {
            card.deduct(20);
            card.recommend(REC_AQI_MODERATE);
            RespiratoryRisk::Moderate
        }
        51..=100 => {
            card.deduct(10);
            card.recommend(REC_AQI_LOW_MODERATE);
            RespiratoryRisk::LowModerate
        }
        _ => RespiratoryRisk::Low,
    };

    // Moist air holds particulates near the ground
    if humidity > 75.0 && aqi > 100 {
        card.deduct(5);
        card.recommend(REC_HUMID_POLLUTION);
    }

    risk
}

fn symptom_stage(
    log: &SymptomLog,
    heat: HeatStressRisk,
    respiratory: RespiratoryRisk,
    card: &mut Scorecard,
) -> AsthmaAttackRisk {
    let score = symptom_score(log);
    card.deduct(SYMPTOM_PENALTY * score as i32);

    let environment_elevated = heat.is_elevated() || respiratory.is_elevated();

    if score >= 6 && environment_elevated {
        card.alert(ALERT_ASTHMA);
        card.recommend(REC_ASTHMA_HIGH);
        AsthmaAttackRisk::High
    } else if score >= 3 {
        card.recommend(REC_ASTHMA_MODERATE);
        AsthmaAttackRisk::Moderate
    } else {
        if score > 0 {
            card.recommend(REC_MILD_SYMPTOMS);
        }
        AsthmaAttackRisk::Low
    }
}
