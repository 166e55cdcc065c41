//! Self-reported symptom logs

use serde::{Deserialize, Serialize};

/// Severity of a single reported symptom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Scoring weight of this severity
    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Mild => 1,
            Severity::Moderate => 2,
            Severity::Severe => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomItem {
    pub name: String,
    pub severity: Severity,
}

impl SymptomItem {
    pub fn new<S: Into<String>>(name: S, severity: Severity) -> Self {
        Self {
            name: name.into(),
            severity,
        }
    }
}

/// A symptom diary entry.
///
/// `symptoms` holds the predefined choices, `other_symptoms` the free-text
/// ones; both count the same when scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomLog {
    #[serde(default)]
    pub symptoms: Vec<SymptomItem>,
    #[serde(default)]
    pub other_symptoms: Vec<SymptomItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SymptomLog {
    /// All reported symptoms, predefined first
    pub fn all_symptoms(&self) -> impl Iterator<Item = &SymptomItem> {
        self.symptoms.iter().chain(self.other_symptoms.iter())
    }
}
