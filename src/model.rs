//! Measurement data model
//!
//! A measurement record is one logged predictive-scale shot: the predicted
//! and actual weights, the pump-zero config value at the time, and the
//! firmware build it was taken on. Records are soft-deleted only — dropping
//! a record sets `exclude_from_calculations` and nothing ever unsets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored calibration measurement, newest-first ordering by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Opaque store key, used for updates (distinct from the sequence id)
    pub record_id: String,
    /// Sequence identifier, unique per user scope, assigned by the store
    pub id: u64,
    /// Submitting user tag
    pub user: String,
    /// Predicted shot weight in grams (clamped away from zero upstream)
    pub predicted: f64,
    /// Actual shot weight in grams, strictly positive at creation
    pub actual: f64,
    /// Pump-zero config value the shot was pulled with
    pub pump_zero: f64,
    /// 6-char alphanumeric build tag
    pub build: String,
    /// Creation timestamp, descending ordering key
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag; set-only
    pub exclude_from_calculations: bool,
}

impl MeasurementRecord {
    /// Derive the regression sample for this record.
    pub fn sample(&self) -> Sample {
        Sample {
            delta: self.predicted - self.actual,
            pump_zero: self.pump_zero,
        }
    }
}

/// Creation payload; the store assigns id and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord {
    pub user: String,
    pub predicted: f64,
    pub actual: f64,
    pub pump_zero: f64,
    pub build: String,
}

/// Ephemeral `(delta, pump_zero)` pair derived from one eligible record.
///
/// `delta = predicted - actual`; recomputed per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub delta: f64,
    pub pump_zero: f64,
}

/// Confidence rating for a fitted correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// Fewer than four samples, heuristic correction only
    NeedData,
    Poor,
    Fair,
    Good,
    VeryGood,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::NeedData => write!(f, "need-data"),
            Quality::Poor => write!(f, "poor"),
            Quality::Fair => write!(f, "fair"),
            Quality::Good => write!(f, "good"),
            Quality::VeryGood => write!(f, "very-good"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(predicted: f64, actual: f64, pump_zero: f64) -> MeasurementRecord {
        MeasurementRecord {
            record_id: "recAAA".to_string(),
            id: 1,
            user: "tester#0001".to_string(),
            predicted,
            actual,
            pump_zero,
            build: "abc123".to_string(),
            created_at: Utc::now(),
            exclude_from_calculations: false,
        }
    }

    #[test]
    fn test_sample_derivation() {
        let s = record(36.5, 35.0, 0.15).sample();
        assert!((s.delta - 1.5).abs() < 1e-12);
        assert!((s.pump_zero - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(Quality::NeedData.to_string(), "need-data");
        assert_eq!(Quality::VeryGood.to_string(), "very-good");
        assert_eq!(Quality::Fair.to_string(), "fair");
    }
}
