use chrono::{Duration, Utc};
use thiserror::Error;

use crate::models::{HealthEntry, HealthMetricType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidEntry {
    #[error("value must be a finite number")]
    NotFinite,
    #[error("timestamp must be positive and no more than a day in the future")]
    BadTimestamp,
    #[error("{metric} must be at least {min}")]
    BelowMinimum {
        metric: HealthMetricType,
        min: f64,
    },
    #[error("{metric} must be at most {max}")]
    AboveMaximum {
        metric: HealthMetricType,
        max: f64,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct MetricConstraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn constraints(metric: HealthMetricType) -> MetricConstraint {
    match metric {
        HealthMetricType::Steps => MetricConstraint {
            min: Some(0.0),
            max: None,
        },
        HealthMetricType::Sleep => MetricConstraint {
            min: Some(0.0),
            max: Some(24.0),
        },
        HealthMetricType::Calories => MetricConstraint {
            min: Some(0.0),
            max: None,
        },
        HealthMetricType::HeartRate => MetricConstraint {
            min: Some(30.0),
            max: Some(220.0),
        },
        HealthMetricType::Weight => MetricConstraint {
            min: Some(1.0),
            max: None,
        },
    }
}

fn timestamp_is_plausible(timestamp_ms: i64) -> bool {
    let horizon = Utc::now() + Duration::days(1);
    timestamp_ms > 0 && timestamp_ms < horizon.timestamp_millis()
}

/// Screens an observation before it enters the store; the analytics layer
/// assumes admitted entries already passed.
pub fn validate_entry(entry: &HealthEntry) -> Result<(), InvalidEntry> {
    if !entry.value.is_finite() {
        return Err(InvalidEntry::NotFinite);
    }

    if !timestamp_is_plausible(entry.timestamp_ms) {
        return Err(InvalidEntry::BadTimestamp);
    }

    let bounds = constraints(entry.metric);

    if let Some(min) = bounds.min {
        if entry.value < min {
            return Err(InvalidEntry::BelowMinimum {
                metric: entry.metric,
                min,
            });
        }
    }

    if let Some(max) = bounds.max {
        if entry.value > max {
            return Err(InvalidEntry::AboveMaximum {
                metric: entry.metric,
                max,
            });
        }
    }

    Ok(())
}
