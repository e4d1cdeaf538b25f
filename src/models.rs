use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum HealthMetricType {
    Steps,
    Sleep,
    Calories,
    HeartRate,
    Weight,
}

impl HealthMetricType {
    pub const ALL: [HealthMetricType; 5] = [
        HealthMetricType::Steps,
        HealthMetricType::Sleep,
        HealthMetricType::Calories,
        HealthMetricType::HeartRate,
        HealthMetricType::Weight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HealthMetricType::Steps => "steps",
            HealthMetricType::Sleep => "sleep",
            HealthMetricType::Calories => "calories",
            HealthMetricType::HeartRate => "heart_rate",
            HealthMetricType::Weight => "weight",
        }
    }

    pub fn parse(token: &str) -> Option<HealthMetricType> {
        HealthMetricType::ALL
            .into_iter()
            .find(|metric| metric.as_str() == token)
    }
}

impl fmt::Display for HealthMetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEntry {
    pub id: String,
    pub metric: HealthMetricType,
    pub value: f64,
    pub unit: String,
    pub timestamp_ms: i64, // epoch ms, UTC
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricStats {
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: String,
    pub metrics: BTreeMap<HealthMetricType, DailyMetricStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetricStats {
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Distinct days within the week with at least one observation of the
    /// metric; the denominator of `average`.
    pub day_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_start: String,
    pub week_end: String, // week_start + 6 days
    pub metrics: BTreeMap<HealthMetricType, WeeklyMetricStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalOutcome {
    NoGoal,
    Hit,
    Miss,
}
