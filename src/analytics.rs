use std::collections::BTreeMap;

use chrono::Duration;

use crate::calendar::{self, DateError};
use crate::models::{
    DailyMetricStats, DaySummary, GoalOutcome, HealthEntry, HealthMetricType, TrendPoint,
    WeeklyMetricStats, WeekSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalDirection {
    HigherIsBetter,
    LowerIsBetter,
}

/// Direction table for the closed metric set. Heart rate and weight follow
/// the calories convention: a goal is a ceiling, not a floor.
pub fn goal_direction(metric: HealthMetricType) -> GoalDirection {
    match metric {
        HealthMetricType::Steps | HealthMetricType::Sleep => GoalDirection::HigherIsBetter,
        HealthMetricType::Calories | HealthMetricType::HeartRate | HealthMetricType::Weight => {
            GoalDirection::LowerIsBetter
        }
    }
}

pub fn group_by_day(entries: &[HealthEntry]) -> BTreeMap<String, Vec<&HealthEntry>> {
    let mut days: BTreeMap<String, Vec<&HealthEntry>> = BTreeMap::new();

    for entry in entries {
        days.entry(calendar::normalize_day(entry.timestamp_ms))
            .or_default()
            .push(entry);
    }

    days
}

pub fn daily_summary(entries: &[HealthEntry], date: &str) -> DaySummary {
    let grouped = group_by_day(entries);
    let day_entries = grouped.get(date).map(Vec::as_slice).unwrap_or(&[]);

    let mut running: BTreeMap<HealthMetricType, (f64, f64, f64, usize)> = BTreeMap::new();

    for entry in day_entries {
        let slot = running
            .entry(entry.metric)
            .or_insert((0.0, entry.value, entry.value, 0));
        slot.0 += entry.value;
        slot.1 = slot.1.min(entry.value);
        slot.2 = slot.2.max(entry.value);
        slot.3 += 1;
    }

    let metrics = running
        .into_iter()
        .map(|(metric, (total, min, max, count))| {
            (
                metric,
                DailyMetricStats {
                    total,
                    min,
                    max,
                    average: total / count as f64,
                },
            )
        })
        .collect();

    DaySummary {
        date: date.to_string(),
        metrics,
    }
}

/// Each day is pre-aggregated through `daily_summary`, so a day with many
/// observations contributes one unit to `day_count` and the weekly average
/// stays a per-day average under uncontrolled entry density.
pub fn weekly_summary(entries: &[HealthEntry], week_start: &str) -> Result<WeekSummary, DateError> {
    let start = calendar::parse_day_key(week_start)?;

    struct Accumulator {
        total: f64,
        min: f64,
        max: f64,
        day_count: usize,
    }

    let mut weekly: BTreeMap<HealthMetricType, Accumulator> = BTreeMap::new();

    for offset in 0..7 {
        let date = calendar::day_key(start + Duration::days(offset));
        let daily = daily_summary(entries, &date);

        for (metric, stats) in daily.metrics {
            let slot = weekly.entry(metric).or_insert(Accumulator {
                total: 0.0,
                min: stats.min,
                max: stats.max,
                day_count: 0,
            });
            slot.total += stats.total;
            slot.min = slot.min.min(stats.min);
            slot.max = slot.max.max(stats.max);
            slot.day_count += 1;
        }
    }

    let metrics = weekly
        .into_iter()
        .filter(|(_, acc)| acc.day_count > 0)
        .map(|(metric, acc)| {
            (
                metric,
                WeeklyMetricStats {
                    total: acc.total,
                    min: acc.min,
                    max: acc.max,
                    average: acc.total / acc.day_count as f64,
                    day_count: acc.day_count,
                },
            )
        })
        .collect();

    Ok(WeekSummary {
        week_start: week_start.to_string(),
        week_end: calendar::day_key(start + Duration::days(6)),
        metrics,
    })
}

/// Sparse series: days without data for the metric are skipped.
pub fn weekly_trend(
    entries: &[HealthEntry],
    week_start: &str,
    metric: HealthMetricType,
) -> Result<Vec<TrendPoint>, DateError> {
    let start = calendar::parse_day_key(week_start)?;
    let mut trend = Vec::new();

    for offset in 0..7 {
        let date = calendar::day_key(start + Duration::days(offset));
        let daily = daily_summary(entries, &date);

        if let Some(stats) = daily.metrics.get(&metric) {
            trend.push(TrendPoint {
                date,
                value: stats.average,
            });
        }
    }

    Ok(trend)
}

/// An absent goal is `NoGoal`; a configured goal of zero is still a goal.
pub fn evaluate_goal(
    metric: HealthMetricType,
    observed: f64,
    goal: Option<f64>,
) -> GoalOutcome {
    let Some(target) = goal else {
        return GoalOutcome::NoGoal;
    };

    let hit = match goal_direction(metric) {
        GoalDirection::HigherIsBetter => observed >= target,
        GoalDirection::LowerIsBetter => observed <= target,
    };

    if hit {
        GoalOutcome::Hit
    } else {
        GoalOutcome::Miss
    }
}

/// A week with no observations of the metric counts as a miss and ends the
/// streak. `max_weeks` is a hard cap on weeks examined, not a hint.
pub fn weekly_streak(
    entries: &[HealthEntry],
    metric: HealthMetricType,
    goal: Option<f64>,
    week_start: &str,
    max_weeks: u32,
) -> Result<u32, DateError> {
    let Some(target) = goal else {
        return Ok(0);
    };

    let mut cursor = calendar::parse_day_key(week_start)?;
    let mut count = 0;

    for _ in 0..max_weeks {
        let summary = weekly_summary(entries, &calendar::day_key(cursor))?;
        let observed = summary.metrics.get(&metric).map(|stats| stats.average);

        let outcome = match observed {
            Some(average) => evaluate_goal(metric, average, Some(target)),
            None => GoalOutcome::Miss,
        };

        if outcome != GoalOutcome::Hit {
            break;
        }

        count += 1;
        cursor = cursor - Duration::days(7);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(metric: HealthMetricType, value: f64, date: &str) -> HealthEntry {
        let midnight = calendar::parse_day_key(date)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        HealthEntry {
            id: Uuid::new_v4().to_string(),
            metric,
            value,
            unit: String::new(),
            timestamp_ms: midnight.timestamp_millis(),
        }
    }

    #[test]
    fn groups_entries_by_utc_day_preserving_order() {
        let entries = vec![
            entry(HealthMetricType::Steps, 4000.0, "2026-01-05"),
            entry(HealthMetricType::Sleep, 7.5, "2026-01-05"),
            entry(HealthMetricType::Steps, 6000.0, "2026-01-06"),
        ];

        let grouped = group_by_day(&entries);
        assert_eq!(grouped.len(), 2);
        let monday = &grouped["2026-01-05"];
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].metric, HealthMetricType::Steps);
        assert_eq!(monday[1].metric, HealthMetricType::Sleep);
    }

    #[test]
    fn daily_summary_aggregates_multiple_entries_per_metric() {
        let entries = vec![
            entry(HealthMetricType::Steps, 4000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 6000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 2000.0, "2026-01-05"),
            entry(HealthMetricType::Sleep, 7.5, "2026-01-05"),
        ];

        let summary = daily_summary(&entries, "2026-01-05");
        let steps = &summary.metrics[&HealthMetricType::Steps];
        assert_eq!(steps.total, 12000.0);
        assert_eq!(steps.min, 2000.0);
        assert_eq!(steps.max, 6000.0);
        assert_eq!(steps.average, 4000.0);

        let sleep = &summary.metrics[&HealthMetricType::Sleep];
        assert_eq!(sleep.total, 7.5);
        assert_eq!(sleep.average, 7.5);
    }

    #[test]
    fn daily_summary_omits_absent_metrics() {
        let entries = vec![entry(HealthMetricType::Steps, 4000.0, "2026-01-05")];

        let summary = daily_summary(&entries, "2026-01-06");
        assert!(summary.metrics.is_empty());

        let summary = daily_summary(&entries, "2026-01-05");
        assert_eq!(summary.metrics.len(), 1);
        assert!(!summary.metrics.contains_key(&HealthMetricType::Sleep));
    }

    #[test]
    fn weekly_summary_counts_days_not_entries() {
        let entries = vec![
            entry(HealthMetricType::Steps, 4000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 6000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 8000.0, "2026-01-07"),
        ];

        let summary = weekly_summary(&entries, "2026-01-05").unwrap();
        assert_eq!(summary.week_end, "2026-01-11");

        let steps = &summary.metrics[&HealthMetricType::Steps];
        assert_eq!(steps.total, 18000.0);
        assert_eq!(steps.day_count, 2);
        // Per-day average: (10000 + 8000) / 2, not 18000 / 3.
        assert_eq!(steps.average, 9000.0);
        assert_eq!(steps.min, 4000.0);
        assert_eq!(steps.max, 8000.0);
    }

    #[test]
    fn weekly_summary_ignores_entries_outside_the_week() {
        let entries = vec![
            entry(HealthMetricType::Steps, 4000.0, "2026-01-04"),
            entry(HealthMetricType::Steps, 6000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 9000.0, "2026-01-12"),
        ];

        let summary = weekly_summary(&entries, "2026-01-05").unwrap();
        let steps = &summary.metrics[&HealthMetricType::Steps];
        assert_eq!(steps.total, 6000.0);
        assert_eq!(steps.day_count, 1);
    }

    #[test]
    fn weekly_summary_rejects_bad_week_start() {
        assert_eq!(
            weekly_summary(&[], "2026-02-30").unwrap_err(),
            DateError::InvalidCalendarDate
        );
        assert_eq!(
            weekly_summary(&[], "2026/01/01").unwrap_err(),
            DateError::InvalidFormat
        );
    }

    #[test]
    fn weekly_summary_is_pure() {
        let entries = vec![
            entry(HealthMetricType::Steps, 4000.0, "2026-01-05"),
            entry(HealthMetricType::Sleep, 7.0, "2026-01-06"),
        ];

        let first = weekly_summary(&entries, "2026-01-05").unwrap();
        let second = weekly_summary(&entries, "2026-01-05").unwrap();
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn trend_is_sparse_and_ordered() {
        let entries = vec![
            entry(HealthMetricType::Steps, 5000.0, "2026-01-09"),
            entry(HealthMetricType::Steps, 3000.0, "2026-01-06"),
            entry(HealthMetricType::Steps, 4000.0, "2026-01-06"),
            entry(HealthMetricType::Sleep, 8.0, "2026-01-07"),
        ];

        let trend = weekly_trend(&entries, "2026-01-05", HealthMetricType::Steps).unwrap();
        assert_eq!(
            trend,
            vec![
                TrendPoint {
                    date: "2026-01-06".to_string(),
                    value: 3500.0,
                },
                TrendPoint {
                    date: "2026-01-09".to_string(),
                    value: 5000.0,
                },
            ]
        );
    }

    #[test]
    fn trend_with_one_populated_day_has_one_point() {
        let entries = vec![entry(HealthMetricType::Weight, 72.4, "2026-01-07")];
        let trend = weekly_trend(&entries, "2026-01-05", HealthMetricType::Weight).unwrap();
        assert_eq!(trend.len(), 1);
    }

    #[test]
    fn goal_evaluation_follows_direction_table() {
        assert_eq!(
            evaluate_goal(HealthMetricType::Steps, 8000.0, None),
            GoalOutcome::NoGoal
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::Steps, 10000.0, Some(8000.0)),
            GoalOutcome::Hit
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::Steps, 6000.0, Some(8000.0)),
            GoalOutcome::Miss
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::Calories, 1800.0, Some(2000.0)),
            GoalOutcome::Hit
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::Calories, 2400.0, Some(2000.0)),
            GoalOutcome::Miss
        );
    }

    #[test]
    fn heart_rate_and_weight_goals_are_ceilings() {
        assert_eq!(
            evaluate_goal(HealthMetricType::HeartRate, 58.0, Some(60.0)),
            GoalOutcome::Hit
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::HeartRate, 72.0, Some(60.0)),
            GoalOutcome::Miss
        );
        assert_eq!(
            evaluate_goal(HealthMetricType::Weight, 80.5, Some(80.0)),
            GoalOutcome::Miss
        );
    }

    #[test]
    fn zero_goal_is_still_a_goal() {
        assert_eq!(
            evaluate_goal(HealthMetricType::Steps, 0.0, Some(0.0)),
            GoalOutcome::Hit
        );
    }

    #[test]
    fn streak_counts_consecutive_hit_weeks() {
        let entries = vec![
            // Current week: average 10000.
            entry(HealthMetricType::Steps, 10000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 10000.0, "2026-01-06"),
            // Previous week: average 9000.
            entry(HealthMetricType::Steps, 9000.0, "2025-12-29"),
            entry(HealthMetricType::Steps, 9000.0, "2025-12-30"),
            // Two weeks back: average 8500.
            entry(HealthMetricType::Steps, 8500.0, "2025-12-22"),
        ];

        let streak = weekly_streak(
            &entries,
            HealthMetricType::Steps,
            Some(8000.0),
            "2026-01-05",
            10,
        )
        .unwrap();
        assert_eq!(streak, 3);
    }

    #[test]
    fn streak_stops_on_first_miss() {
        let entries = vec![
            entry(HealthMetricType::Steps, 9000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 6000.0, "2025-12-29"),
        ];

        let streak = weekly_streak(
            &entries,
            HealthMetricType::Steps,
            Some(8000.0),
            "2026-01-05",
            10,
        )
        .unwrap();
        assert_eq!(streak, 1);
    }

    #[test]
    fn streak_stops_on_empty_week() {
        let entries = vec![
            entry(HealthMetricType::Steps, 9000.0, "2026-01-05"),
            // Gap on 2025-12-29; data resumes the week before.
            entry(HealthMetricType::Steps, 9000.0, "2025-12-22"),
        ];

        let streak = weekly_streak(
            &entries,
            HealthMetricType::Steps,
            Some(8000.0),
            "2026-01-05",
            10,
        )
        .unwrap();
        assert_eq!(streak, 1);
    }

    #[test]
    fn streak_is_zero_without_a_goal() {
        let entries = vec![
            entry(HealthMetricType::Steps, 10000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 10000.0, "2025-12-29"),
        ];

        let streak = weekly_streak(
            &entries,
            HealthMetricType::Steps,
            None,
            "2026-01-05",
            10,
        )
        .unwrap();
        assert_eq!(streak, 0);
    }

    #[test]
    fn streak_respects_max_weeks_cap() {
        let entries = vec![
            entry(HealthMetricType::Steps, 10000.0, "2026-01-05"),
            entry(HealthMetricType::Steps, 10000.0, "2025-12-29"),
            entry(HealthMetricType::Steps, 10000.0, "2025-12-22"),
        ];

        let streak = weekly_streak(
            &entries,
            HealthMetricType::Steps,
            Some(8000.0),
            "2026-01-05",
            2,
        )
        .unwrap();
        assert_eq!(streak, 2);
    }

    #[test]
    fn streak_without_goal_skips_date_validation() {
        let streak =
            weekly_streak(&[], HealthMetricType::Steps, None, "not-a-date", 10).unwrap();
        assert_eq!(streak, 0);
    }
}
