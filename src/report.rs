use std::collections::BTreeMap;
use std::fmt::Write;

use crate::analytics;
use crate::calendar::DateError;
use crate::models::{GoalOutcome, HealthEntry, HealthMetricType};

pub fn build_report(
    entries: &[HealthEntry],
    week_start: &str,
    goals: &BTreeMap<HealthMetricType, f64>,
    max_weeks: u32,
) -> Result<String, DateError> {
    let summary = analytics::weekly_summary(entries, week_start)?;

    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Health Report");
    let _ = writeln!(
        output,
        "Week {} to {}",
        summary.week_start, summary.week_end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Metrics");

    if summary.metrics.is_empty() {
        let _ = writeln!(output, "No observations recorded this week.");
    } else {
        for (metric, stats) in &summary.metrics {
            let _ = writeln!(
                output,
                "- {}: total {:.1}, min {:.1}, max {:.1}, avg {:.1} across {} day(s)",
                metric, stats.total, stats.min, stats.max, stats.average, stats.day_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Goals");

    if goals.is_empty() {
        let _ = writeln!(output, "No goals configured.");
    } else {
        for (&metric, &target) in goals {
            let observed = summary.metrics.get(&metric).map(|stats| stats.average);
            let line = match observed {
                Some(average) => {
                    match analytics::evaluate_goal(metric, average, Some(target)) {
                        GoalOutcome::Hit => {
                            format!("hit (weekly avg {average:.1} vs goal {target:.1})")
                        }
                        GoalOutcome::Miss => {
                            format!("miss (weekly avg {average:.1} vs goal {target:.1})")
                        }
                        GoalOutcome::NoGoal => "no goal".to_string(),
                    }
                }
                None => format!("no data this week (goal {target:.1})"),
            };
            let _ = writeln!(output, "- {metric}: {line}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Streaks");

    if goals.is_empty() {
        let _ = writeln!(output, "No goals, so no streaks to track.");
    } else {
        for (&metric, &target) in goals {
            let streak =
                analytics::weekly_streak(entries, metric, Some(target), week_start, max_weeks)?;
            let _ = writeln!(output, "- {metric}: {streak} consecutive week(s)");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Averages");

    if summary.metrics.is_empty() {
        let _ = writeln!(output, "No observations recorded this week.");
    } else {
        for metric in summary.metrics.keys() {
            let trend = analytics::weekly_trend(entries, week_start, *metric)?;
            let _ = writeln!(output, "### {metric}");
            for point in trend {
                let _ = writeln!(output, "- {}: {:.1}", point.date, point.value);
            }
        }
    }

    Ok(output)
}
