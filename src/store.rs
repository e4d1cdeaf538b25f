use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{HealthEntry, HealthMetricType};
use crate::validation;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn midnight_utc_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

pub async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    let entries = vec![
        ("seed-001", HealthMetricType::Steps, 9200.0, "steps", 2026, 2, 2),
        ("seed-002", HealthMetricType::Steps, 10400.0, "steps", 2026, 2, 3),
        ("seed-003", HealthMetricType::Sleep, 7.5, "hours", 2026, 2, 2),
        ("seed-004", HealthMetricType::Sleep, 6.8, "hours", 2026, 2, 3),
        ("seed-005", HealthMetricType::Calories, 1850.0, "kcal", 2026, 2, 2),
        ("seed-006", HealthMetricType::HeartRate, 61.0, "bpm", 2026, 2, 3),
        ("seed-007", HealthMetricType::Weight, 72.4, "kg", 2026, 2, 4),
    ];

    for (id, metric, value, unit, year, month, day) in entries {
        let date = NaiveDate::from_ymd_opt(year, month, day).context("invalid seed date")?;
        sqlx::query(
            r#"
            INSERT INTO entries (id, metric, value, unit, timestamp_ms)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(metric.as_str())
        .bind(value)
        .bind(unit)
        .bind(midnight_utc_ms(date))
        .execute(pool)
        .await?;
    }

    let goals = vec![
        (HealthMetricType::Steps, 8000.0),
        (HealthMetricType::Sleep, 7.0),
        (HealthMetricType::Calories, 2200.0),
    ];

    for (metric, target) in goals {
        set_goal(pool, metric, target).await?;
    }

    Ok(())
}

pub async fn insert_entry(pool: &SqlitePool, entry: &HealthEntry) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO entries (id, metric, value, unit, timestamp_ms)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&entry.id)
    .bind(entry.metric.as_str())
    .bind(entry.value)
    .bind(&entry.unit)
    .bind(entry.timestamp_ms)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_entry(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM entries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Partial update; the merged entry is re-screened through the validator
/// before it is written back. Returns false when no entry has the id.
pub async fn update_entry(
    pool: &SqlitePool,
    id: &str,
    value: Option<f64>,
    unit: Option<&str>,
    recorded_on: Option<NaiveDate>,
) -> anyhow::Result<bool> {
    let row = sqlx::query(
        "SELECT id, metric, value, unit, timestamp_ms FROM entries WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(false);
    };

    let token: String = row.get("metric");
    let metric = HealthMetricType::parse(&token)
        .with_context(|| format!("unknown metric '{token}' in store"))?;

    let entry = HealthEntry {
        id: row.get("id"),
        metric,
        value: value.unwrap_or_else(|| row.get("value")),
        unit: unit.map(str::to_string).unwrap_or_else(|| row.get("unit")),
        timestamp_ms: recorded_on
            .map(midnight_utc_ms)
            .unwrap_or_else(|| row.get("timestamp_ms")),
    };

    validation::validate_entry(&entry)?;

    sqlx::query(
        "UPDATE entries SET value = $1, unit = $2, timestamp_ms = $3 WHERE id = $4",
    )
    .bind(entry.value)
    .bind(&entry.unit)
    .bind(entry.timestamp_ms)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(true)
}

/// Drop every stored entry. Goals are left alone.
pub async fn clear_all(pool: &SqlitePool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM entries").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Snapshot of stored entries, oldest first. `since` keeps everything from
/// that day's midnight UTC onward.
pub async fn fetch_entries(
    pool: &SqlitePool,
    metric: Option<HealthMetricType>,
    since: Option<NaiveDate>,
) -> anyhow::Result<Vec<HealthEntry>> {
    let mut query = String::from(
        "SELECT id, metric, value, unit, timestamp_ms FROM entries",
    );

    let mut conditions = Vec::new();

    if metric.is_some() {
        conditions.push(format!("metric = ${}", conditions.len() + 1));
    }
    if since.is_some() {
        conditions.push(format!("timestamp_ms >= ${}", conditions.len() + 1));
    }
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }

    query.push_str(" ORDER BY timestamp_ms ASC");

    let mut rows = sqlx::query(&query);

    if let Some(value) = metric {
        rows = rows.bind(value.as_str());
    }
    if let Some(date) = since {
        rows = rows.bind(midnight_utc_ms(date));
    }

    let records = rows.fetch_all(pool).await?;
    let mut entries = Vec::new();

    for row in records {
        let token: String = row.get("metric");
        let metric = HealthMetricType::parse(&token)
            .with_context(|| format!("unknown metric '{token}' in store"))?;

        entries.push(HealthEntry {
            id: row.get("id"),
            metric,
            value: row.get("value"),
            unit: row.get("unit"),
            timestamp_ms: row.get("timestamp_ms"),
        });
    }

    Ok(entries)
}

pub async fn set_goal(
    pool: &SqlitePool,
    metric: HealthMetricType,
    target: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO goals (metric, target)
        VALUES ($1, $2)
        ON CONFLICT (metric) DO UPDATE SET target = EXCLUDED.target
        "#,
    )
    .bind(metric.as_str())
    .bind(target)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_goal(pool: &SqlitePool, metric: HealthMetricType) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM goals WHERE metric = $1")
        .bind(metric.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_goal(
    pool: &SqlitePool,
    metric: HealthMetricType,
) -> anyhow::Result<Option<f64>> {
    let row = sqlx::query("SELECT target FROM goals WHERE metric = $1")
        .bind(metric.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("target")))
}

pub async fn fetch_goals(
    pool: &SqlitePool,
) -> anyhow::Result<BTreeMap<HealthMetricType, f64>> {
    let rows = sqlx::query("SELECT metric, target FROM goals")
        .fetch_all(pool)
        .await?;

    let mut goals = BTreeMap::new();

    for row in rows {
        let token: String = row.get("metric");
        let metric = HealthMetricType::parse(&token)
            .with_context(|| format!("unknown metric '{token}' in goal store"))?;
        goals.insert(metric, row.get("target"));
    }

    Ok(goals)
}

/// Rows failing entry screening are skipped and counted, not fatal.
pub async fn import_csv(
    pool: &SqlitePool,
    csv_path: &std::path::Path,
) -> anyhow::Result<(usize, usize)> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        metric: HealthMetricType,
        value: f64,
        unit: String,
        recorded_on: NaiveDate,
        id: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let entry = HealthEntry {
            id: row
                .id
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            metric: row.metric,
            value: row.value,
            unit: row.unit,
            timestamp_ms: midnight_utc_ms(row.recorded_on),
        };

        if let Err(reason) = validation::validate_entry(&entry) {
            eprintln!("skipping {} row: {reason}", entry.metric);
            skipped += 1;
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO entries (id, metric, value, unit, timestamp_ms)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&entry.id)
        .bind(entry.metric.as_str())
        .bind(entry.value)
        .bind(&entry.unit)
        .bind(entry.timestamp_ms)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok((inserted, skipped))
}
