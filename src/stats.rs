use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::Venue;
use crate::error::PipelineError;

/// Shown as a headline metric pair instead of on the radar.
pub const TOUCH_METRIC: &str = "touch_opp_box_100_passes";

const METRIC_LABELS: [(&str, &str); 4] = [
    ("ball_possession", "Ball Poss"),
    ("passes_opp_half_%", "Passes Opp Half %"),
    ("xg_op_for_100_passes", "xG Open Play Per 100 Passes"),
    ("interceptions_perc", "Interceptions %"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRow {
    pub team: String,
    pub venue: Venue,
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    pub rows: Vec<StatRow>,
    /// Touches in the opponent box per 100 passes, (home, away).
    pub touch_per_100: (f64, f64),
}

impl StatsTable {
    pub fn rows_for(&self, venue: Venue) -> impl Iterator<Item = &StatRow> {
        self.rows.iter().filter(move |row| row.venue == venue)
    }
}

pub fn metric_label(key: &str) -> &str {
    METRIC_LABELS
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

/// Reshapes `metric → [home, away]` into one row per (team, metric). Rows
/// come metric by metric in document order, home before away.
pub fn normalize_stats(
    stats: &Map<String, Value>,
    home: &str,
    away: &str,
) -> Result<StatsTable, PipelineError> {
    let mut rows = Vec::with_capacity(stats.len() * 2);
    let mut touch = None;

    for (key, raw) in stats {
        let (home_value, away_value) = stat_pair(key, raw)?;
        if key == TOUCH_METRIC {
            touch = Some((home_value, away_value));
            continue;
        }
        let label = metric_label(key).to_string();
        rows.push(StatRow {
            team: home.to_string(),
            venue: Venue::Home,
            metric: label.clone(),
            value: home_value,
        });
        rows.push(StatRow {
            team: away.to_string(),
            venue: Venue::Away,
            metric: label,
            value: away_value,
        });
    }

    let touch_per_100 =
        touch.ok_or_else(|| PipelineError::shape(format!("stats has no {TOUCH_METRIC} metric")))?;
    Ok(StatsTable {
        rows,
        touch_per_100,
    })
}

fn stat_pair(key: &str, raw: &Value) -> Result<(f64, f64), PipelineError> {
    let values = raw
        .as_array()
        .filter(|values| values.len() == 2)
        .ok_or_else(|| PipelineError::shape(format!("stat {key} is not a [home, away] pair")))?;
    let home = stat_number(key, &values[0])?;
    let away = stat_number(key, &values[1])?;
    Ok((home, away))
}

fn stat_number(key: &str, value: &Value) -> Result<f64, PipelineError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PipelineError::shape(format!("stat {key} value out of range"))),
        Value::Null => Ok(0.0),
        other => Err(PipelineError::shape(format!(
            "stat {key} has a non-numeric value: {other}"
        ))),
    }
}
