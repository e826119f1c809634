use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{RawShot, Shotmap, Venue};
use crate::error::PipelineError;

/// Added to xGOT so zero-xGOT shots still draw a visible marker.
pub const SIZE_OFFSET: f64 = 0.05;

const MINUTE_KEYS: [&str; 2] = ["min", "minute"];
// Raw keys that never land in `extra`: the parsed columns plus the tag and
// derived columns, which always take the computed value.
const RESERVED_KEYS: [&str; 12] = [
    "min",
    "minute",
    "xg",
    "xgot",
    "player",
    "type",
    "situation",
    "outcome",
    "team",
    "venue",
    "size",
    "efficiency_rate",
];

/// One shot, flattened and tagged with its team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotRow {
    pub team: String,
    pub venue: Venue,
    pub minute: f64,
    pub xg: f64,
    pub xgot: f64,
    pub player: String,
    #[serde(rename = "type")]
    pub shot_type: String,
    pub situation: String,
    pub outcome: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub size: f64,
    pub efficiency_rate: f64,
}

impl ShotRow {
    pub fn xg_category(&self) -> &'static str {
        xg_category(self.xg)
    }
}

pub fn xg_category(xg: f64) -> &'static str {
    if xg >= 0.7 {
        "High"
    } else if xg >= 0.3 {
        "Medium"
    } else {
        "Low"
    }
}

/// Flattens both sides into one table: home shots first, each side in its
/// stored order. Gaps are filled with zero, then `size` and
/// `efficiency_rate` are derived.
pub fn normalize_shots(
    shotmap: &Shotmap,
    home: &str,
    away: &str,
) -> Result<Vec<ShotRow>, PipelineError> {
    let extra_keys = extra_key_order(shotmap);
    let mut rows = Vec::with_capacity(shotmap.home.len() + shotmap.away.len());
    for (venue, team, shots) in [
        (Venue::Home, home, &shotmap.home),
        (Venue::Away, away, &shotmap.away),
    ] {
        for (idx, shot) in shots.iter().enumerate() {
            let row = normalize_shot(shot, venue, team, &extra_keys)
                .map_err(|reason| PipelineError::shape(format!("{venue} shot {idx}: {reason}")))?;
            rows.push(row);
        }
    }
    Ok(rows)
}

fn normalize_shot(
    shot: &RawShot,
    venue: Venue,
    team: &str,
    extra_keys: &[String],
) -> Result<ShotRow, String> {
    let minute = match MINUTE_KEYS.iter().find_map(|key| shot.get(*key)) {
        Some(value) => number_or_zero(value).ok_or_else(|| format!("min is not numeric: {value}"))?,
        None => 0.0,
    };
    let xg = numeric_field(shot, "xg")?;
    let xgot = numeric_field(shot, "xgot")?;

    let mut extra = Map::new();
    for key in extra_keys {
        let value = match shot.get(key) {
            None | Some(Value::Null) => Value::from(0),
            Some(value) => value.clone(),
        };
        extra.insert(key.clone(), value);
    }

    Ok(ShotRow {
        team: team.to_string(),
        venue,
        minute,
        xg,
        xgot,
        player: text_field(shot, "player"),
        shot_type: text_field(shot, "type"),
        situation: text_field(shot, "situation"),
        outcome: text_field(shot, "outcome"),
        extra,
        size: xgot + SIZE_OFFSET,
        efficiency_rate: (xg + xgot) / 2.0,
    })
}

fn numeric_field(shot: &RawShot, key: &str) -> Result<f64, String> {
    match shot.get(key) {
        None => Ok(0.0),
        Some(value) => number_or_zero(value).ok_or_else(|| format!("{key} is not numeric: {value}")),
    }
}

fn number_or_zero(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

// Categorical gaps take the same zero fill as numeric ones.
fn text_field(shot: &RawShot, key: &str) -> String {
    match shot.get(key) {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn extra_key_order(shotmap: &Shotmap) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for shot in shotmap.home.iter().chain(shotmap.away.iter()) {
        for key in shot.keys() {
            if RESERVED_KEYS.contains(&key.as_str()) || keys.iter().any(|k| k == key) {
                continue;
            }
            keys.push(key.clone());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shot(value: Value) -> RawShot {
        match value {
            Value::Object(map) => map,
            _ => panic!("shot fixture must be an object"),
        }
    }

    #[test]
    fn keeps_side_order_and_tags_teams() {
        let shotmap = Shotmap {
            home: vec![
                shot(json!({"min": 3, "xg": 0.1, "xgot": 0.2})),
                shot(json!({"min": 40, "xg": 0.2, "xgot": 0.0})),
            ],
            away: vec![
                shot(json!({"min": 1, "xg": 0.05})),
                shot(json!({"min": 20, "xg": 0.4, "xgot": 0.7})),
                shot(json!({"min": 88, "xg": 0.9, "xgot": 0.9})),
            ],
        };
        let rows = normalize_shots(&shotmap, "Home", "Away").expect("normalize");
        assert_eq!(rows.len(), 5);
        let teams = rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>();
        assert_eq!(teams, vec!["Home", "Home", "Away", "Away", "Away"]);
        let minutes = rows.iter().map(|r| r.minute).collect::<Vec<_>>();
        assert_eq!(minutes, vec![3.0, 40.0, 1.0, 20.0, 88.0]);
        for row in &rows {
            assert_eq!(row.size, row.xgot + SIZE_OFFSET);
            assert_eq!(row.efficiency_rate, (row.xg + row.xgot) / 2.0);
        }
    }

    #[test]
    fn missing_fields_are_zero_filled_and_categoricals_kept() {
        let shotmap = Shotmap {
            home: vec![shot(json!({
                "min": 12,
                "xg": 0.3,
                "player": "A. Stone",
                "situation": "RegularPlay",
                "outcome": "Saved",
                "isOnTarget": true
            }))],
            away: vec![shot(json!({"minute": 50, "xgot": null, "type": "Header"}))],
        };
        let rows = normalize_shots(&shotmap, "Home", "Away").expect("normalize");

        let home = &rows[0];
        assert_eq!(home.xgot, 0.0);
        assert_eq!(home.size, SIZE_OFFSET);
        assert_eq!(home.player, "A. Stone");
        assert_eq!(home.situation, "RegularPlay");
        assert_eq!(home.shot_type, "0");
        assert_eq!(home.extra.get("isOnTarget"), Some(&json!(true)));

        let away = &rows[1];
        assert_eq!(away.minute, 50.0);
        assert_eq!(away.xg, 0.0);
        assert_eq!(away.shot_type, "Header");
        assert_eq!(away.player, "0");
        assert_eq!(away.extra.get("isOnTarget"), Some(&json!(0)));
    }

    #[test]
    fn non_numeric_xg_is_a_shape_error() {
        let shotmap = Shotmap {
            home: Vec::new(),
            away: vec![shot(json!({"min": 5, "xg": "high"}))],
        };
        let err = normalize_shots(&shotmap, "Home", "Away").unwrap_err();
        assert!(matches!(err, PipelineError::DataShape(ref msg) if msg.contains("away shot 0")));
    }

    #[test]
    fn raw_keys_cannot_override_tag_or_derived_columns() {
        let shotmap = Shotmap {
            home: vec![shot(json!({
                "min": 7,
                "xg": 0.2,
                "xgot": 0.4,
                "team": "Impostor",
                "venue": "away",
                "size": 9.0,
                "efficiency_rate": 9.0,
                "shotId": 41
            }))],
            away: Vec::new(),
        };
        let rows = normalize_shots(&shotmap, "Home", "Away").expect("normalize");
        let row = &rows[0];
        assert_eq!(row.extra.keys().collect::<Vec<_>>(), vec!["shotId"]);

        let json = serde_json::to_value(row).expect("serialize");
        assert_eq!(json["team"], "Home");
        assert_eq!(json["venue"], "home");
        assert!((json["size"].as_f64().expect("size") - 0.45).abs() < 1e-12);
        assert!((json["efficiency_rate"].as_f64().expect("rate") - 0.3).abs() < 1e-12);
        assert_eq!(json["shotId"], 41);
    }

    #[test]
    fn xg_categories_use_inclusive_lower_bounds() {
        assert_eq!(xg_category(0.7), "High");
        assert_eq!(xg_category(0.3), "Medium");
        assert_eq!(xg_category(0.29), "Low");
    }
}
