//! Declarative chart specifications for the fixed dashboard chart set.
//!
//! Specs are plain data in a Plotly-style JSON shape: trace type, data
//! columns, marker colours and layout overrides. Nothing here draws; the
//! terminal shell and the JSON export both read the same values.

use serde::Serialize;
use serde_json::Value;

use crate::document::Venue;
use crate::shots::ShotRow;
use crate::stats::StatsTable;

pub const DEFAULT_HOME_COLOR: &str = "#27e265";
pub const DEFAULT_AWAY_COLOR: &str = "#d49115";

pub const MINUTE_TICKS: [f64; 11] = [0.0, 10.0, 20.0, 30.0, 40.0, 45.0, 50.0, 60.0, 70.0, 80.0, 90.0];
pub const SHOT_HOVER_FIELDS: [&str; 5] = ["xgot", "player", "type", "situation", "outcome"];

const UNIT_RANGE: [f64; 2] = [0.0, 1.0];
const VENUES: [Venue; 2] = [Venue::Home, Venue::Away];

/// Team colours, bound to the venue role rather than to category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub home: String,
    pub away: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            home: DEFAULT_HOME_COLOR.to_string(),
            away: DEFAULT_AWAY_COLOR.to_string(),
        }
    }
}

impl Palette {
    pub fn color_for(&self, venue: Venue) -> &str {
        match venue {
            Venue::Home => &self.home,
            Venue::Away => &self.away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    ShotMap,
    SituationBars,
    StatsRadar,
    EfficiencyBox,
}

impl ChartId {
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartId::ShotMap => "shot_map",
            ChartId::SituationBars => "situation_bars",
            ChartId::StatsRadar => "stats_radar",
            ChartId::EfficiencyBox => "efficiency_box",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
    Scatterpolar,
    Box,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Text(String),
}

impl AxisValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AxisValue::Number(n) => Some(*n),
            AxisValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AxisValue::Text(s) => Some(s),
            AxisValue::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub size: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    #[serde(rename = "legendgroup")]
    pub venue: Venue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub x: Vec<AxisValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub r: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub theta: Vec<String>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customdata: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
}

impl Trace {
    fn new(kind: TraceKind, name: &str, venue: Venue, palette: &Palette) -> Self {
        Self {
            kind,
            name: name.to_string(),
            venue,
            mode: None,
            x: Vec::new(),
            y: Vec::new(),
            r: Vec::new(),
            theta: Vec::new(),
            marker: Marker {
                color: palette.color_for(venue).to_string(),
                size: Vec::new(),
            },
            opacity: None,
            fill: None,
            customdata: Vec::new(),
            hovertemplate: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AxisSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialAxis {
    pub visible: bool,
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarSpec {
    pub radialaxis: RadialAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub showlegend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<AxisSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<AxisSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar: Option<PolarSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
}

impl ChartLayout {
    fn titled(title: &str, showlegend: bool) -> Self {
        Self {
            title: title.to_string(),
            showlegend,
            legend_title: None,
            xaxis: None,
            yaxis: None,
            polar: None,
            barmode: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover_fields: Vec<String>,
    pub traces: Vec<Trace>,
    pub layout: ChartLayout,
}

impl ChartSpec {
    pub fn trace(&self, venue: Venue) -> Option<&Trace> {
        self.traces.iter().find(|trace| trace.venue == venue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub shot_map: ChartSpec,
    pub situation_bars: ChartSpec,
    pub stats_radar: ChartSpec,
    pub efficiency_box: ChartSpec,
}

impl ChartSet {
    pub fn all(&self) -> [&ChartSpec; 4] {
        [
            &self.shot_map,
            &self.situation_bars,
            &self.stats_radar,
            &self.efficiency_box,
        ]
    }
}

pub fn assemble_charts(
    shots: &[ShotRow],
    stats: &StatsTable,
    home: &str,
    away: &str,
    palette: &Palette,
) -> ChartSet {
    ChartSet {
        shot_map: shot_map(shots, home, away, palette),
        situation_bars: situation_bars(shots, home, away, palette),
        stats_radar: stats_radar(stats, home, away, palette),
        efficiency_box: efficiency_box(shots, home, away, palette),
    }
}

fn team_for(venue: Venue, home: &str, away: &str) -> String {
    match venue {
        Venue::Home => home.to_string(),
        Venue::Away => away.to_string(),
    }
}

/// Every team gets a trace even without shots, so colours stay on role.
pub fn shot_map(shots: &[ShotRow], home: &str, away: &str, palette: &Palette) -> ChartSpec {
    let hovertemplate = {
        let mut lines = vec![
            "<b>%{fullData.name}</b>".to_string(),
            "Minutes=%{x}".to_string(),
            "xG=%{y}".to_string(),
        ];
        for (idx, field) in SHOT_HOVER_FIELDS.iter().enumerate() {
            lines.push(format!("{field}=%{{customdata[{idx}]}}"));
        }
        lines.join("<br>")
    };

    let traces = VENUES
        .iter()
        .map(|&venue| {
            let mut trace = Trace::new(TraceKind::Scatter, &team_for(venue, home, away), venue, palette);
            trace.mode = Some("markers");
            trace.hovertemplate = Some(hovertemplate.clone());
            for shot in shots.iter().filter(|s| s.venue == venue) {
                trace.x.push(AxisValue::Number(shot.minute));
                trace.y.push(shot.xg);
                trace.marker.size.push(shot.size);
                trace.customdata.push(vec![
                    Value::from(shot.xgot),
                    Value::from(shot.player.clone()),
                    Value::from(shot.shot_type.clone()),
                    Value::from(shot.situation.clone()),
                    Value::from(shot.outcome.clone()),
                ]);
            }
            trace
        })
        .collect();

    let mut layout = ChartLayout::titled("xG by Minute and its xGOT (Size)", true);
    layout.legend_title = Some("Squads".to_string());
    layout.xaxis = Some(AxisSpec {
        title: Some("Minutes".to_string()),
        range: None,
        tickvals: Some(MINUTE_TICKS.to_vec()),
    });
    layout.yaxis = Some(AxisSpec {
        title: Some("xG".to_string()),
        range: Some(UNIT_RANGE),
        tickvals: None,
    });

    ChartSpec {
        id: ChartId::ShotMap,
        hover_fields: SHOT_HOVER_FIELDS.iter().map(|f| f.to_string()).collect(),
        traces,
        layout,
    }
}

pub fn situation_bars(shots: &[ShotRow], home: &str, away: &str, palette: &Palette) -> ChartSpec {
    let traces = VENUES
        .iter()
        .map(|&venue| {
            let mut trace = Trace::new(TraceKind::Bar, &team_for(venue, home, away), venue, palette);
            trace.opacity = Some(0.75);
            for shot in shots.iter().filter(|s| s.venue == venue) {
                trace.x.push(AxisValue::Text(shot.situation.clone()));
                trace.y.push(shot.xg);
            }
            trace
        })
        .collect();

    let mut layout = ChartLayout::titled("xG By Situation", false);
    layout.barmode = Some("group");
    layout.xaxis = Some(AxisSpec {
        title: Some(String::new()),
        ..AxisSpec::default()
    });
    layout.yaxis = Some(AxisSpec {
        title: Some(String::new()),
        ..AxisSpec::default()
    });

    ChartSpec {
        id: ChartId::SituationBars,
        hover_fields: Vec::new(),
        traces,
        layout,
    }
}

pub fn stats_radar(stats: &StatsTable, home: &str, away: &str, palette: &Palette) -> ChartSpec {
    let traces = VENUES
        .iter()
        .map(|&venue| {
            let mut trace =
                Trace::new(TraceKind::Scatterpolar, &team_for(venue, home, away), venue, palette);
            trace.mode = Some("lines");
            trace.fill = Some("toself");
            for row in stats.rows_for(venue) {
                trace.theta.push(row.metric.clone());
                trace.r.push(row.value);
            }
            // Close the loop back onto the first axis.
            if let (Some(theta), Some(r)) = (trace.theta.first().cloned(), trace.r.first().copied()) {
                trace.theta.push(theta);
                trace.r.push(r);
            }
            trace
        })
        .collect();

    let mut layout = ChartLayout::titled("Main Stats of the Match", false);
    layout.polar = Some(PolarSpec {
        radialaxis: RadialAxis {
            visible: true,
            range: UNIT_RANGE,
        },
    });

    ChartSpec {
        id: ChartId::StatsRadar,
        hover_fields: Vec::new(),
        traces,
        layout,
    }
}

pub fn efficiency_box(shots: &[ShotRow], home: &str, away: &str, palette: &Palette) -> ChartSpec {
    let traces = VENUES
        .iter()
        .map(|&venue| {
            let team = team_for(venue, home, away);
            let mut trace = Trace::new(TraceKind::Box, &team, venue, palette);
            for shot in shots.iter().filter(|s| s.venue == venue) {
                trace.x.push(AxisValue::Text(team.clone()));
                trace.y.push(shot.efficiency_rate);
            }
            trace
        })
        .collect();

    let mut layout =
        ChartLayout::titled("Efficiency of the Shots (Mean Between xG and xGOT)", false);
    layout.xaxis = Some(AxisSpec {
        title: Some(String::new()),
        ..AxisSpec::default()
    });
    layout.yaxis = Some(AxisSpec {
        title: Some(String::new()),
        ..AxisSpec::default()
    });

    ChartSpec {
        id: ChartId::EfficiencyBox,
        hover_fields: Vec::new(),
        traces,
        layout,
    }
}

/// xG summed per situation, (situation, home, away), in first-seen order.
pub fn situation_totals(chart: &ChartSpec) -> Vec<(String, f64, f64)> {
    let mut out: Vec<(String, f64, f64)> = Vec::new();
    for trace in &chart.traces {
        for (x, y) in trace.x.iter().zip(trace.y.iter()) {
            let Some(situation) = x.as_text() else {
                continue;
            };
            let idx = match out.iter().position(|(s, _, _)| s == situation) {
                Some(idx) => idx,
                None => {
                    out.push((situation.to_string(), 0.0, 0.0));
                    out.len() - 1
                }
            };
            match trace.venue {
                Venue::Home => out[idx].1 += y,
                Venue::Away => out[idx].2 += y,
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Five-number summary with linear interpolation between ranks.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(BoxSummary {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Minute axis for renderers that space labels evenly: bounds `[0, upper]`
/// on a five-minute grid reaching the latest shot (at least 95), with a label
/// wherever the layout places a tick and blanks elsewhere.
pub fn minute_axis(chart: &ChartSpec) -> (f64, Vec<String>) {
    const GRID: f64 = 5.0;
    let ticks = chart
        .layout
        .xaxis
        .as_ref()
        .and_then(|axis| axis.tickvals.clone())
        .unwrap_or_else(|| MINUTE_TICKS.to_vec());
    let latest = chart
        .traces
        .iter()
        .flat_map(|trace| trace.x.iter())
        .filter_map(AxisValue::as_number)
        .fold(95.0_f64, f64::max);
    let slots = (latest / GRID).ceil() as usize;
    let labels = (0..=slots)
        .map(|slot| {
            let minute = slot as f64 * GRID;
            if ticks.iter().any(|tick| (tick - minute).abs() < 1e-9) {
                format!("{minute}")
            } else {
                String::new()
            }
        })
        .collect();
    (slots as f64 * GRID, labels)
}

/// Grid samples inside a closed polygon, for renderers without a native
/// `fill: "toself"`.
pub fn fill_points(polygon: &[(f64, f64)], step: f64) -> Vec<(f64, f64)> {
    if polygon.len() < 3 || step <= 0.0 {
        return Vec::new();
    }
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in polygon {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let cols = ((max_x - min_x) / step).floor() as usize;
    let rows = ((max_y - min_y) / step).floor() as usize;
    let mut out = Vec::new();
    for col in 0..=cols {
        for row in 0..=rows {
            let point = (min_x + col as f64 * step, min_y + row as f64 * step);
            if polygon_contains(polygon, point) {
                out.push(point);
            }
        }
    }
    out
}

// Even-odd ray casting; a repeated closing vertex adds no crossing.
fn polygon_contains(polygon: &[(f64, f64)], (px, py): (f64, f64)) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
