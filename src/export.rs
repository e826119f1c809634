use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::pipeline::MatchView;

pub struct ExportReport {
    pub dir: PathBuf,
    pub charts: usize,
    pub workbook: PathBuf,
    pub shot_rows: usize,
    pub stat_rows: usize,
}

/// Writes every chart spec as JSON plus a workbook with the shot and stat
/// tables into a fresh `<base>/<home>_vs_<away>_<timestamp>/` directory.
pub fn export_view(base: &Path, view: &MatchView) -> Result<ExportReport> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dir = base.join(format!(
        "{}_vs_{}_{stamp}",
        slug(&view.header.home),
        slug(&view.header.away)
    ));
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let charts = view.charts.all();
    for chart in charts {
        write_json(&dir.join(format!("{}.json", chart.id.file_stem())), chart)?;
    }
    write_json(&dir.join("header.json"), &view.header)?;

    let workbook = dir.join("tables.xlsx");
    write_tables(&workbook, view)?;

    tracing::info!(dir = %dir.display(), "exported match view");
    Ok(ExportReport {
        dir,
        charts: charts.len(),
        workbook,
        shot_rows: view.shots.len(),
        stat_rows: view.stats.rows.len(),
    })
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize export json")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn write_tables(path: &Path, view: &MatchView) -> Result<()> {
    let mut shot_rows = vec![
        [
            "Team",
            "Minute",
            "xG",
            "xGOT",
            "Player",
            "Type",
            "Situation",
            "Outcome",
            "Size",
            "Efficiency Rate",
            "xG Category",
        ]
        .iter()
        .map(|h| Cell::Text(h.to_string()))
        .collect::<Vec<_>>(),
    ];
    for shot in &view.shots {
        shot_rows.push(vec![
            Cell::Text(shot.team.clone()),
            Cell::Number(shot.minute),
            Cell::Number(shot.xg),
            Cell::Number(shot.xgot),
            Cell::Text(shot.player.clone()),
            Cell::Text(shot.shot_type.clone()),
            Cell::Text(shot.situation.clone()),
            Cell::Text(shot.outcome.clone()),
            Cell::Number(shot.size),
            Cell::Number(shot.efficiency_rate),
            Cell::Text(shot.xg_category().to_string()),
        ]);
    }

    let mut stat_rows = vec![vec![
        Cell::Text("Team".to_string()),
        Cell::Text("Metric".to_string()),
        Cell::Text("Value".to_string()),
    ]];
    for row in &view.stats.rows {
        stat_rows.push(vec![
            Cell::Text(row.team.clone()),
            Cell::Text(row.metric.clone()),
            Cell::Number(row.value),
        ]);
    }
    let (touch_home, touch_away) = view.touch_per_100();
    let touch_rows = vec![
        vec![
            Cell::Text("Team".to_string()),
            Cell::Text("Touches Opp Box per 100 Passes".to_string()),
        ],
        vec![Cell::Text(view.header.home.clone()), Cell::Number(touch_home)],
        vec![Cell::Text(view.header.away.clone()), Cell::Number(touch_away)],
    ];

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Shots")?;
        write_rows(sheet, &shot_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Stats")?;
        write_rows(sheet, &stat_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Touches")?;
        write_rows(sheet, &touch_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

enum Cell {
    Text(String),
    Number(f64),
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match cell {
                Cell::Text(value) => worksheet.write_string(r, c, value),
                Cell::Number(value) => worksheet.write_number(r, c, *value),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
