use serde::Serialize;

use crate::charts::{ChartSet, Palette, assemble_charts};
use crate::document::{MatchDocument, Venue};
use crate::error::PipelineError;
use crate::lookup::{LookupOutcome, MatchLookup};
use crate::session::Selection;
use crate::shots::{ShotRow, normalize_shots};
use crate::stats::{StatsTable, normalize_stats};

pub const NOT_FOUND_MESSAGE: &str =
    "Maybe This Match Hasn't Occurred Yet or the Teams Don't Belong to the Same National League";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchHeader {
    pub details: String,
    pub scoreline: String,
    pub home: String,
    pub away: String,
    pub home_image: Option<String>,
    pub away_image: Option<String>,
}

impl MatchHeader {
    pub fn from_document(doc: &MatchDocument) -> Self {
        Self {
            details: format!(
                "{} - {} - Season {}",
                doc.general.country, doc.general.league, doc.general.season
            ),
            scoreline: format!("{} x {}", doc.score.home, doc.score.away),
            home: doc.home_name().to_string(),
            away: doc.away_name().to_string(),
            home_image: doc.team(Venue::Home).image.clone(),
            away_image: doc.team(Venue::Away).image.clone(),
        }
    }

    pub fn headline(&self) -> String {
        format!("{} - {} - {}", self.home, self.scoreline, self.away)
    }
}

/// Everything the shell places on screen for one submitted selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    pub header: MatchHeader,
    pub shots: Vec<ShotRow>,
    pub stats: StatsTable,
    pub charts: ChartSet,
}

impl MatchView {
    pub fn touch_per_100(&self) -> (f64, f64) {
        self.stats.touch_per_100
    }
}

/// Shapes a found document into the dashboard view.
pub fn build_view(
    doc: &MatchDocument,
    selection: &Selection,
    palette: &Palette,
) -> Result<MatchView, PipelineError> {
    let home = doc.home_name();
    let away = doc.away_name();

    let stats = doc
        .stats
        .as_ref()
        .ok_or_else(|| PipelineError::shape("match document has no stats"))?;
    // Stat rows carry the selected names; the two only differ if the store
    // matched on something other than exact names.
    let stats = normalize_stats(stats, &selection.home, &selection.away)?;

    let shotmap = doc
        .shotmap
        .as_ref()
        .ok_or_else(|| PipelineError::shape("match document has no shotmap"))?;
    let shots = normalize_shots(shotmap, home, away)?;

    let charts = assemble_charts(&shots, &stats, home, away, palette);
    Ok(MatchView {
        header: MatchHeader::from_document(doc),
        shots,
        stats,
        charts,
    })
}

/// Runs lookup → normalize → assemble once for a submitted selection.
pub fn run_pipeline(
    lookup: &MatchLookup,
    selection: &Selection,
    palette: &Palette,
) -> Result<MatchView, PipelineError> {
    let outcome = lookup.find(&selection.home, &selection.away)?;
    let doc = match outcome {
        LookupOutcome::Found(doc) => doc,
        LookupOutcome::NotFound => {
            return Err(PipelineError::NotFound {
                home: selection.home.clone(),
                away: selection.away.clone(),
            });
        }
    };
    let view = build_view(&doc, selection, palette)?;
    tracing::info!(
        home = %selection.home,
        away = %selection.away,
        shots = view.shots.len(),
        stats = view.stats.rows.len(),
        "match view built"
    );
    Ok(view)
}
