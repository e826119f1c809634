use std::collections::{HashMap, HashSet};

use crate::document::Venue;
use crate::error::StoreError;
use crate::store::{MatchStore, TeamRow};

/// Country codes of international competitions; their fixtures are not
/// national-league matches and stay out of the selectable teams.
pub const DEFAULT_EXCLUDED_COUNTRIES: &[&str] = &["INT", "INT-2"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamEntry {
    pub country: String,
    pub league: String,
    pub name: String,
}

/// Label → team mapping for one venue role, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    venue: Option<Venue>,
    labels: Vec<String>,
    entries: HashMap<String, TeamEntry>,
}

impl TeamDirectory {
    pub fn venue(&self) -> Option<Venue> {
        self.venue
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, label: &str) -> Option<&TeamEntry> {
        self.entries.get(label)
    }

    pub fn label_at(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn first(&self) -> Option<(&str, &TeamEntry)> {
        let label = self.labels.first()?;
        self.entries.get(label).map(|entry| (label.as_str(), entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TeamEntry)> {
        self.labels
            .iter()
            .filter_map(|label| self.entries.get(label).map(|e| (label.as_str(), e)))
    }

    fn insert_if_absent(&mut self, label: String, entry: TeamEntry) -> bool {
        if self.entries.contains_key(&label) {
            return false;
        }
        self.labels.push(label.clone());
        self.entries.insert(label, entry);
        true
    }
}

pub fn team_label(name: &str, country: &str) -> String {
    format!("{name} - {country}")
}

/// Builds the directory from projected rows. The first row seen for a label
/// wins; later rows with the same label are dropped even when their league
/// differs.
pub fn build_team_directory(venue: Venue, rows: &[TeamRow], exclude: &[String]) -> TeamDirectory {
    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    let mut directory = TeamDirectory {
        venue: Some(venue),
        ..TeamDirectory::default()
    };
    for row in rows {
        if excluded.contains(row.country.as_str()) {
            continue;
        }
        directory.insert_if_absent(
            team_label(&row.name, &row.country),
            TeamEntry {
                country: row.country.clone(),
                league: row.league.clone(),
                name: row.name.clone(),
            },
        );
    }
    directory
}

pub fn load_team_directory(
    store: &dyn MatchStore,
    venue: Venue,
    exclude: &[String],
) -> Result<TeamDirectory, StoreError> {
    let rows = store.team_rows(venue, exclude)?;
    let directory = build_team_directory(venue, &rows, exclude);
    tracing::debug!(
        venue = venue.as_str(),
        rows = rows.len(),
        teams = directory.len(),
        "team directory built"
    );
    Ok(directory)
}

pub fn default_excluded_countries() -> Vec<String> {
    DEFAULT_EXCLUDED_COUNTRIES
        .iter()
        .map(|code| code.to_string())
        .collect()
}
