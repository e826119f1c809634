use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::TeamDirectory;

/// Canonical home/away names the pipeline runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub home: String,
    pub away: String,
}

impl Selection {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("unknown home team: {0}")]
    UnknownHomeLabel(String),
    #[error("unknown away team: {0}")]
    UnknownAwayLabel(String),
}

/// Selection that survives resubmission. Starts at the first directory entry
/// of each role and only moves on an explicit submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    initial: Selection,
    current: Selection,
    submissions: u32,
}

impl SessionState {
    /// `None` when either directory is empty; there is nothing to select.
    pub fn init(home_dir: &TeamDirectory, away_dir: &TeamDirectory) -> Option<Self> {
        let (_, home) = home_dir.first()?;
        let (_, away) = away_dir.first()?;
        let initial = Selection::new(home.name.clone(), away.name.clone());
        Some(Self {
            current: initial.clone(),
            initial,
            submissions: 0,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.current
    }

    pub fn submissions(&self) -> u32 {
        self.submissions
    }

    /// Resolves both labels before touching state; an unknown label leaves
    /// the previous selection in place.
    pub fn submit(
        &mut self,
        home_dir: &TeamDirectory,
        home_label: &str,
        away_dir: &TeamDirectory,
        away_label: &str,
    ) -> Result<&Selection, SubmitError> {
        let home = home_dir
            .get(home_label)
            .ok_or_else(|| SubmitError::UnknownHomeLabel(home_label.to_string()))?;
        let away = away_dir
            .get(away_label)
            .ok_or_else(|| SubmitError::UnknownAwayLabel(away_label.to_string()))?;
        self.current = Selection::new(home.name.clone(), away.name.clone());
        self.submissions = self.submissions.saturating_add(1);
        Ok(&self.current)
    }

    pub fn reset(&mut self) {
        self.current = self.initial.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::build_team_directory;
    use crate::document::Venue;
    use crate::store::TeamRow;

    fn dir(venue: Venue, names: &[&str]) -> TeamDirectory {
        let rows = names
            .iter()
            .map(|name| TeamRow {
                country: "ENG".to_string(),
                league: "Premier League".to_string(),
                name: name.to_string(),
            })
            .collect::<Vec<_>>();
        build_team_directory(venue, &rows, &[])
    }

    #[test]
    fn init_picks_first_entries_and_submit_updates() {
        let home = dir(Venue::Home, &["Alpha FC", "Gamma"]);
        let away = dir(Venue::Away, &["Beta United", "Delta"]);
        let mut session = SessionState::init(&home, &away).expect("session");
        assert_eq!(session.selection(), &Selection::new("Alpha FC", "Beta United"));

        session
            .submit(&home, "Gamma - ENG", &away, "Delta - ENG")
            .expect("submit");
        assert_eq!(session.selection(), &Selection::new("Gamma", "Delta"));
        assert_eq!(session.submissions(), 1);

        session.reset();
        assert_eq!(session.selection(), &Selection::new("Alpha FC", "Beta United"));
    }

    #[test]
    fn unknown_label_keeps_previous_selection() {
        let home = dir(Venue::Home, &["Alpha FC"]);
        let away = dir(Venue::Away, &["Beta United"]);
        let mut session = SessionState::init(&home, &away).expect("session");
        let err = session
            .submit(&home, "Alpha FC - ENG", &away, "Nope - ENG")
            .unwrap_err();
        assert_eq!(err, SubmitError::UnknownAwayLabel("Nope - ENG".to_string()));
        assert_eq!(session.selection(), &Selection::new("Alpha FC", "Beta United"));
        assert_eq!(session.submissions(), 0);
    }

    #[test]
    fn empty_directory_has_no_session() {
        let home = dir(Venue::Home, &[]);
        let away = dir(Venue::Away, &["Beta United"]);
        assert!(SessionState::init(&home, &away).is_none());
    }
}
