use std::collections::VecDeque;

use crate::charts::Palette;
use crate::directory::TeamDirectory;
use crate::error::{ErrorKind, PipelineError};
use crate::lookup::MatchLookup;
use crate::pipeline::{MatchView, NOT_FOUND_MESSAGE, run_pipeline};
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Home,
    Away,
}

/// Result of the last submit, as the shell should render it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ready(Box<MatchView>),
    /// Informational: the pair has no stored match.
    NoMatch(String),
    Failed { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn from_result(result: Result<MatchView, PipelineError>) -> Self {
        match result {
            Ok(view) => Outcome::Ready(Box::new(view)),
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Outcome::NoMatch(NOT_FOUND_MESSAGE.to_string()),
                kind => Outcome::Failed {
                    kind,
                    message: err.to_string(),
                },
            },
        }
    }

    pub fn view(&self) -> Option<&MatchView> {
        match self {
            Outcome::Ready(view) => Some(view),
            _ => None,
        }
    }
}

pub struct AppState {
    pub home_dir: TeamDirectory,
    pub away_dir: TeamDirectory,
    pub leagues: Vec<String>,
    pub home_cursor: usize,
    pub away_cursor: usize,
    pub focus: FormFocus,
    pub session: Option<SessionState>,
    pub outcome: Option<Outcome>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    /// Form cursors start on the first home entry and the second away entry.
    pub fn new(home_dir: TeamDirectory, away_dir: TeamDirectory, leagues: Vec<String>) -> Self {
        let session = SessionState::init(&home_dir, &away_dir);
        let away_cursor = if away_dir.len() > 1 { 1 } else { 0 };
        let mut state = Self {
            home_dir,
            away_dir,
            leagues,
            home_cursor: 0,
            away_cursor,
            focus: FormFocus::Home,
            session,
            outcome: None,
            logs: VecDeque::new(),
            help_overlay: false,
        };
        if state.session.is_none() {
            state.push_log("[WARN] No teams available outside the excluded competitions");
        }
        state
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormFocus::Home => FormFocus::Away,
            FormFocus::Away => FormFocus::Home,
        };
    }

    pub fn select_next(&mut self) {
        let (cursor, total) = self.focused_cursor();
        if total == 0 {
            *cursor = 0;
            return;
        }
        *cursor = (*cursor + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let (cursor, total) = self.focused_cursor();
        if total == 0 {
            *cursor = 0;
            return;
        }
        if *cursor == 0 {
            *cursor = total - 1;
        } else {
            *cursor -= 1;
        }
    }

    fn focused_cursor(&mut self) -> (&mut usize, usize) {
        match self.focus {
            FormFocus::Home => (&mut self.home_cursor, self.home_dir.len()),
            FormFocus::Away => (&mut self.away_cursor, self.away_dir.len()),
        }
    }

    pub fn home_label(&self) -> Option<&str> {
        self.home_dir.label_at(self.home_cursor)
    }

    pub fn away_label(&self) -> Option<&str> {
        self.away_dir.label_at(self.away_cursor)
    }

    /// Stores the cursor labels as the session selection and runs the
    /// pipeline once. Every failure ends up in `outcome`; nothing escapes.
    pub fn submit(&mut self, lookup: &MatchLookup, palette: &Palette) {
        let (Some(home_label), Some(away_label)) = (
            self.home_label().map(str::to_string),
            self.away_label().map(str::to_string),
        ) else {
            self.push_log("[INFO] Nothing to submit");
            return;
        };
        let submitted = match self.session.as_mut() {
            Some(session) => session
                .submit(&self.home_dir, &home_label, &self.away_dir, &away_label)
                .cloned(),
            None => {
                self.push_log("[INFO] Nothing to submit");
                return;
            }
        };

        let selection = match submitted {
            Ok(selection) => selection,
            Err(err) => {
                self.push_log(format!("[WARN] {err}"));
                return;
            }
        };

        let outcome = Outcome::from_result(run_pipeline(lookup, &selection, palette));
        match &outcome {
            Outcome::Ready(view) => self.push_log(format!(
                "[INFO] {} ({} shots)",
                view.header.headline(),
                view.shots.len()
            )),
            Outcome::NoMatch(_) => self.push_log(format!(
                "[INFO] No match for {} vs {}",
                selection.home, selection.away
            )),
            Outcome::Failed { message, .. } => self.push_log(format!("[WARN] {message}")),
        }
        self.outcome = Some(outcome);
    }

    /// Back to the initial selection and default cursors; clears the view.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
        self.home_cursor = 0;
        self.away_cursor = if self.away_dir.len() > 1 { 1 } else { 0 };
        self.outcome = None;
        self.push_log("[INFO] Selection reset");
    }

    pub fn current_view(&self) -> Option<&MatchView> {
        self.outcome.as_ref().and_then(Outcome::view)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
