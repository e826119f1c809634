use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use match_plots::charts::Palette;
use match_plots::demo::demo_documents;
use match_plots::directory::{default_excluded_countries, load_team_directory};
use match_plots::document::Venue;
use match_plots::lookup::{MatchLookup, MemoryLookupCache};
use match_plots::pipeline::NOT_FOUND_MESSAGE;
use match_plots::state::{AppState, FormFocus, Outcome};
use match_plots::store::{MatchStore, SqliteMatchStore};

fn demo_state() -> (AppState, MatchLookup) {
    let store = SqliteMatchStore::open_in_memory().expect("store");
    let mut rng = StdRng::seed_from_u64(11);
    store
        .upsert_documents(&demo_documents(&mut rng, "2025/2026"))
        .expect("seed");
    let store: Arc<dyn MatchStore> = Arc::new(store);
    let exclude = default_excluded_countries();
    let home = load_team_directory(store.as_ref(), Venue::Home, &exclude).expect("home dir");
    let away = load_team_directory(store.as_ref(), Venue::Away, &exclude).expect("away dir");
    let leagues = store.distinct_leagues(&exclude).expect("leagues");
    let state = AppState::new(home, away, leagues);
    let lookup = MatchLookup::new(store, Arc::new(MemoryLookupCache::new()));
    (state, lookup)
}

#[test]
fn directories_skip_cup_competitions() {
    let (state, _) = demo_state();
    assert_eq!(state.leagues, vec!["La Liga", "Premier League"]);
    assert!(state.home_dir.labels().iter().all(|l| !l.ends_with("- INT")));
    assert_eq!(state.home_dir.labels().len(), 7);
    assert_eq!(state.home_label(), Some("Alpha FC - ENG"));
    assert_eq!(state.away_cursor, 1);
}

#[test]
fn submit_builds_a_view_for_the_cursor_pair() {
    let (mut state, lookup) = demo_state();
    let away = state.away_label().expect("away label").to_string();
    state.submit(&lookup, &Palette::default());

    let view = state.current_view().expect("ready view");
    assert_eq!(view.header.home, "Alpha FC");
    assert_eq!(format!("{} - ENG", view.header.away), away);
    let session = state.session.as_ref().expect("session");
    assert_eq!(session.submissions(), 1);
    assert_eq!(session.selection().home, "Alpha FC");
}

#[test]
fn cross_league_pair_reports_no_match() {
    let (mut state, lookup) = demo_state();
    let target = state
        .away_dir
        .labels()
        .iter()
        .position(|label| label == "Real Norte - ESP")
        .expect("spanish away team");
    state.toggle_focus();
    assert_eq!(state.focus, FormFocus::Away);
    while state.away_cursor != target {
        state.select_next();
    }
    state.submit(&lookup, &Palette::default());

    assert_eq!(
        state.outcome,
        Some(Outcome::NoMatch(NOT_FOUND_MESSAGE.to_string()))
    );
    assert!(state.current_view().is_none());
    assert!(state.logs.iter().any(|line| line.contains("No match")));
}

#[test]
fn reset_restores_initial_selection_and_cursors() {
    let (mut state, lookup) = demo_state();
    state.select_next();
    state.toggle_focus();
    state.select_prev();
    state.submit(&lookup, &Palette::default());
    assert!(state.outcome.is_some());

    state.reset();
    assert!(state.outcome.is_none());
    assert_eq!(state.home_cursor, 0);
    assert_eq!(state.away_cursor, 1);
    let session = state.session.as_ref().expect("session");
    assert_eq!(session.selection().home, "Alpha FC");
    assert_eq!(session.selection().away, "Beta United");
}

#[test]
fn cursors_wrap_both_ways() {
    let (mut state, _) = demo_state();
    state.select_prev();
    assert_eq!(state.home_cursor, state.home_dir.len() - 1);
    state.select_next();
    assert_eq!(state.home_cursor, 0);
}
