use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use match_plots::charts::{DEFAULT_AWAY_COLOR, DEFAULT_HOME_COLOR, Palette};
use match_plots::document::{MatchDocument, Venue};
use match_plots::directory::build_team_directory;
use match_plots::error::{ErrorKind, PipelineError, StoreError};
use match_plots::lookup::{LookupOutcome, MatchLookup, MemoryLookupCache};
use match_plots::pipeline::run_pipeline;
use match_plots::session::Selection;
use match_plots::state::{AppState, Outcome};
use match_plots::store::{MatchStore, SqliteMatchStore, TeamRow};

fn alpha_beta() -> MatchDocument {
    serde_json::from_value(json!({
        "general": {"country": "ENG", "league": "Premier League", "season": 2024},
        "teams": {
            "home": {"name": "Alpha FC", "image": "alpha.png"},
            "away": {"name": "Beta United", "image": "beta.png"}
        },
        "score": {"home": 1, "away": 0},
        "stats": {
            "ball_possession": [0.6, 0.4],
            "touch_opp_box_100_passes": [5.2, 3.1]
        },
        "shotmap": {
            "home": [{
                "min": 10, "xg": 0.3, "xgot": 0.5, "player": "A",
                "type": "RightFoot", "situation": "RegularPlay", "outcome": "Goal"
            }],
            "away": [{
                "min": 80, "xg": 0.1, "player": "B",
                "situation": "SetPiece", "outcome": "Miss"
            }]
        }
    }))
    .expect("fixture document")
}

fn lookup_with(docs: &[MatchDocument]) -> MatchLookup {
    let store = SqliteMatchStore::open_in_memory().expect("in-memory store");
    store.upsert_documents(docs).expect("seed store");
    let store: Arc<dyn MatchStore> = Arc::new(store);
    MatchLookup::new(store, Arc::new(MemoryLookupCache::new()))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn alpha_beta_end_to_end() {
    let lookup = lookup_with(&[alpha_beta()]);
    let selection = Selection::new("Alpha FC", "Beta United");
    let view = run_pipeline(&lookup, &selection, &Palette::default()).expect("view");

    assert_eq!(view.header.details, "ENG - Premier League - Season 2024");
    assert_eq!(view.header.scoreline, "1 x 0");
    assert_eq!(view.header.headline(), "Alpha FC - 1 x 0 - Beta United");

    assert_eq!(view.shots.len(), 2);
    let home = &view.shots[0];
    assert_eq!(home.team, "Alpha FC");
    assert!(close(home.minute, 10.0));
    assert!(close(home.xg, 0.3));
    assert!(close(home.xgot, 0.5));
    assert!(close(home.size, 0.55));
    assert!(close(home.efficiency_rate, 0.4));

    let away = &view.shots[1];
    assert_eq!(away.team, "Beta United");
    assert!(close(away.minute, 80.0));
    assert!(close(away.xg, 0.1));
    assert_eq!(away.xgot, 0.0);
    assert!(close(away.size, 0.05));
    assert!(close(away.efficiency_rate, 0.05));
    assert_eq!(away.shot_type, "0");

    assert_eq!(view.touch_per_100(), (5.2, 3.1));
    let stats = view
        .stats
        .rows
        .iter()
        .map(|row| (row.team.as_str(), row.metric.as_str(), row.value))
        .collect::<Vec<_>>();
    assert_eq!(
        stats,
        vec![
            ("Alpha FC", "Ball Poss", 0.6),
            ("Beta United", "Ball Poss", 0.4),
        ]
    );

    let shot_map = &view.charts.shot_map;
    assert_eq!(
        shot_map.trace(Venue::Home).map(|t| t.marker.color.as_str()),
        Some(DEFAULT_HOME_COLOR)
    );
    assert_eq!(
        shot_map.trace(Venue::Away).map(|t| t.marker.color.as_str()),
        Some(DEFAULT_AWAY_COLOR)
    );
    let radar = view.charts.stats_radar.trace(Venue::Home).expect("radar");
    assert_eq!(radar.theta.first(), radar.theta.last());
}

#[test]
fn reversed_pair_is_a_not_found_value() {
    let lookup = lookup_with(&[alpha_beta()]);
    let selection = Selection::new("Beta United", "Alpha FC");
    let err = run_pipeline(&lookup, &selection, &Palette::default()).expect_err("no match");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, PipelineError::NotFound { ref home, .. } if home == "Beta United"));
}

#[test]
fn lookup_is_idempotent() {
    let lookup = lookup_with(&[alpha_beta()]);
    let first = lookup.find("Alpha FC", "Beta United").expect("first");
    let second = lookup.find("Alpha FC", "Beta United").expect("second");
    assert!(first.is_found());
    assert_eq!(first, second);
    assert_eq!(
        lookup.find("Nobody", "Beta United").expect("miss"),
        LookupOutcome::NotFound
    );
}

#[test]
fn missing_shotmap_is_a_data_shape_error() {
    let mut doc = alpha_beta();
    doc.shotmap = None;
    let lookup = lookup_with(&[doc]);
    let err = run_pipeline(
        &lookup,
        &Selection::new("Alpha FC", "Beta United"),
        &Palette::default(),
    )
    .expect_err("shape error");
    assert_eq!(err.kind(), ErrorKind::DataShape);
}

#[test]
fn non_numeric_xg_is_a_data_shape_error() {
    let mut doc = alpha_beta();
    if let Some(shotmap) = doc.shotmap.as_mut() {
        shotmap.home[0].insert("xg".to_string(), json!("high"));
    }
    let lookup = lookup_with(&[doc]);
    let err = run_pipeline(
        &lookup,
        &Selection::new("Alpha FC", "Beta United"),
        &Palette::default(),
    )
    .expect_err("shape error");
    assert_eq!(err.kind(), ErrorKind::DataShape);
    assert!(err.to_string().contains("xg"));
}

struct UnreachableStore {
    calls: AtomicUsize,
}

impl MatchStore for UnreachableStore {
    fn find_match(&self, _: &str, _: &str) -> Result<Option<MatchDocument>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Connectivity("connection refused".to_string()))
    }

    fn team_rows(&self, _: Venue, _: &[String]) -> Result<Vec<TeamRow>, StoreError> {
        Ok(Vec::new())
    }

    fn distinct_team_names(&self, _: Venue) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    fn distinct_leagues(&self, _: &[String]) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn store_outage_is_a_connectivity_failure_not_a_missing_match() {
    let store = Arc::new(UnreachableStore {
        calls: AtomicUsize::new(0),
    });
    let lookup = MatchLookup::new(store.clone(), Arc::new(MemoryLookupCache::new()));
    let err = run_pipeline(
        &lookup,
        &Selection::new("Alpha FC", "Beta United"),
        &Palette::default(),
    )
    .expect_err("outage");
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(err.to_string().contains("connection refused"));

    let row = |name: &str| TeamRow {
        country: "ENG".to_string(),
        league: "Premier League".to_string(),
        name: name.to_string(),
    };
    let rows = vec![row("Alpha FC"), row("Beta United")];
    let exclude = Vec::new();
    let mut state = AppState::new(
        build_team_directory(Venue::Home, &rows, &exclude),
        build_team_directory(Venue::Away, &rows, &exclude),
        Vec::new(),
    );
    state.submit(&lookup, &Palette::default());
    assert!(matches!(
        state.outcome,
        Some(Outcome::Failed {
            kind: ErrorKind::Connectivity,
            ..
        })
    ));

    // The session survives, so a resubmit retries the store.
    state.submit(&lookup, &Palette::default());
    let session = state.session.as_ref().expect("session kept");
    assert_eq!(session.submissions(), 2);
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn unreadable_stored_body_is_a_data_shape_error() {
    let path = std::env::temp_dir().join("match_plots_corrupt_body_test.sqlite");
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
    {
        let store = SqliteMatchStore::open(&path).expect("store");
        store.upsert_documents(&[alpha_beta()]).expect("seed");
    }
    {
        let conn = rusqlite::Connection::open(&path).expect("raw connection");
        conn.execute(
            "UPDATE match_documents SET body = '{\"teams\": 42' WHERE home_name = 'Alpha FC'",
            [],
        )
        .expect("corrupt body");
    }

    let store: Arc<dyn MatchStore> =
        Arc::new(SqliteMatchStore::open_read_only(&path).expect("read-only store"));
    let lookup = MatchLookup::new(store, Arc::new(MemoryLookupCache::new()));
    let err = run_pipeline(
        &lookup,
        &Selection::new("Alpha FC", "Beta United"),
        &Palette::default(),
    )
    .expect_err("corrupt body");
    assert_eq!(err.kind(), ErrorKind::DataShape);
    assert!(err.to_string().contains("unreadable"));
}
