use rand::Rng;
use serde_json::{Map, Value, json};

use crate::document::{General, MatchDocument, Score, Shotmap, TeamRef, Teams};

const SITUATIONS: [&str; 5] = ["RegularPlay", "FromCorner", "SetPiece", "FastBreak", "Penalty"];
const SHOT_TYPES: [&str; 3] = ["RightFoot", "LeftFoot", "Header"];
const OUTCOMES: [&str; 5] = ["Goal", "Saved", "Miss", "Blocked", "Post"];

struct League {
    country: &'static str,
    name: &'static str,
    teams: &'static [&'static str],
}

const LEAGUES: [League; 3] = [
    League {
        country: "ENG",
        name: "Premier League",
        teams: &["Alpha FC", "Beta United", "Kingsbridge", "Harbour Town"],
    },
    League {
        country: "ESP",
        name: "La Liga",
        teams: &["Real Norte", "Atletico Sur", "Deportivo Costa"],
    },
    // Cup fixtures; excluded from the directories by default.
    League {
        country: "INT",
        name: "Champions League",
        teams: &["Alpha FC", "Real Norte"],
    },
];

/// Every ordered pairing inside each demo league, with random but plausible
/// shots and stats.
pub fn demo_documents(rng: &mut impl Rng, season: &str) -> Vec<MatchDocument> {
    let mut docs = Vec::new();
    for league in &LEAGUES {
        for home in league.teams {
            for away in league.teams {
                if home == away {
                    continue;
                }
                docs.push(demo_match(rng, league, home, away, season));
            }
        }
    }
    docs
}

fn demo_match(
    rng: &mut impl Rng,
    league: &League,
    home: &str,
    away: &str,
    season: &str,
) -> MatchDocument {
    let home_count: usize = rng.gen_range(4..18);
    let away_count: usize = rng.gen_range(2..14);
    let home_shots = demo_shots(rng, home_count);
    let away_shots = demo_shots(rng, away_count);
    let score = Score {
        home: goals(&home_shots),
        away: goals(&away_shots),
    };

    let possession = rng.gen_range(0.30..0.70_f64);
    let mut stats = Map::new();
    stats.insert("ball_possession".to_string(), pair(possession, 1.0 - possession));
    let passes_home = rng.gen_range(0.2..0.8_f64);
    stats.insert(
        "passes_opp_half_%".to_string(),
        pair(passes_home, rng.gen_range(0.2..0.8)),
    );
    stats.insert(
        "xg_op_for_100_passes".to_string(),
        pair(rng.gen_range(0.0..0.6), rng.gen_range(0.0..0.6)),
    );
    stats.insert(
        "interceptions_perc".to_string(),
        pair(rng.gen_range(0.1..0.9), rng.gen_range(0.1..0.9)),
    );
    stats.insert(
        "touch_opp_box_100_passes".to_string(),
        pair(round1(rng.gen_range(2.0..14.0)), round1(rng.gen_range(2.0..14.0))),
    );

    MatchDocument {
        general: General {
            country: league.country.to_string(),
            league: league.name.to_string(),
            season: season.to_string(),
        },
        teams: Teams {
            home: TeamRef {
                name: home.to_string(),
                image: Some(format!("https://images.example/teams/{}.png", badge(home))),
            },
            away: TeamRef {
                name: away.to_string(),
                image: Some(format!("https://images.example/teams/{}.png", badge(away))),
            },
        },
        score,
        stats: Some(stats),
        shotmap: Some(Shotmap {
            home: home_shots,
            away: away_shots,
        }),
    }
}

fn demo_shots(rng: &mut impl Rng, count: usize) -> Vec<Map<String, Value>> {
    let mut minutes = (0..count).map(|_| rng.gen_range(1..95u32)).collect::<Vec<_>>();
    minutes.sort_unstable();
    minutes
        .into_iter()
        .enumerate()
        .map(|(idx, minute)| {
            let xg = round2(rng.gen_range(0.01..0.8_f64));
            let on_target = rng.gen_bool(0.4);
            let outcome = if on_target && rng.gen_bool(xg.max(0.1)) {
                "Goal"
            } else if on_target {
                "Saved"
            } else {
                OUTCOMES[rng.gen_range(2..OUTCOMES.len())]
            };
            let mut shot = json!({
                "min": minute,
                "xg": xg,
                "player": format!("Player {}", rng.gen_range(1..24u32)),
                "type": SHOT_TYPES[rng.gen_range(0..SHOT_TYPES.len())],
                "situation": SITUATIONS[rng.gen_range(0..SITUATIONS.len())],
                "outcome": outcome,
            });
            // Off-target shots have no xGOT in the feed.
            if on_target {
                shot["xgot"] = json!(round2(rng.gen_range(0.05..0.95_f64)));
            }
            shot["id"] = json!(idx + 1);
            match shot {
                Value::Object(map) => map,
                _ => Map::new(),
            }
        })
        .collect()
}

fn goals(shots: &[Map<String, Value>]) -> u32 {
    shots
        .iter()
        .filter(|s| s.get("outcome").and_then(Value::as_str) == Some("Goal"))
        .count() as u32
}

fn pair(home: f64, away: f64) -> Value {
    json!([round2(home), round2(away)])
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn badge(name: &str) -> String {
    name.to_ascii_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::charts::Palette;
    use crate::pipeline::build_view;
    use crate::session::Selection;

    #[test]
    fn demo_documents_run_through_the_pipeline() {
        let mut rng = StdRng::seed_from_u64(7);
        let docs = demo_documents(&mut rng, "2025/2026");
        // 4*3 + 3*2 + 2*1 ordered pairings.
        assert_eq!(docs.len(), 20);
        for doc in &docs {
            let selection = Selection::new(doc.home_name(), doc.away_name());
            let view = build_view(doc, &selection, &Palette::default()).expect("demo view");
            assert!(!view.shots.is_empty());
            assert_eq!(view.stats.rows.len(), 8);
        }
    }
}
