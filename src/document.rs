use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored fixture, as written by the scraper that feeds the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDocument {
    #[serde(default)]
    pub general: General,
    pub teams: Teams,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
    #[serde(default)]
    pub shotmap: Option<Shotmap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct General {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub league: String,
    #[serde(default, deserialize_with = "season_text")]
    pub season: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teams {
    pub home: TeamRef,
    pub away: TeamRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub home: u32,
    #[serde(default)]
    pub away: u32,
}

/// Raw shot attributes keyed by field name. Fields can be absent per shot.
pub type RawShot = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shotmap {
    #[serde(default)]
    pub home: Vec<RawShot>,
    #[serde(default)]
    pub away: Vec<RawShot>,
}

impl MatchDocument {
    pub fn home_name(&self) -> &str {
        &self.teams.home.name
    }

    pub fn away_name(&self) -> &str {
        &self.teams.away.name
    }

    pub fn team(&self, venue: Venue) -> &TeamRef {
        match venue {
            Venue::Home => &self.teams.home,
            Venue::Away => &self.teams.away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn as_str(self) -> &'static str {
        match self {
            Venue::Home => "home",
            Venue::Away => "away",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Venue::Home),
            "away" => Ok(Venue::Away),
            other => Err(format!("unknown venue role: {other}")),
        }
    }
}

// Seasons show up both as "2024/2025" and as a bare year.
fn season_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_with_numeric_season_and_missing_shotmap() {
        let raw = r#"{
            "_id": "abc",
            "general": {"country": "ENG", "league": "Premier League", "season": 2024},
            "teams": {"home": {"name": "Alpha FC", "image": "a.png"}, "away": {"name": "Beta United"}},
            "score": {"home": 2, "away": 1},
            "stats": {"ball_possession": [0.6, 0.4]}
        }"#;
        let doc: MatchDocument = serde_json::from_str(raw).expect("document should parse");
        assert_eq!(doc.general.season, "2024");
        assert_eq!(doc.home_name(), "Alpha FC");
        assert_eq!(doc.team(Venue::Away).image, None);
        assert!(doc.shotmap.is_none());
        assert_eq!(doc.score, Score { home: 2, away: 1 });
    }

    #[test]
    fn venue_round_trips_through_text() {
        assert_eq!("Away".parse::<Venue>(), Ok(Venue::Away));
        assert_eq!(Venue::Home.to_string(), "home");
        assert!("neutral".parse::<Venue>().is_err());
    }
}
