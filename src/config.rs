use std::env;
use std::path::PathBuf;

use crate::charts::{DEFAULT_AWAY_COLOR, DEFAULT_HOME_COLOR, Palette};
use crate::directory::default_excluded_countries;
use crate::error::ConfigError;

const APP_DIR: &str = "match_plots";
const DB_FILE: &str = "matches.sqlite";
const LOG_FILE: &str = "match_plots.log";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub excluded_countries: Vec<String>,
    pub palette: Palette,
    pub export_dir: PathBuf,
    pub log_path: PathBuf,
}

/// Loads `.env.local` then `.env`; values already in the environment win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_path = match non_empty("MATCH_DB_URL") {
            Some(url) => parse_db_url(&url)?,
            None => app_data_dir().join(DB_FILE),
        };

        let excluded_countries = match get("EXCLUDED_COUNTRIES") {
            Some(raw) => parse_codes(&raw),
            None => default_excluded_countries(),
        };

        let home = match non_empty("HOME_COLOR") {
            Some(color) => parse_color("HOME_COLOR", color)?,
            None => DEFAULT_HOME_COLOR.to_string(),
        };
        let away = match non_empty("AWAY_COLOR") {
            Some(color) => parse_color("AWAY_COLOR", color)?,
            None => DEFAULT_AWAY_COLOR.to_string(),
        };

        let export_dir = non_empty("CHART_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("exports"));
        let log_path = non_empty("MATCH_PLOTS_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| app_data_dir().join(LOG_FILE));

        Ok(Self {
            db_path,
            excluded_countries,
            palette: Palette { home, away },
            export_dir,
            log_path,
        })
    }
}

/// Accepts a bare path, `sqlite://path` or `file:path`.
pub fn parse_db_url(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .or_else(|| trimmed.strip_prefix("file:"))
        .unwrap_or(trimmed);
    if path.is_empty() || (trimmed.contains("://") && !trimmed.starts_with("sqlite://")) {
        return Err(ConfigError::Invalid {
            key: "MATCH_DB_URL",
            value: raw.to_string(),
        });
    }
    Ok(PathBuf::from(path))
}

/// Store path from a `--db <url>` or `--db=<url>` argument. A flag without
/// a value or with an unusable URL is an error, never a silent default.
pub fn db_path_arg(args: &[String]) -> Result<Option<PathBuf>, ConfigError> {
    const FLAG: &str = "--db";
    for (idx, arg) in args.iter().enumerate() {
        let raw = if let Some(value) = arg.strip_prefix("--db=") {
            value
        } else if arg == FLAG {
            args.get(idx + 1)
                .map(String::as_str)
                .filter(|next| !next.starts_with("--"))
                .unwrap_or("")
        } else {
            continue;
        };
        if raw.trim().is_empty() {
            return Err(ConfigError::MissingValue(FLAG));
        }
        return parse_db_url(raw).map(Some);
    }
    Ok(None)
}

fn parse_codes(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in raw.split([',', ';', ' ']) {
        let code = code.trim();
        if code.is_empty() || out.iter().any(|c| c == code) {
            continue;
        }
        out.push(code.to_string());
    }
    out
}

fn parse_color(key: &'static str, color: String) -> Result<String, ConfigError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(color)
    } else {
        Err(ConfigError::Invalid { key, value: color })
    }
}

fn app_data_dir() -> PathBuf {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return PathBuf::from(base).join(APP_DIR);
        }
    }
    match env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home).join(".cache").join(APP_DIR),
        _ => PathBuf::from(".").join(APP_DIR),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_exclude_international_cups() {
        let cfg = config(&[]).expect("config");
        assert_eq!(cfg.excluded_countries, vec!["INT".to_string(), "INT-2".to_string()]);
        assert_eq!(cfg.palette, Palette::default());
        assert!(cfg.db_path.ends_with("match_plots/matches.sqlite"));
    }

    #[test]
    fn reads_connection_string_and_overrides() {
        let cfg = config(&[
            ("MATCH_DB_URL", "sqlite:///data/football.sqlite"),
            ("EXCLUDED_COUNTRIES", "INT; INT-2, UEFA INT"),
            ("AWAY_COLOR", "#112233"),
        ])
        .expect("config");
        assert_eq!(cfg.db_path, PathBuf::from("/data/football.sqlite"));
        assert_eq!(cfg.excluded_countries, vec!["INT", "INT-2", "UEFA"]);
        assert_eq!(cfg.palette.away, "#112233");
        assert_eq!(cfg.palette.home, DEFAULT_HOME_COLOR);
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn db_flag_accepts_both_forms() {
        assert_eq!(
            db_path_arg(&args(&["--db", "sqlite://data/m.sqlite", "a.jsonl"])).expect("arg"),
            Some(PathBuf::from("data/m.sqlite"))
        );
        assert_eq!(
            db_path_arg(&args(&["a.jsonl", "--db=local.sqlite"])).expect("arg"),
            Some(PathBuf::from("local.sqlite"))
        );
        assert_eq!(db_path_arg(&args(&["a.jsonl"])).expect("arg"), None);
    }

    #[test]
    fn db_flag_never_falls_back_silently() {
        let err = db_path_arg(&args(&["--db", "mongodb://cluster/football", "a.jsonl"]))
            .expect_err("foreign url");
        assert!(matches!(err, ConfigError::Invalid { key: "MATCH_DB_URL", .. }));
        assert!(matches!(
            db_path_arg(&args(&["a.jsonl", "--db"])),
            Err(ConfigError::MissingValue("--db"))
        ));
        assert!(matches!(
            db_path_arg(&args(&["--db", "--seed", "3"])),
            Err(ConfigError::MissingValue("--db"))
        ));
        assert!(matches!(
            db_path_arg(&args(&["--db="])),
            Err(ConfigError::MissingValue("--db"))
        ));
    }

    #[test]
    fn rejects_foreign_urls_and_bad_colours() {
        assert!(config(&[("MATCH_DB_URL", "mongodb+srv://cluster/football")]).is_err());
        assert!(config(&[("HOME_COLOR", "green")]).is_err());
        let empty = config(&[("EXCLUDED_COUNTRIES", "")]).expect("config");
        assert!(empty.excluded_countries.is_empty());
    }
}
