use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{CanonicalMatch, RawMatch};

/// Ordered lookup paths per canonical field. Paths are dot-separated;
/// a numeric segment indexes into an array. The same logical field lives
/// under different keys depending on provider shape, so each field carries
/// its alternatives in priority order.
///
/// The built-in defaults cover the known provider shapes; deployments
/// facing a new shape can override individual fields from a JSON file
/// (`--aliases-path`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub home: Vec<String>,
    pub away: Vec<String>,
    pub status: Vec<String>,
    pub kickoff: Vec<String>,
    /// Score paths come in (home, away) pairs: a pair only counts when both
    /// sides are present.
    pub score_pairs: Vec<(String, String)>,
    pub competition: Vec<String>,
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        FieldAliases {
            home: paths(&[
                "homeTeam.name",
                "teams.home.name",
                "teams.0.name",
                "fixture.homeTeam.name",
                "match.home",
                "teamHome.name",
            ]),
            away: paths(&[
                "awayTeam.name",
                "teams.away.name",
                "teams.1.name",
                "fixture.awayTeam.name",
                "match.away",
                "teamAway.name",
            ]),
            status: paths(&["status", "fixture.status", "match.status", "matchStatus"]),
            kickoff: paths(&["utcDate", "fixture.utcDate", "match.utcDate", "date"]),
            score_pairs: vec![
                ("score.fullTime.home".into(), "score.fullTime.away".into()),
                ("fixture.result.home".into(), "fixture.result.away".into()),
                ("goalsHomeTeam".into(), "goalsAwayTeam".into()),
                ("match.score.home".into(), "match.score.away".into()),
            ],
            competition: paths(&["competition.name", "league.name", "competition_name"]),
        }
    }
}

impl FieldAliases {
    /// Load an alias table from a JSON file. Fields left out of the file
    /// keep their built-in defaults. Unlike the tolerant settings file,
    /// an explicitly configured alias table that cannot be read is an error.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias table {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid alias table in {}", path))
    }
}

/// Maps an arbitrary-shaped raw match record into a `CanonicalMatch`.
/// Total and pure: any input shape produces defaults, never an error.
#[derive(Debug, Clone, Default)]
pub struct MatchNormalizer {
    aliases: FieldAliases,
}

impl MatchNormalizer {
    pub fn new(aliases: FieldAliases) -> Self {
        MatchNormalizer { aliases }
    }

    pub fn normalize(&self, raw: &RawMatch) -> CanonicalMatch {
        let home = first_string(raw, &self.aliases.home).unwrap_or_else(|| "Home".to_string());
        let away = first_string(raw, &self.aliases.away).unwrap_or_else(|| "Away".to_string());
        let status = first_string(raw, &self.aliases.status)
            .unwrap_or_default()
            .to_uppercase();
        let kickoff_utc = first_string(raw, &self.aliases.kickoff)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let (score_home, score_away) = self.scores(raw);
        let competition = first_string(raw, &self.aliases.competition).unwrap_or_default();

        CanonicalMatch {
            home,
            away,
            status,
            kickoff_utc,
            score_home,
            score_away,
            competition,
        }
    }

    /// Scores resolve as a pair: the first pair alternative with both sides
    /// present wins; otherwise both stay null. A lone number never leaks out.
    fn scores(&self, raw: &RawMatch) -> (Option<i64>, Option<i64>) {
        for (home_path, away_path) in &self.aliases.score_pairs {
            let home = lookup(raw, home_path).and_then(as_int);
            let away = lookup(raw, away_path).and_then(as_int);
            if let (Some(home), Some(away)) = (home, away) {
                return (Some(home), Some(away));
            }
        }
        (None, None)
    }
}

/// Walk a dot-separated path through the JSON tree. Object keys are tried
/// first; a segment that parses as a number also indexes into arrays.
/// Explicit nulls count as absent.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = if let Some(next) = current.get(segment) {
            next
        } else if let Ok(index) = segment.parse::<usize>() {
            current.get(index)?
        } else {
            return None;
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn first_string(raw: &Value, alternatives: &[String]) -> Option<String> {
    alternatives
        .iter()
        .find_map(|path| lookup(raw, path).and_then(value_to_string))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Providers send scores as numbers or numeric strings.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
