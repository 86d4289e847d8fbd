use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Provider credentials, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub host: String,
}

/// Calendar dates bounding a fixture query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Raw match record as received from the provider. The shape varies per
/// deployment, so it stays an opaque JSON value until normalization.
pub type RawMatch = serde_json::Value;

/// Normalized fixture record after reconciling provider schema variants.
///
/// `home`/`away` are never empty (defaulted if absent) and the score fields
/// are only ever populated as a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalMatch {
    pub home: String,
    pub away: String,
    /// Upper-cased status token, e.g. "FINISHED", "IN_PLAY", "SCHEDULED".
    pub status: String,
    pub kickoff_utc: Option<DateTime<Utc>>,
    pub score_home: Option<i64>,
    pub score_away: Option<i64>,
    pub competition: String,
}

/// One short news line derived from a fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub intro: String,
}

/// One line in the live/scheduled scores list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLine {
    #[serde(rename = "match")]
    pub match_label: String,
    pub score: String,
    pub status: String,
}

/// The curated presentation views handed to the Presenter.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizedView {
    pub results: Vec<CanonicalMatch>,
    pub news: Vec<NewsItem>,
    pub scores: Vec<ScoreLine>,
    pub grouped_by_day: BTreeMap<NaiveDate, Vec<CanonicalMatch>>,
}
