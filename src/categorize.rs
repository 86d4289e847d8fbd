use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::info;

use crate::models::{CanonicalMatch, CategorizedView, NewsItem, ScoreLine};

/// Deterministic stand-in fixtures for when no live data is available.
const PLACEHOLDER_FIXTURES: [(&str, &str); 3] = [
    ("Ajax", "PSV"),
    ("Feyenoord", "AZ"),
    ("FC Groningen", "Sparta"),
];

/// Derives the four presentation views from the canonical match list.
pub struct Categorizer {
    results_cap: usize,
    news_cap: usize,
    scores_cap: usize,
    display_tz: FixedOffset,
}

impl Categorizer {
    pub fn new(
        results_cap: usize,
        news_cap: usize,
        scores_cap: usize,
        display_tz: FixedOffset,
    ) -> Self {
        Categorizer {
            results_cap,
            news_cap,
            scores_cap,
            display_tz,
        }
    }

    /// `now` is the processing instant, used to bucket matches without a
    /// kickoff time; passing it in keeps categorization deterministic.
    pub fn categorize(&self, matches: &[CanonicalMatch], now: DateTime<Utc>) -> CategorizedView {
        let results = self.results(matches);
        let news = self.news(matches);
        let scores = self.scores(matches);
        let grouped_by_day = self.group_by_day(matches, now);

        if results.is_empty() && news.is_empty() && scores.is_empty() {
            info!("No fixture data in any view, emitting placeholder fixtures");
            return placeholder_view(grouped_by_day);
        }

        CategorizedView {
            results,
            news,
            scores,
            grouped_by_day,
        }
    }

    /// Most recent finished matches with a full-time score, newest first.
    fn results(&self, matches: &[CanonicalMatch]) -> Vec<CanonicalMatch> {
        let mut finished: Vec<CanonicalMatch> =
            matches.iter().filter(|m| is_finished(m)).cloned().collect();
        // Descending kickoff; a missing kickoff sorts as earliest, i.e. last.
        finished.sort_by_key(|m| Reverse(m.kickoff_utc));
        finished.truncate(self.results_cap);
        finished
    }

    /// Short headline items: finished matches first, otherwise the leading
    /// fixtures in input order.
    fn news(&self, matches: &[CanonicalMatch]) -> Vec<NewsItem> {
        let mut news = Vec::new();
        for m in matches {
            if news.len() >= self.news_cap {
                break;
            }
            if is_finished(m) {
                if let (Some(home), Some(away)) = (m.score_home, m.score_away) {
                    news.push(NewsItem {
                        title: format!("{} beats {} {}-{}", m.home, m.away, home, away),
                        intro: m.competition.clone(),
                    });
                }
            }
        }
        if news.is_empty() {
            for m in matches.iter().take(self.news_cap) {
                news.push(NewsItem {
                    title: format!("{} - {}", m.home, m.away),
                    intro: m.competition.clone(),
                });
            }
        }
        news
    }

    /// Fill up to `scores_cap` slots in priority passes: live matches, then
    /// finished ones with a score, then anything else showing its kickoff
    /// time. Each match is used at most once.
    fn scores(&self, matches: &[CanonicalMatch]) -> Vec<ScoreLine> {
        let mut scores = Vec::new();
        let mut used = vec![false; matches.len()];

        for (i, m) in matches.iter().enumerate() {
            if scores.len() >= self.scores_cap {
                break;
            }
            if m.status == "IN_PLAY" {
                let score = match (m.score_home, m.score_away) {
                    (Some(home), Some(away)) => format!("{} - {}", home, away),
                    _ => "Live".to_string(),
                };
                scores.push(score_line(m, score));
                used[i] = true;
            }
        }

        for (i, m) in matches.iter().enumerate() {
            if scores.len() >= self.scores_cap {
                break;
            }
            if !used[i] && is_finished(m) {
                if let (Some(home), Some(away)) = (m.score_home, m.score_away) {
                    scores.push(score_line(m, format!("{} - {}", home, away)));
                    used[i] = true;
                }
            }
        }

        for (i, m) in matches.iter().enumerate() {
            if scores.len() >= self.scores_cap {
                break;
            }
            if !used[i] {
                let score = match m.kickoff_utc {
                    Some(kickoff) => kickoff
                        .with_timezone(&self.display_tz)
                        .format("%H:%M")
                        .to_string(),
                    None => "TBD".to_string(),
                };
                scores.push(score_line(m, score));
            }
        }

        scores
    }

    /// Bucket every match by the calendar date of its kickoff in the display
    /// timezone; matches without a kickoff land on the processing date.
    /// Input order is preserved within a bucket.
    fn group_by_day(
        &self,
        matches: &[CanonicalMatch],
        now: DateTime<Utc>,
    ) -> BTreeMap<NaiveDate, Vec<CanonicalMatch>> {
        let today = now.with_timezone(&self.display_tz).date_naive();
        let mut grouped: BTreeMap<NaiveDate, Vec<CanonicalMatch>> = BTreeMap::new();
        for m in matches {
            let day = m
                .kickoff_utc
                .map(|k| k.with_timezone(&self.display_tz).date_naive())
                .unwrap_or(today);
            grouped.entry(day).or_default().push(m.clone());
        }
        grouped
    }
}

/// Finished with a full-time score: the shared predicate for results and
/// news. Status matching is by substring so "FINISHED", "FINISH" and
/// provider variants like "MATCH_FINISHED" all qualify.
fn is_finished(m: &CanonicalMatch) -> bool {
    m.status.to_uppercase().contains("FINISH")
        && m.score_home.is_some()
        && m.score_away.is_some()
}

fn score_line(m: &CanonicalMatch, score: String) -> ScoreLine {
    ScoreLine {
        match_label: format!("{} - {}", m.home, m.away),
        score,
        status: m.status.clone(),
    }
}

/// The fixed fallback view: the Presenter never receives a fully empty
/// structure. Day grouping is passed through untouched.
fn placeholder_view(grouped_by_day: BTreeMap<NaiveDate, Vec<CanonicalMatch>>) -> CategorizedView {
    let results: Vec<CanonicalMatch> = PLACEHOLDER_FIXTURES
        .iter()
        .map(|(home, away)| CanonicalMatch {
            home: home.to_string(),
            away: away.to_string(),
            status: "SCHEDULED".to_string(),
            kickoff_utc: None,
            score_home: None,
            score_away: None,
            competition: String::new(),
        })
        .collect();
    let scores = results
        .iter()
        .map(|m| ScoreLine {
            match_label: format!("{} - {}", m.home, m.away),
            score: "TBD".to_string(),
            status: "SCHEDULED".to_string(),
        })
        .collect();
    let news = results
        .iter()
        .take(2)
        .map(|m| NewsItem {
            title: format!("{} - {}", m.home, m.away),
            intro: "Upcoming".to_string(),
        })
        .collect();

    CategorizedView {
        results,
        news,
        scores,
        grouped_by_day,
    }
}
