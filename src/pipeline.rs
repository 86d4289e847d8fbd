use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::categorize::Categorizer;
use crate::config::Config;
use crate::credentials::CredentialResolver;
use crate::fetch::FixtureFetcher;
use crate::models::{CategorizedView, RawMatch};
use crate::normalize::{FieldAliases, MatchNormalizer};

/// Failure taxonomy for the fixture pipeline.
///
/// `Transport` and `Upstream` are recovered inside the fetcher by advancing
/// to the next candidate endpoint; they are logged, never propagated.
/// `EmptyResult` is not a caller-facing failure either: the categorizer
/// substitutes a deterministic placeholder view. Only `ConfigurationMissing`
/// reaches the caller, as the "pipeline unavailable" signal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provider credentials missing: {0}")]
    ConfigurationMissing(String),

    #[error("candidate endpoint {path} transport failure: {message}")]
    Transport { path: String, message: String },

    #[error("candidate endpoint {path} upstream failure: {detail}")]
    Upstream { path: String, detail: String },

    #[error("all candidate endpoints exhausted without fixture data")]
    EmptyResult,
}

/// Run the pipeline once: resolve credentials, fetch raw fixtures under the
/// overall deadline, normalize, categorize.
pub async fn run(config: &Config) -> anyhow::Result<CategorizedView> {
    let resolver = CredentialResolver::from_config(config);
    let credentials = resolver.resolve()?;

    let fetcher = FixtureFetcher::new(
        credentials,
        config.endpoints.clone(),
        Duration::from_secs(config.attempt_timeout_secs),
    )?;

    let now = Utc::now();
    let window = config.window(now.date_naive());
    info!(
        "Fetching fixtures for {} .. {}",
        window.date_from, window.date_to
    );

    let deadline = Duration::from_secs(config.deadline_secs);
    let raw = fetch_with_deadline(fetcher.fetch(&window), deadline).await;
    view_from_raw(config, raw, now)
}

/// Bound the candidate search by the caller-supplied overall deadline.
/// Expiry aborts the in-flight attempt and counts as exhausted candidates.
async fn fetch_with_deadline<F>(fetch: F, deadline: Duration) -> Vec<RawMatch>
where
    F: Future<Output = Vec<RawMatch>>,
{
    match tokio::time::timeout(deadline, fetch).await {
        Ok(list) => list,
        Err(_) => {
            warn!(
                "Overall deadline of {:?} expired, continuing without fixture data",
                deadline
            );
            Vec::new()
        }
    }
}

/// Normalize the raw list and derive the Presenter's view.
fn view_from_raw(
    config: &Config,
    raw: Vec<RawMatch>,
    now: DateTime<Utc>,
) -> anyhow::Result<CategorizedView> {
    if raw.is_empty() {
        // The Presenter still gets a view: categorize() fills in placeholders.
        info!("{}", PipelineError::EmptyResult);
    }

    let normalizer = match &config.aliases_path {
        Some(path) => MatchNormalizer::new(FieldAliases::from_file(path)?),
        None => MatchNormalizer::default(),
    };
    let matches: Vec<_> = raw.iter().map(|m| normalizer.normalize(m)).collect();
    info!("Normalized {} matches", matches.len());

    let categorizer = Categorizer::new(
        config.results_cap,
        config.news_cap,
        config.scores_cap,
        config.display_offset()?,
    );
    Ok(categorizer.categorize(&matches, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[tokio::test]
    async fn test_expired_deadline_falls_back_to_placeholder_view() {
        // A fetch that never completes: the deadline must abort it and the
        // invocation still produces the placeholder view, not an error.
        let raw = fetch_with_deadline(
            std::future::pending::<Vec<RawMatch>>(),
            Duration::from_millis(10),
        )
        .await;
        assert!(raw.is_empty());

        let config = Config::parse_from(["matchday"]);
        let view = view_from_raw(&config, raw, Utc::now()).unwrap();
        assert_eq!(view.scores.len(), 3);
        assert_eq!(view.news.len(), 2);
        assert!(view.scores.iter().all(|s| s.status == "SCHEDULED"));
    }

    #[tokio::test]
    async fn test_fetch_completing_within_deadline_passes_through() {
        let list = vec![json!({"homeTeam": {"name": "Ajax"}})];
        let fetched = {
            let list = list.clone();
            fetch_with_deadline(async move { list }, Duration::from_secs(5)).await
        };
        assert_eq!(fetched, list);
    }

    #[test]
    fn test_view_from_raw_normalizes_and_categorizes() {
        let config = Config::parse_from(["matchday"]);
        let raw = vec![json!({
            "homeTeam": {"name": "Ajax"},
            "awayTeam": {"name": "PSV"},
            "status": "FINISHED",
            "score": {"fullTime": {"home": 3, "away": 1}},
            "utcDate": "2024-05-01T18:00:00Z",
        })];
        let view = view_from_raw(&config, raw, Utc::now()).unwrap();
        assert_eq!(view.results.len(), 1);
        assert_eq!(view.news[0].title, "Ajax beats PSV 3-1");
    }
}
