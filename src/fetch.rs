use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{Credentials, FetchWindow, RawMatch};
use crate::pipeline::PipelineError;

/// Payload keys that may wrap the match list, in priority order.
const CONTAINER_KEYS: [&str; 4] = ["matches", "response", "data", "items"];

/// Keys whose presence marks an object as a plausible match record.
const MATCH_MARKER_KEYS: [&str; 4] = ["homeTeam", "teams", "fixture", "match"];

/// Tries ordered candidate endpoints against the resolved provider host
/// until one yields a non-empty recognized match list.
pub struct FixtureFetcher {
    http: Client,
    credentials: Credentials,
    candidate_paths: Vec<String>,
    /// Scheme + authority override for tests; normally derived from the host.
    base_url: Option<String>,
}

impl FixtureFetcher {
    pub fn new(
        credentials: Credentials,
        candidate_paths: Vec<String>,
        attempt_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(attempt_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FixtureFetcher {
            http,
            credentials,
            candidate_paths,
            base_url: None,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Fetch raw matches for the window. Per-candidate failures are logged
    /// and the next candidate is tried; this never returns an error. All
    /// candidates exhausted means an empty list.
    pub async fn fetch(&self, window: &FetchWindow) -> Vec<RawMatch> {
        let base = self.base_url.clone().unwrap_or_else(|| {
            format!("https://{}", self.credentials.host.trim_end_matches('/'))
        });

        for path in &self.candidate_paths {
            match self.try_candidate(&base, path, window).await {
                Ok(list) if !list.is_empty() => {
                    info!("Endpoint {} yielded {} matches", path, list.len());
                    return list;
                }
                Ok(_) => {
                    debug!("Endpoint {} yielded no recognizable match list", path);
                }
                Err(e) => {
                    warn!("{}", e);
                }
            }
        }

        warn!(
            "All {} candidate endpoints exhausted without fixture data",
            self.candidate_paths.len()
        );
        Vec::new()
    }

    /// One GET against one candidate. No retries: any failure moves the
    /// search to the next candidate.
    async fn try_candidate(
        &self,
        base: &str,
        path: &str,
        window: &FetchWindow,
    ) -> Result<Vec<RawMatch>, PipelineError> {
        let url = format!("{}{}", base, path);
        debug!("Trying fixture endpoint {}", url);

        let resp = self
            .http
            .get(&url)
            .header("x-rapidapi-key", &self.credentials.key)
            .header("x-rapidapi-host", &self.credentials.host)
            .header("Accept", "application/json")
            .query(&[
                ("dateFrom", window.date_from.to_string()),
                ("dateTo", window.date_to.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Upstream {
                path: path.to_string(),
                detail: format!("status {}", status),
            });
        }

        let raw: Value = resp.json().await.map_err(|e| PipelineError::Upstream {
            path: path.to_string(),
            detail: format!("unparsable body: {}", e),
        })?;

        Ok(extract_match_list(&raw).unwrap_or_default())
    }
}

/// Pull the match list out of a provider payload. Probes the known
/// container keys first; a bare array counts only when its first element
/// structurally resembles a match.
fn extract_match_list(raw: &Value) -> Option<Vec<RawMatch>> {
    for key in CONTAINER_KEYS {
        if let Some(list) = raw.get(key).and_then(Value::as_array) {
            return Some(list.clone());
        }
    }
    if let Some(list) = raw.as_array() {
        if list.first().map(looks_like_match).unwrap_or(false) {
            return Some(list.clone());
        }
    }
    None
}

fn looks_like_match(value: &Value) -> bool {
    value.is_object() && MATCH_MARKER_KEYS.iter().any(|k| value.get(*k).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use serde_json::json;

    fn fetcher(base_url: &str, paths: &[&str]) -> FixtureFetcher {
        FixtureFetcher::new(
            Credentials {
                key: "test-key".into(),
                host: "test-host.example".into(),
            },
            paths.iter().map(|p| p.to_string()).collect(),
            Duration::from_secs(2),
        )
        .unwrap()
        .with_base_url(base_url)
    }

    fn window() -> FetchWindow {
        FetchWindow {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_first_failing_candidate_falls_through_to_next() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/matches")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let body = json!({"matches": [{"homeTeam": {"name": "Ajax"}}]});
        let working = server
            .mock("GET", "/fixtures")
            .match_query(Matcher::Any)
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = fetcher(&server.url(), &["/matches", "/fixtures"])
            .fetch(&window())
            .await;

        failing.assert_async().await;
        working.assert_async().await;
        assert_eq!(result, vec![json!({"homeTeam": {"name": "Ajax"}})]);
    }

    #[tokio::test]
    async fn test_search_stops_at_first_success() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/matches")
            .match_query(Matcher::Any)
            .with_body(json!({"response": [{"fixture": {}}]}).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", "/fixtures")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = fetcher(&server.url(), &["/matches", "/fixtures"])
            .fetch(&window())
            .await;

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_container_advances_to_next_candidate() {
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("GET", "/matches")
            .match_query(Matcher::Any)
            .with_body(json!({"matches": []}).to_string())
            .create_async()
            .await;
        let fallback = server
            .mock("GET", "/fixtures")
            .match_query(Matcher::Any)
            .with_body(json!({"data": [{"match": {"home": "Ajax"}}]}).to_string())
            .create_async()
            .await;

        let result = fetcher(&server.url(), &["/matches", "/fixtures"])
            .fetch(&window())
            .await;

        fallback.assert_async().await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_all_candidates_exhausted_returns_empty() {
        let mut server = mockito::Server::new_async().await;
        let _not_found = server
            .mock("GET", "/matches")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let _garbled = server
            .mock("GET", "/fixtures")
            .match_query(Matcher::Any)
            .with_body("not json")
            .create_async()
            .await;

        let result = fetcher(&server.url(), &["/matches", "/fixtures"])
            .fetch(&window())
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_query_carries_window_and_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/matches")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("dateFrom".into(), "2024-05-01".into()),
                Matcher::UrlEncoded("dateTo".into(), "2024-05-03".into()),
            ]))
            .match_header("x-rapidapi-key", "test-key")
            .match_header("x-rapidapi-host", "test-host.example")
            .with_body(json!({"items": [{"teams": []}]}).to_string())
            .create_async()
            .await;

        let result = fetcher(&server.url(), &["/matches"]).fetch(&window()).await;
        mock.assert_async().await;
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_container_keys_probed_in_priority_order() {
        let payload = json!({
            "data": [{"match": {}}, {"match": {}}],
            "matches": [{"homeTeam": {}}],
        });
        let list = extract_match_list(&payload).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_bare_array_recognized_when_first_element_resembles_match() {
        let payload = json!([{"homeTeam": {"name": "Ajax"}}, {"homeTeam": {"name": "PSV"}}]);
        assert_eq!(extract_match_list(&payload).unwrap().len(), 2);

        let not_matches = json!([{"price": 3}]);
        assert!(extract_match_list(&not_matches).is_none());

        let scalar = json!({"error": "nope"});
        assert!(extract_match_list(&scalar).is_none());
    }
}
