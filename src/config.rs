use chrono::{Days, FixedOffset, NaiveDate};
use clap::Parser;

use crate::models::FetchWindow;

/// Football fixture pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "matchday", version, about)]
pub struct Config {
    /// Provider API key (highest-precedence credential source)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Provider API host, e.g. free-api-live-football-data.p.rapidapi.com
    #[arg(long)]
    pub api_host: Option<String>,

    /// JSON settings file holding rapidapi_key / rapidapi_host
    #[arg(long, env = "MATCHDAY_SETTINGS", default_value = "matchday.settings.json")]
    pub settings_path: String,

    /// JSON file overriding the normalizer's field alias table
    #[arg(long, env = "MATCHDAY_ALIASES")]
    pub aliases_path: Option<String>,

    /// Candidate endpoint paths, tried in order until one yields data
    #[arg(
        long,
        env = "MATCHDAY_ENDPOINTS",
        value_delimiter = ',',
        default_value = "/matches,/fixtures,/livescores,/fixtures/date"
    )]
    pub endpoints: Vec<String>,

    /// Days before today included in the default fetch window
    #[arg(long, env = "LOOKBACK_DAYS", default_value = "1")]
    pub lookback_days: u64,

    /// Days after today included in the default fetch window
    #[arg(long, env = "LOOKAHEAD_DAYS", default_value = "1")]
    pub lookahead_days: u64,

    /// Explicit window start (ISO date, overrides --lookback-days)
    #[arg(long)]
    pub date_from: Option<NaiveDate>,

    /// Explicit window end (ISO date, overrides --lookahead-days)
    #[arg(long)]
    pub date_to: Option<NaiveDate>,

    /// Maximum number of finished results shown
    #[arg(long, env = "RESULTS_CAP", default_value = "3")]
    pub results_cap: usize,

    /// Maximum number of news items shown
    #[arg(long, env = "NEWS_CAP", default_value = "2")]
    pub news_cap: usize,

    /// Maximum number of score lines shown
    #[arg(long, env = "SCORES_CAP", default_value = "3")]
    pub scores_cap: usize,

    /// Display timezone as a fixed UTC offset, e.g. +02:00
    #[arg(long, env = "DISPLAY_TZ_OFFSET", default_value = "+02:00")]
    pub display_tz_offset: String,

    /// Per-endpoint attempt timeout in seconds
    #[arg(long, env = "ATTEMPT_TIMEOUT_SECS", default_value = "8")]
    pub attempt_timeout_secs: u64,

    /// Overall pipeline deadline in seconds; in-flight attempts are
    /// abandoned when it expires
    #[arg(long, env = "DEADLINE_SECS", default_value = "45")]
    pub deadline_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("at least one candidate endpoint is required");
        }
        if self.results_cap == 0 || self.news_cap == 0 || self.scores_cap == 0 {
            anyhow::bail!("view caps must be at least 1");
        }
        if !(1..=30).contains(&self.attempt_timeout_secs) {
            anyhow::bail!("attempt_timeout_secs must be between 1 and 30");
        }
        if self.deadline_secs < self.attempt_timeout_secs {
            anyhow::bail!("deadline_secs must be at least attempt_timeout_secs");
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                anyhow::bail!("date_from must not be after date_to");
            }
        }
        self.display_offset()?;
        Ok(())
    }

    /// The fetch window for this invocation: explicit dates when given,
    /// otherwise a rolling window around `today`.
    pub fn window(&self, today: NaiveDate) -> FetchWindow {
        let date_from = self
            .date_from
            .unwrap_or_else(|| today - Days::new(self.lookback_days));
        let date_to = self
            .date_to
            .unwrap_or_else(|| today + Days::new(self.lookahead_days));
        FetchWindow { date_from, date_to }
    }

    pub fn display_offset(&self) -> anyhow::Result<FixedOffset> {
        self.display_tz_offset.parse::<FixedOffset>().map_err(|e| {
            anyhow::anyhow!(
                "display_tz_offset '{}' is not a valid UTC offset: {}",
                self.display_tz_offset,
                e
            )
        })
    }
}
