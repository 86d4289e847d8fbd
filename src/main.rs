use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod categorize;
mod config;
mod credentials;
mod fetch;
mod models;
mod normalize;
mod pipeline;

use config::Config;
use pipeline::PipelineError;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging; stdout is reserved for the view JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    match pipeline::run(&config).await {
        Ok(view) => {
            info!(
                "Categorized view ready: {} results, {} news, {} scores, {} days",
                view.results.len(),
                view.news.len(),
                view.scores.len(),
                view.grouped_by_day.len()
            );
            // The Presenter consumes the view as JSON on stdout.
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        Err(e) => {
            if let Some(PipelineError::ConfigurationMissing(_)) = e.downcast_ref::<PipelineError>()
            {
                // Distinct "pipeline unavailable" signal: the Presenter shows
                // a configuration-needed message instead of empty data.
                error!("Pipeline unavailable: {}", e);
                std::process::exit(2);
            }
            Err(e)
        }
    }
}
