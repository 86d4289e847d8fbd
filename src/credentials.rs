use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::Credentials;
use crate::pipeline::PipelineError;

/// One place provider credentials may live.
///
/// Sources are consulted in strict order; the key and the host resolve
/// independently, first non-empty value wins. There is deliberately no
/// compiled-in fallback: a deployment with no configuration at all gets a
/// loud `ConfigurationMissing` instead of silently sharing a default secret.
pub trait CredentialSource {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn api_key(&self) -> Option<String>;

    fn api_host(&self) -> Option<String>;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Credentials passed explicitly on the command line.
pub struct CliCredentials {
    key: Option<String>,
    host: Option<String>,
}

impl CredentialSource for CliCredentials {
    fn name(&self) -> &str {
        "command line"
    }

    fn api_key(&self) -> Option<String> {
        non_empty(self.key.clone())
    }

    fn api_host(&self) -> Option<String> {
        non_empty(self.host.clone())
    }
}

/// A JSON settings file deployed next to the binary (site-level settings).
/// An unreadable or malformed file is treated as an empty source.
pub struct SettingsFile {
    values: Value,
}

impl SettingsFile {
    pub fn load(path: &str) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Settings file {} is not valid JSON: {}", path, e);
                    Value::Null
                }
            },
            Err(e) => {
                debug!("Settings file {} not readable: {}", path, e);
                Value::Null
            }
        };
        SettingsFile { values }
    }

    fn get(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| {
            non_empty(self.values.get(*k).and_then(Value::as_str).map(str::to_string))
        })
    }
}

impl CredentialSource for SettingsFile {
    fn name(&self) -> &str {
        "settings file"
    }

    fn api_key(&self) -> Option<String> {
        // Both spellings occur in deployed settings files.
        self.get(&["rapidapi_key", "api_key"])
    }

    fn api_host(&self) -> Option<String> {
        self.get(&["rapidapi_host"])
    }
}

/// Named environment variables, project-scoped name first.
pub struct EnvCredentials;

const KEY_VARS: [&str; 2] = ["MATCHDAY_RAPIDAPI_KEY", "RAPIDAPI_KEY"];
const HOST_VARS: [&str; 2] = ["MATCHDAY_RAPIDAPI_HOST", "RAPIDAPI_HOST"];

impl EnvCredentials {
    fn first_set(vars: &[&str]) -> Option<String> {
        vars.iter().find_map(|v| non_empty(std::env::var(v).ok()))
    }
}

impl CredentialSource for EnvCredentials {
    fn name(&self) -> &str {
        "environment"
    }

    fn api_key(&self) -> Option<String> {
        Self::first_set(&KEY_VARS)
    }

    fn api_host(&self) -> Option<String> {
        Self::first_set(&HOST_VARS)
    }
}

/// Resolves provider credentials from an ordered list of sources.
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    /// The settings file is the structured configuration store and outranks
    /// per-invocation flags; the environment is consulted last.
    pub fn from_config(config: &Config) -> Self {
        Self::with_sources(vec![
            Box::new(SettingsFile::load(&config.settings_path)),
            Box::new(CliCredentials {
                key: config.api_key.clone(),
                host: config.api_host.clone(),
            }),
            Box::new(EnvCredentials),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        CredentialResolver { sources }
    }

    /// First non-empty value per field across the sources, in order.
    pub fn resolve(&self) -> Result<Credentials, PipelineError> {
        let mut key: Option<String> = None;
        let mut host: Option<String> = None;
        for source in &self.sources {
            if key.is_none() {
                if let Some(k) = source.api_key() {
                    debug!("API key resolved from {}", source.name());
                    key = Some(k);
                }
            }
            if host.is_none() {
                if let Some(h) = source.api_host() {
                    debug!("API host resolved from {}", source.name());
                    host = Some(h);
                }
            }
            if key.is_some() && host.is_some() {
                break;
            }
        }

        match (key, host) {
            (Some(key), Some(host)) => Ok(Credentials { key, host }),
            (key, host) => {
                let mut missing = Vec::new();
                if key.is_none() {
                    missing.push("api key");
                }
                if host.is_none() {
                    missing.push("api host");
                }
                Err(PipelineError::ConfigurationMissing(missing.join(" and ")))
            }
        }
    }
}
