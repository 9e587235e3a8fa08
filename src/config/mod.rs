
use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::warn;

use crate::tracker::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub matching: MatchingConfig,
    pub tracker: TrackerConfig,
    /// Values that were present but invalid and replaced by their defaults.
    pub warnings: Vec<String>
}

#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// First date from which transaction timestamps take part in matching.
    pub timestamp_cutover: Option<NaiveDate>
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How long an activity may wait for its last results before it times out.
    pub timeout: Duration,
    pub sweep_interval: Duration,
    /// Number of partitions enrichment messages are spread over.
    pub lanes: usize,
    pub user_cache_capacity: u64,
    pub user_cache_ttl: Duration,
    pub retry: RetryPolicy
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            lanes: 16,
            user_cache_capacity: 10_000,
            user_cache_ttl: Duration::from_secs(300),
            retry: RetryPolicy::default()
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults for missing or invalid values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = TrackerConfig::default();
        let mut values = Values { lookup, warnings: Vec::new() };

        let timestamp_cutover = values.date("MATCHER_TIMESTAMP_CUTOVER");
        let matching = MatchingConfig { timestamp_cutover };
        let tracker = TrackerConfig {
            timeout: Duration::from_secs(values.parse_or("ENRICHMENT_TIMEOUT_SECS", defaults.timeout.as_secs())),
            sweep_interval: Duration::from_secs(values.parse_or("ENRICHMENT_SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())),
            lanes: values.parse_or("ENRICHMENT_LANES", defaults.lanes).max(1),
            user_cache_capacity: values.parse_or("USER_CACHE_CAPACITY", defaults.user_cache_capacity),
            user_cache_ttl: Duration::from_secs(values.parse_or("USER_CACHE_TTL_SECS", defaults.user_cache_ttl.as_secs())),
            retry: RetryPolicy {
                max_retries: values.parse_or("PUBLISH_MAX_RETRIES", defaults.retry.max_retries),
                initial_backoff: Duration::from_millis(values.parse_or(
                    "PUBLISH_INITIAL_BACKOFF_MS",
                    defaults.retry.initial_backoff.as_millis() as u64
                )),
                max_backoff: defaults.retry.max_backoff
            }
        };

        Self {
            log_level: (values.lookup)("LOG_LEVEL").unwrap_or_else(|| "error".to_string()),
            matching,
            tracker,
            warnings: values.warnings
        }
    }

    /// Reports invalid values once logging is set up.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
    }
}

struct Values<L> {
    lookup: L,
    warnings: Vec<String>
}

impl<L: Fn(&str) -> Option<String>> Values<L> {
    fn parse_or<T: FromStr>(&mut self, key: &str, default: T) -> T {
        match (self.lookup)(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                self.warnings.push(format!("Invalid value [{raw}] for [{key}], using the default"));
                default
            })
        }
    }

    fn date(&mut self, key: &str) -> Option<NaiveDate> {
        let raw = (self.lookup)(key)?;

        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(error) => {
                self.warnings.push(format!("Invalid value [{raw}] for [{key}], ignoring it: {error}"));
                None
            }
        }
    }
}
