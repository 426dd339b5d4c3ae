use std::{env, time::Duration};

use dynamap_core::retry::{RetryPolicy, DEFAULT_RETRYABLE_CODES};

/// Mapper configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix prepended to every table name (default: "")
    pub table_prefix: String,
    /// Wall-clock retry budget per store call in milliseconds (default: 20,000)
    pub retry_timeout_ms: u64,
    /// First backoff delay in milliseconds (default: 50)
    pub retry_initial_backoff_ms: u64,
    /// Backoff cap in milliseconds (default: 5,000)
    pub retry_max_backoff_ms: u64,
    /// Client error codes that are retried instead of failing fast
    pub retryable_codes: Vec<String>,
    /// Delay between table readiness polls in milliseconds (default: 1,000)
    pub poll_interval_ms: u64,
    /// Whether gets, scans and queries use consistent reads (default: false)
    pub consistent_read: bool,
    /// Table holding auto-increment counters (default: "dynamap_sequences")
    pub sequence_table: String,
    /// Custom store endpoint, e.g. DynamoDB Local.
    /// Note: Only used by the `dynamodb` backend.
    pub aws_endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1").
    /// Note: Only used by the `dynamodb` backend.
    pub aws_region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMAP_TABLE_PREFIX` - Table name prefix (default: "")
    /// - `DYNAMAP_RETRY_TIMEOUT_MS` - Retry budget (default: 20,000)
    /// - `DYNAMAP_RETRY_INITIAL_BACKOFF_MS` - First backoff (default: 50)
    /// - `DYNAMAP_RETRY_MAX_BACKOFF_MS` - Backoff cap (default: 5,000)
    /// - `DYNAMAP_RETRYABLE_CODES` - Comma-separated retryable client codes
    /// - `DYNAMAP_POLL_INTERVAL_MS` - Table readiness poll interval (default: 1,000)
    /// - `DYNAMAP_CONSISTENT_READ` - Use consistent reads (default: false)
    /// - `DYNAMAP_SEQUENCE_TABLE` - Auto-increment table (default: "dynamap_sequences")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (optional)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            table_prefix: lookup("DYNAMAP_TABLE_PREFIX").unwrap_or_default(),
            retry_timeout_ms: number("DYNAMAP_RETRY_TIMEOUT_MS", 20_000),
            retry_initial_backoff_ms: number("DYNAMAP_RETRY_INITIAL_BACKOFF_MS", 50),
            retry_max_backoff_ms: number("DYNAMAP_RETRY_MAX_BACKOFF_MS", 5_000),
            retryable_codes: lookup("DYNAMAP_RETRYABLE_CODES")
                .map(|v| parse_codes(&v))
                .unwrap_or_else(|| {
                    DEFAULT_RETRYABLE_CODES
                        .iter()
                        .map(|code| code.to_string())
                        .collect()
                }),
            poll_interval_ms: number("DYNAMAP_POLL_INTERVAL_MS", 1_000),
            consistent_read: lookup("DYNAMAP_CONSISTENT_READ")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            sequence_table: lookup("DYNAMAP_SEQUENCE_TABLE")
                .unwrap_or_else(|| "dynamap_sequences".to_string()),
            aws_endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        }
    }

    /// Retry policy for the executor.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.retry_timeout_ms),
            initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
            retryable_codes: self.retryable_codes.iter().cloned().collect(),
        }
    }

    /// Get the table readiness poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Physical name of a table.
    pub fn table_name(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}
