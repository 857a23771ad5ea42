//! Endpoint configuration loading.
//!
//! The config file is line-oriented UTF-8: each non-blank line is
//! `URL[,INTERVAL_MS]`. URLs without an `http://` or `https://` scheme
//! get `http://` prepended; the interval defaults to 1000 ms.

use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected URL[,INTERVAL_MS], got {found} fields")]
    TooManyFields { line: usize, found: usize },

    #[error("line {line}: check interval must be a positive integer, got {value:?}")]
    BadInterval { line: usize, value: String },
}

/// One endpoint to monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Normalised URL, always carrying a scheme.
    pub url: String,
    pub check_interval_ms: u64,
}

impl EndpointConfig {
    /// Build a config, prepending `http://` when `url` has no scheme.
    pub fn new(url: impl Into<String>, check_interval_ms: u64) -> Self {
        let raw = url.into();
        let url = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw
        } else {
            format!("http://{raw}")
        };
        Self {
            url,
            check_interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

/// Load endpoint definitions from a config file.
pub fn load(path: &Path) -> Result<Vec<EndpointConfig>, ConfigError> {
    parse(&fs::read_to_string(path)?)
}

/// Parse config text. Blank lines are skipped; duplicate URLs after
/// scheme normalisation keep their first occurrence.
pub fn parse(content: &str) -> Result<Vec<EndpointConfig>, ConfigError> {
    let mut endpoints: Vec<EndpointConfig> = Vec::new();
    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() > 2 {
            return Err(ConfigError::TooManyFields {
                line: idx + 1,
                found: fields.len(),
            });
        }

        let interval = match fields.get(1) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::BadInterval {
                        line: idx + 1,
                        value: (*raw).to_string(),
                    })
                }
            },
            None => DEFAULT_CHECK_INTERVAL_MS,
        };

        let endpoint = EndpointConfig::new(fields[0], interval);
        if endpoints.iter().all(|existing| existing.url != endpoint.url) {
            endpoints.push(endpoint);
        }
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls_with_and_without_intervals() {
        let endpoints = parse("example.com\nhttp://a.test,500\n").unwrap();
        assert_eq!(
            endpoints,
            vec![
                EndpointConfig::new("http://example.com", 1000),
                EndpointConfig::new("http://a.test", 500),
            ]
        );
    }

    #[test]
    fn scheme_is_preserved_when_present() {
        let endpoints = parse("https://secure.test,250\n").unwrap();
        assert_eq!(endpoints[0].url, "https://secure.test");
        assert_eq!(endpoints[0].interval(), Duration::from_millis(250));
    }

    #[test]
    fn more_than_two_fields_is_a_syntax_error() {
        assert!(matches!(
            parse("x,y,z"),
            Err(ConfigError::TooManyFields { line: 1, found: 3 })
        ));
    }

    #[test]
    fn non_integer_interval_is_a_syntax_error() {
        assert!(matches!(
            parse("x,abc"),
            Err(ConfigError::BadInterval { line: 1, .. })
        ));
    }

    #[test]
    fn zero_or_negative_intervals_are_rejected() {
        assert!(matches!(parse("x,0"), Err(ConfigError::BadInterval { .. })));
        assert!(matches!(parse("x,-50"), Err(ConfigError::BadInterval { .. })));
    }

    #[test]
    fn duplicate_urls_keep_the_first_occurrence() {
        let endpoints = parse("example.com,500\nhttp://example.com,900\n").unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].check_interval_ms, 500);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let endpoints = parse("\nexample.com\n\n").unwrap();
        assert_eq!(endpoints.len(), 1);
    }
}
