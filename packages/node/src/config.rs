//! Node configuration, populated from environment variables.

use std::net::SocketAddr;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration for a Sociograph node.
///
/// All fields are populated from environment variables with sensible
/// defaults, so a node can be started with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SOCIOGRAPH_BIND` | `0.0.0.0:8000` | TCP socket address to listen on |
/// | `SOCIOGRAPH_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `SOCIOGRAPH_PAGE_SIZE` | `20` | Feed page size when `limit` is omitted |
/// | `SOCIOGRAPH_MAX_PAGE_SIZE` | `100` | Upper bound for `limit` |
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    /// Feed page size used when a request does not pass `limit`.
    pub page_size: u32,

    /// Largest `limit` a feed request may ask for.
    pub max_page_size: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            db_path: None,
            page_size: 20,
            max_page_size: 100,
        }
    }
}

impl NodeConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`NodeConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("SOCIOGRAPH_BIND") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "SOCIOGRAPH_BIND",
                expected: "a socket address such as 0.0.0.0:8000",
                value: v,
            })?,
            None => defaults.bind_addr,
        };

        let page_size = parse_page_size(&lookup, "SOCIOGRAPH_PAGE_SIZE", defaults.page_size)?;
        let max_page_size = page_size_at_least(
            parse_page_size(&lookup, "SOCIOGRAPH_MAX_PAGE_SIZE", defaults.max_page_size)?,
            page_size,
        )?;

        Ok(Self {
            bind_addr,
            db_path: lookup("SOCIOGRAPH_DB").filter(|p| !p.trim().is_empty()),
            page_size,
            max_page_size,
        })
    }

    /// The page size to use for a feed request asking for `requested`.
    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size)
    }
}

fn parse_page_size(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(v) => match v.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid {
                var,
                expected: "a positive integer",
                value: v,
            }),
        },
    }
}

fn page_size_at_least(max: u32, page_size: u32) -> Result<u32, ConfigError> {
    if max < page_size {
        return Err(ConfigError::Invalid {
            var: "SOCIOGRAPH_MAX_PAGE_SIZE",
            expected: "at least SOCIOGRAPH_PAGE_SIZE",
            value: max.to_string(),
        });
    }
    Ok(max)
}
