//! Endpoint address parsing.
//!
//! The in-tree transport speaks `mem://host/path` addresses; other
//! schemes are rejected at parse time so misuse surfaces synchronously.

use std::fmt;
use std::str::FromStr;

/// Transport endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// In-process channel transport: `mem://host/path`
    Memory {
        /// Registry name of the host
        host: String,
        /// Registered path on the host, with leading slash
        path: String,
    },
}

impl Endpoint {
    /// Parse an endpoint from a string.
    ///
    /// ```
    /// use strandmq_core::endpoint::Endpoint;
    ///
    /// let ep = Endpoint::parse("mem://broker/frontend").unwrap();
    /// let Endpoint::Memory { host, path } = ep;
    /// assert_eq!(host, "broker");
    /// assert_eq!(path, "/frontend");
    /// ```
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("mem://") {
            let (host, path) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, "/"),
            };
            if host.is_empty() {
                return Err(EndpointError::InvalidAddress(
                    "memory host name cannot be empty".to_string(),
                ));
            }
            Ok(Endpoint::Memory {
                host: host.to_string(),
                path: path.to_string(),
            })
        } else {
            Err(EndpointError::UnsupportedScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Memory { host, path } => write!(f, "mem://{host}{path}"),
        }
    }
}

/// Errors that can occur when parsing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("unsupported transport: {0} (expected mem://)")]
    UnsupportedScheme(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl From<EndpointError> for crate::error::SocketError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::UnsupportedScheme(addr) => Self::UnsupportedTransport(addr),
            EndpointError::InvalidAddress(addr) => Self::InvalidAddress(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory() {
        let ep = Endpoint::parse("mem://srv/a/b").unwrap();
        assert_eq!(ep.to_string(), "mem://srv/a/b");
    }

    #[test]
    fn test_parse_default_path() {
        let Endpoint::Memory { host, path } = Endpoint::parse("mem://srv").unwrap();
        assert_eq!(host, "srv");
        assert_eq!(path, "/");
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = Endpoint::parse("tcp://127.0.0.1:5555");
        assert!(matches!(result, Err(EndpointError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_empty_host() {
        let result = Endpoint::parse("mem:///path");
        assert!(matches!(result, Err(EndpointError::InvalidAddress(_))));
    }
}
