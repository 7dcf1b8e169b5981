//! Error types for the RoadWeave offline cache proxy

use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    Cache(versioned_response_cache::CacheError),
    Precache(String),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Cache(err) => write!(f, "Cache error: {}", err),
            ProxyError::Precache(msg) => write!(f, "Precache failed: {}", msg),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Cache(err) => Some(err),
            ProxyError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<versioned_response_cache::CacheError> for ProxyError {
    fn from(err: versioned_response_cache::CacheError) -> Self {
        ProxyError::Cache(err)
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precache_error_display() {
        let err = ProxyError::Precache("/logo.png returned status 404".to_string());
        assert_eq!(
            format!("{}", err),
            "Precache failed: /logo.png returned status 404"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ProxyError::Config("missing UPSTREAM_URL".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing UPSTREAM_URL");
    }

    #[test]
    fn test_cache_error_display() {
        let err = ProxyError::from(versioned_response_cache::CacheError::Store(
            "invalid cache name".to_string(),
        ));
        assert!(format!("{}", err).contains("invalid cache name"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = ProxyError::Precache("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Precache"));
    }
}
