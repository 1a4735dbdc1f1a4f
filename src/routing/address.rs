//! Backend address normalization.
//!
//! Redirect targets arrive either as a bare `host:port` or as a full URL such
//! as `http://new-server:8081/process`. Both forms collapse to one canonical
//! `host:port` authority; the forwarding path is owned by the client, so any
//! path or query carried by a full URL is dropped.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Errors produced while normalizing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("unsupported scheme {0:?} (only http is supported)")]
    UnsupportedScheme(String),

    #[error("invalid address {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// Canonical network location of a backend (`host:port`, port always explicit).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendAddress {
    authority: String,
}

impl BackendAddress {
    /// Normalize a bare `host[:port]` or an `http://` URL.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        // The URL parser would read "http:///process" as host "process".
        if trimmed.starts_with('/') {
            return Err(AddressError::Invalid {
                input: trimmed.to_string(),
                reason: "relative reference has no host".to_string(),
            });
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let url = Url::parse(&candidate).map_err(|e| AddressError::Invalid {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(AddressError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AddressError::Invalid {
                input: trimmed.to_string(),
                reason: "missing host".to_string(),
            })?;
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self {
            authority: format!("{host}:{port}"),
        })
    }

    /// The `host:port` authority.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Full URL for `path` on this backend.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("http://{}{}", self.authority, path)
        } else {
            format!("http://{}/{}", self.authority, path)
        }
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority)
    }
}
