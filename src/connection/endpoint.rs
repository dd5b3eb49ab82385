//! Endpoint Configuration
//!
//! An [`Endpoint`] identifies one server's connection target: address,
//! database index, optional password, and optional I/O deadlines. It is
//! immutable once constructed; connections hold it by value.

use std::time::Duration;

/// Connection target for one server.
///
/// # Example
///
/// ```
/// use shoal::connection::Endpoint;
/// use std::time::Duration;
///
/// let endpoint = Endpoint {
///     host: "cache-1.internal".to_string(),
///     port: 6380,
///     db: 2,
///     password: Some("hunter2".to_string()),
///     read_timeout: Some(Duration::from_secs(5)),
///     ..Endpoint::default()
/// };
/// assert_eq!(endpoint.addr(), "cache-1.internal:6380");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Server hostname or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database index; a non-zero value is selected right after connecting.
    pub db: u32,
    /// Optional password; when set, AUTH is issued right after connecting.
    pub password: Option<String>,
    /// Optional TCP connect deadline. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Optional deadline for each socket read. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    /// Optional deadline for each socket write. `None` waits indefinitely.
    pub write_timeout: Option<Duration>,
}

impl Endpoint {
    /// Creates an endpoint for `host:port` with default database 0 and no
    /// password or deadlines.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
            ..Endpoint::default()
        }
    }

    /// Returns the dialable `host:port` address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            db: 0,
            password: None,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
