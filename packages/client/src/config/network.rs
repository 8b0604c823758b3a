//! Raw socket tuning applied to every TCP connection this crate opens.

use std::time::Duration;

/// TCP socket options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    pub nodelay: bool,
    pub keepalive: Option<Duration>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}
