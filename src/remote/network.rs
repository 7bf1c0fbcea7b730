//! Network reachability check
//!
//! Sync refuses to start when the remote host can't be reached, so an offline
//! machine fails fast instead of waiting out request timeouts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::RemoteSettings;

/// Answers whether the network is usable right now
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_available(&self) -> bool;
}

/// Opens a TCP connection to the remote host
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host named in `remote.url`
    ///
    /// Returns `None` when the URL has no host to probe.
    pub fn from_settings(settings: &RemoteSettings) -> Option<Self> {
        let url = Url::parse(settings.url.trim()).ok()?;
        let host = url.host_str()?.to_string();
        let port = url.port_or_known_default()?;
        Some(Self::new(
            host,
            port,
            Duration::from_secs(settings.probe_timeout_secs.max(1)),
        ))
    }

    pub fn target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn is_available(&self) -> bool {
        let addr = (self.host.as_str(), self.port);
        match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => {
                debug!(host = %self.host, port = self.port, "Remote host reachable");
                true
            }
            Ok(Err(e)) => {
                warn!(host = %self.host, port = self.port, error = %e, "Remote host unreachable");
                false
            }
            Err(_) => {
                warn!(host = %self.host, port = self.port, "Reachability probe timed out");
                false
            }
        }
    }
}

/// Probe with a fixed answer, for when there is nothing to probe
pub struct StaticProbe(pub bool);

#[async_trait]
impl NetworkProbe for StaticProbe {
    async fn is_available(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_from_settings_uses_default_port() {
        let settings = RemoteSettings {
            url: "https://abc.supabase.co".into(),
            ..RemoteSettings::default()
        };
        let probe = TcpProbe::from_settings(&settings).unwrap();
        assert_eq!(probe.target(), ("abc.supabase.co", 443));
    }

    #[test]
    fn test_from_settings_rejects_missing_url() {
        assert!(TcpProbe::from_settings(&RemoteSettings::default()).is_none());
    }

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(1));
        assert!(probe.is_available().await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new("127.0.0.1", port, Duration::from_secs(1));
        assert!(!probe.is_available().await);
    }

    #[tokio::test]
    async fn test_static_probe() {
        assert!(StaticProbe(true).is_available().await);
        assert!(!StaticProbe(false).is_available().await);
    }
}
