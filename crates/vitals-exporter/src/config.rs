//! Exporter configuration.

use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9200)),
        }
    }
}

impl ExporterConfig {
    /// Creates a configuration with the given bind address.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// Sets the bind address.
    #[must_use]
    pub const fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Returns the endpoint URL scrapers should be pointed at.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/metrics", self.bind_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback() {
        let config = ExporterConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:9200".parse().unwrap());
    }

    #[test]
    fn with_bind_addr_overrides() {
        let addr: SocketAddr = "0.0.0.0:9999".parse().unwrap();
        let config = ExporterConfig::default().with_bind_addr(addr);
        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn endpoint_points_at_metrics_path() {
        let config = ExporterConfig::default();
        assert_eq!(config.endpoint(), "http://127.0.0.1:9200/metrics");
    }
}
