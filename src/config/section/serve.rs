//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! not_found_capacity = 1000   # Distinct 404 paths kept in memory
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the service reachable from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, config_fields};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Maximum number of distinct paths in the 404 log.
    pub not_found_capacity: usize,
}

config_fields!(ServeConfig => ServeFields, "serve" { interface, port, not_found_capacity });

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            not_found_capacity: 1000,
        }
    }
}

impl ServeConfig {
    pub fn not_found_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.not_found_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.not_found_capacity == 0 {
            diag.error(Self::FIELDS.not_found_capacity, "must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nnot_found_capacity = 5",
        );
        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.not_found_capacity().get(), 5);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.serve.not_found_capacity, 1000);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = test_parse_config("[serve]\nnot_found_capacity = 0");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
