//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! threads = 4                 # Request worker threads
//! admin_prefix = "/wp-admin"  # paths treated as administrative screens
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Host server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Request worker threads.
    pub threads: usize,

    /// URL prefix of administrative screens; those pages are passed through
    /// without rewriting or cache headers.
    pub admin_prefix: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            threads: 4,
            admin_prefix: "/wp-admin".into(),
        }
    }
}

impl ServeConfig {
    pub const THREADS: FieldPath = FieldPath::new("serve.threads");

    pub const ADMIN_PREFIX: FieldPath = FieldPath::new("serve.admin_prefix");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.threads == 0 {
            diag.error(Self::THREADS, format!("{} must be at least 1", Self::THREADS));
        }
        if !self.admin_prefix.is_empty() && !self.admin_prefix.starts_with('/') {
            diag.error(
                Self::ADMIN_PREFIX,
                format!("{} must start with `/`", Self::ADMIN_PREFIX),
            );
        }
    }

    /// Whether `path` is an administrative screen.
    ///
    /// The prefix matches whole segments: `/wp-admin` covers `/wp-admin/...`
    /// but not `/wp-administrator`.
    pub fn is_admin_path(&self, path: &str) -> bool {
        if self.admin_prefix.is_empty() {
            return false;
        }
        let prefix = self.admin_prefix.trim_end_matches('/');
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_serve_config() {
        let config = test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 5277);
        assert_eq!(config.serve.threads, 4);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_admin_prefix() {
        let config = test_parse_config("");
        assert!(config.serve.is_admin_path("/wp-admin/edit.php"));
        assert!(!config.serve.is_admin_path("/blog/"));
        assert!(config.serve.is_admin_path("/wp-admin"));
        assert!(!config.serve.is_admin_path("/wp-administrator"));
        assert!(!config.serve.is_admin_path("/wp-admin.php"));

        let config = test_parse_config("[serve]\nadmin_prefix = \"/wp-admin/\"");
        assert!(config.serve.is_admin_path("/wp-admin/users.php"));
        assert!(!config.serve.is_admin_path("/wp-admins/"));

        let config = test_parse_config("[serve]\nadmin_prefix = \"\"");
        assert!(!config.serve.is_admin_path("/wp-admin/"));
    }

    #[test]
    fn test_serve_zero_threads_rejected() {
        let config = test_parse_config("[serve]\nthreads = 0");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
