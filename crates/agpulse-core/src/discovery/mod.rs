//! Discovery of the Antigravity language server's local endpoint and token.
//!
//! Absence is a normal outcome (the editor may simply not be running), so
//! [`Locator::locate`] returns `Option` and never an error.

pub mod ports;
pub mod process;

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::quota::client::localhost_client;
use crate::quota::Scheme;
use ports::{listening_ports, probe_ports, push_unique};
use process::{find_companion, list_processes};

/// Loopback address every companion endpoint lives on
pub const LOCALHOST: &str = "127.0.0.1";

/// Environment variable overriding the discovered port
pub const PORT_ENV: &str = "AGPULSE_PORT";

/// Environment variable overriding the discovered CSRF token
pub const TOKEN_ENV: &str = "AGPULSE_CSRF_TOKEN";

/// Default timeout for each port probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Localhost endpoint plus the session token issued by the companion.
///
/// Can only be built through [`EndpointCredential::new`], so a present value
/// always has a non-empty host, a non-zero port, and a non-empty token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCredential {
    host: String,
    port: u16,
    csrf_token: String,
}

impl EndpointCredential {
    /// Create a credential, rejecting empty fields
    pub fn new(host: impl Into<String>, port: u16, csrf_token: impl Into<String>) -> Option<Self> {
        let host = host.into();
        let csrf_token = csrf_token.into();
        if host.is_empty() || port == 0 || csrf_token.is_empty() {
            return None;
        }
        Some(Self {
            host,
            port,
            csrf_token,
        })
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the companion's API
    pub fn port(&self) -> u16 {
        self.port
    }

    /// CSRF token sent with every request
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// Source of endpoint credentials
pub trait Locator: Send + Sync {
    /// Find the companion's endpoint, or `None` if it cannot be found
    fn locate(&self) -> impl Future<Output = Option<EndpointCredential>> + Send;
}

/// Locator that scans the local process table and probes listening ports
#[derive(Debug, Clone)]
pub struct ProcessLocator {
    http: reqwest::Client,
    scheme: Scheme,
    port_override: Option<u16>,
    token_override: Option<String>,
}

impl ProcessLocator {
    /// Create a locator with the default probe timeout
    pub fn new() -> Self {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a locator with a custom probe timeout
    pub fn with_probe_timeout(timeout: Duration) -> Self {
        Self {
            http: localhost_client(timeout),
            scheme: Scheme::Https,
            port_override: None,
            token_override: None,
        }
    }

    /// Use a fixed port/token pair from the config file.
    ///
    /// Environment variables still take precedence per field.
    pub fn with_override(mut self, port: Option<u16>, csrf_token: Option<String>) -> Self {
        self.port_override = port;
        self.token_override = csrf_token.filter(|t| !t.is_empty());
        self
    }

    /// Override the URL scheme used for probes
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Credential from environment or config, if both halves are known
    fn override_credential(&self) -> Option<EndpointCredential> {
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .or(self.port_override)?;
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.token_override.clone())?;
        EndpointCredential::new(LOCALHOST, port, token.trim())
    }

    /// Scan processes, enumerate ports, and probe them
    async fn scan(&self) -> Option<EndpointCredential> {
        let found = tokio::task::spawn_blocking(|| {
            let processes = list_processes();
            let companion = find_companion(&processes)?;
            let mut candidates = listening_ports(companion.pid);
            if let Some(port) = companion.extension_server_port {
                push_unique(&mut candidates, port);
            }
            Some((companion, candidates))
        })
        .await;

        let (companion, candidates) = match found {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!("Discovery: no Antigravity language server process");
                return None;
            }
            Err(e) => {
                debug!("Discovery: process scan task failed: {}", e);
                return None;
            }
        };

        debug!(
            "Discovery: pid {} with candidate ports {:?}",
            companion.pid, candidates
        );

        let port = probe_ports(
            &self.http,
            self.scheme,
            LOCALHOST,
            &candidates,
            &companion.csrf_token,
        )
        .await?;
        info!("Discovery: language server API on port {}", port);
        EndpointCredential::new(LOCALHOST, port, companion.csrf_token)
    }
}

impl Default for ProcessLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Locator for ProcessLocator {
    async fn locate(&self) -> Option<EndpointCredential> {
        if let Some(credential) = self.override_credential() {
            info!("Discovery: using configured port {}", credential.port());
            return Some(credential);
        }
        self.scan().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_empty_fields() {
        assert!(EndpointCredential::new("127.0.0.1", 4100, "tok").is_some());
        assert!(EndpointCredential::new("", 4100, "tok").is_none());
        assert!(EndpointCredential::new("127.0.0.1", 0, "tok").is_none());
        assert!(EndpointCredential::new("127.0.0.1", 4100, "").is_none());
    }

    #[test]
    fn test_override_from_env() {
        temp_env::with_vars(
            [(PORT_ENV, Some("4100")), (TOKEN_ENV, Some("from-env"))],
            || {
                let cred = ProcessLocator::new().override_credential().unwrap();
                assert_eq!(cred.port(), 4100);
                assert_eq!(cred.csrf_token(), "from-env");
                assert_eq!(cred.host(), LOCALHOST);
            },
        );
    }

    #[test]
    fn test_override_env_takes_precedence_per_field() {
        temp_env::with_vars(
            [(PORT_ENV, Some("not-a-port")), (TOKEN_ENV, Some("from-env"))],
            || {
                let locator =
                    ProcessLocator::new().with_override(Some(5200), Some("from-config".into()));
                let cred = locator.override_credential().unwrap();
                assert_eq!(cred.port(), 5200);
                assert_eq!(cred.csrf_token(), "from-env");
            },
        );
    }

    #[test]
    fn test_override_needs_both_halves() {
        temp_env::with_vars_unset([PORT_ENV, TOKEN_ENV], || {
            let locator = ProcessLocator::new().with_override(Some(5200), None);
            assert!(locator.override_credential().is_none());

            let locator = ProcessLocator::new().with_override(Some(5200), Some("tok".into()));
            assert_eq!(locator.override_credential().unwrap().port(), 5200);
        });
    }

    #[tokio::test]
    async fn test_locate_prefers_override_without_scanning() {
        let locator = ProcessLocator::new().with_override(Some(6100), Some("tok".into()));
        // Env vars may be set in the caller's shell; only assert presence
        assert!(locator.locate().await.is_some());
    }
}
