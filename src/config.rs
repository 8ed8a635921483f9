//! Client configuration.
//!
//! A [`Configuration`] is a plain value: build it with [`Configuration::default`],
//! [`Configuration::from_env`] or the `with_*` helpers, then hand it to
//! [`AnnotationClient::new`](crate::AnnotationClient::new). The client keeps its own
//! copy, so later changes to the original value never affect a running client.
//!
//! # Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TRIANNON_HOST` | `host` |
//! | `TRIANNON_USER` / `TRIANNON_PASS` | `user` / `pass` (legacy basic auth) |
//! | `TRIANNON_CLIENT_ID` / `TRIANNON_CLIENT_PASS` | `client_id` / `client_pass` |
//! | `TRIANNON_CONTAINER` | `container` |
//! | `TRIANNON_CONTAINER_USER` | `container_user` |
//! | `TRIANNON_CONTAINER_WORKGROUPS` | `container_workgroups` |
//! | `TRIANNON_LOG_FILE` | `log_file` |
//! | `DEBUG` | `debug` (`true`, any case) |
//! | `HTTP_PROXY` / `http_proxy` | `proxy_url` |
//!
//! # Examples
//!
//! ```
//! use triannon_client::Configuration;
//!
//! let config = Configuration::default()
//!     .with_host("http://annotations.example.org")
//!     .with_container("annotations/foo");
//! assert_eq!(config.container, "/annotations/foo/");
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Default annotation server.
pub const DEFAULT_HOST: &str = "http://localhost:3000";

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "triannon_client.log";

/// Connection parameters for one annotation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Server base URL
    pub host: String,
    /// Legacy basic-auth user (basic auth is only sent when non-empty)
    pub user: String,
    /// Legacy basic-auth password
    pub pass: String,
    /// Client id for bearer-token acquisition (empty means anonymous)
    pub client_id: String,
    /// Client secret for bearer-token acquisition
    pub client_pass: String,
    /// Container path, always starting and ending with `/`
    pub container: String,
    /// User id presented at login during token acquisition
    pub container_user: String,
    /// Comma separated workgroups presented at login
    pub container_workgroups: String,
    /// Verbose logging
    pub debug: bool,
    /// Log file used by [`init_logging`](crate::logging::init_logging)
    pub log_file: PathBuf,
    /// Optional proxy for all requests
    pub proxy_url: Option<String>,
    /// TCP connect timeout
    pub connect_timeout_ms: u64,
    /// Read timeout for a whole response
    pub read_timeout_ms: u64,
    /// Counted POST attempts before giving up
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` sleeps `n * retry_delay_ms`
    pub retry_delay_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user: String::new(),
            pass: String::new(),
            client_id: String::new(),
            client_pass: String::new(),
            container: normalize_container(""),
            container_user: String::new(),
            container_workgroups: String::new(),
            debug: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            proxy_url: None,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            max_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl Configuration {
    /// Load a `.env` file if present, then read the process environment.
    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.debug = var("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if let Some(host) = var("TRIANNON_HOST") {
            config.host = host;
        }
        config.user = var("TRIANNON_USER").unwrap_or_default();
        config.pass = var("TRIANNON_PASS").unwrap_or_default();
        config.client_id = var("TRIANNON_CLIENT_ID").unwrap_or_default();
        config.client_pass = var("TRIANNON_CLIENT_PASS").unwrap_or_default();
        config.container = normalize_container(&var("TRIANNON_CONTAINER").unwrap_or_default());
        config.container_user = var("TRIANNON_CONTAINER_USER").unwrap_or_default();
        config.container_workgroups = var("TRIANNON_CONTAINER_WORKGROUPS").unwrap_or_default();
        if let Some(log_file) = var("TRIANNON_LOG_FILE") {
            config.log_file = PathBuf::from(log_file);
        }
        config.proxy_url = var("HTTP_PROXY").or_else(|| var("http_proxy"));
        config
    }

    /// Copy with a different server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Copy with a different container; the path is normalized.
    pub fn with_container(mut self, container: &str) -> Self {
        self.container = normalize_container(container);
        self
    }

    /// Copy with client credentials for bearer-token acquisition.
    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_pass: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_pass = client_pass.into();
        self
    }

    /// Copy with the login identity used during token acquisition.
    pub fn with_container_login(
        mut self,
        user: impl Into<String>,
        workgroups: impl Into<String>,
    ) -> Self {
        self.container_user = user.into();
        self.container_workgroups = workgroups.into();
        self
    }

    /// Copy with a different retry policy.
    pub fn with_retries(mut self, max_attempts: u32, retry_delay_ms: u64) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// True when a client id is configured; otherwise the client is anonymous.
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.is_empty()
    }

    /// True when legacy basic-auth credentials are configured.
    pub fn has_basic_auth(&self) -> bool {
        !self.user.is_empty()
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Normalize a container path so that it starts and ends with `/`.
///
/// ```
/// use triannon_client::config::normalize_container;
///
/// assert_eq!(normalize_container(""), "/");
/// assert_eq!(normalize_container("annotations/foo"), "/annotations/foo/");
/// assert_eq!(normalize_container("/annotations/foo/"), "/annotations/foo/");
/// ```
pub fn normalize_container(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
