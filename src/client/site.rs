//! Site and container handles.
//!
//! A [`Site`] is the HTTP transport bound to one server: a `reqwest` client with the
//! fixed timeouts, optional basic credentials and the cached bearer token. A
//! [`Container`] scopes a site to the container path under which annotations live.
//!
//! The token is the only mutable state and sits behind a `parking_lot::RwLock`; the
//! lock is never held across an `.await`.

use crate::config::Configuration;
use crate::error::{AnnotationError, Result};
use crate::types::{AnnotationResponse, AuthToken};
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

use super::utils::encode_segment;

/// HTTP access to one annotation server.
#[derive(Debug)]
pub struct Site {
    http: reqwest::Client,
    host: Url,
    basic_auth: Option<(String, String)>,
    token: RwLock<Option<AuthToken>>,
}

impl Site {
    /// Build a site for the configured host. No request is made.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for an unparseable host,
    /// [`AnnotationError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &Configuration) -> Result<Self> {
        let host = Url::parse(&config.host).map_err(|e| {
            AnnotationError::invalid(format!("invalid host '{}': {}", config.host, e))
        })?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .cookie_store(true);

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| AnnotationError::Config(format!("invalid proxy '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| AnnotationError::Config(e.to_string()))?;

        let basic_auth = config
            .has_basic_auth()
            .then(|| (config.user.clone(), config.pass.clone()));

        Ok(Site {
            http,
            host,
            basic_auth,
            token: RwLock::new(None),
        })
    }

    /// The server base URL.
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Resolve an absolute path (e.g. `/auth/login`) against the host.
    ///
    /// A path prefix on the host is kept.
    pub fn url(&self, path: &str) -> Result<Url> {
        let base = self.host.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }

    /// The cached bearer token, if any.
    pub fn token(&self) -> Option<AuthToken> {
        self.token.read().clone()
    }

    /// Attach a bearer token to every subsequent request.
    pub fn set_token(&self, token: AuthToken) {
        *self.token.write() = Some(token);
    }

    /// Forget the cached bearer token.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Start a request carrying the site's credentials.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some((user, pass)) = &self.basic_auth {
            builder = builder.basic_auth(user, Some(pass));
        }
        if let Some(token) = self.token.read().as_ref() {
            builder = builder.header(http::header::AUTHORIZATION, token.authorization());
        }
        builder
    }

    /// Start a request without any credentials.
    pub(crate) fn anonymous_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Send a request and collect the full response.
    ///
    /// Any status is returned as a response; only transport failures are errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<AnnotationResponse> {
        let response = builder.send().await?;
        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(val) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), val.to_string());
            }
        }

        let body = response.bytes().await?;
        tracing::debug!("received {} ({} bytes)", status, body.len());

        Ok(AnnotationResponse {
            status,
            headers,
            body,
        })
    }
}

/// A [`Site`] scoped to a container path.
#[derive(Debug, Clone)]
pub struct Container {
    site: Arc<Site>,
    url: Url,
}

impl Container {
    /// Scope a site to a container path (normalized, starting and ending with `/`).
    pub fn new(site: Arc<Site>, container: &str) -> Result<Self> {
        let url = site.url(container)?;
        Ok(Container { site, url })
    }

    /// The underlying site.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// URL of the container root; always ends with `/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path of the container root on the server.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// URL of one annotation, `container + id`.
    ///
    /// The id is used as a single path segment; reserved characters are
    /// percent-encoded while existing escapes are kept.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] when the id does not resolve to a URL
    /// strictly below the container.
    pub fn annotation_url(&self, id: &str) -> Result<Url> {
        let url = Url::parse(&format!("{}{}", self.url, encode_segment(id)))?;
        if url == self.url || !url.as_str().starts_with(self.url.as_str()) {
            return Err(AnnotationError::invalid(format!(
                "annotation ID '{}' resolves outside the container {}",
                id, self.url
            )));
        }
        Ok(url)
    }

    /// Start a request against a container URL.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.site.request(method, url)
    }
}
