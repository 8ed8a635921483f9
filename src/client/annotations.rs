//! The annotation client.
//!
//! Provides [`AnnotationClient`] for creating, reading and deleting annotations in
//! one container of an annotation server.
//!
//! # Examples
//!
//! ## Reading annotations
//!
//! ```ignore
//! use triannon_client::{AnnotationClient, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnnotationClient::new(Configuration::from_env())?;
//!     let graph = client.get_annotations().await?;
//!     for uri in client.annotation_uris(&graph) {
//!         println!("{} -> {}", uri, client.annotation_id(&uri)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Create, read back, delete
//!
//! ```ignore
//! use triannon_client::{AnnotationClient, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnnotationClient::new(Configuration::from_env())?;
//!     client.authenticate().await;
//!
//!     let response = client.post_annotation(r#"{"@context": "...", "@graph": []}"#).await;
//!     let graph = client.response_to_graph(response.as_ref()).await?;
//!     if let Some(uri) = client.annotation_uris(&graph).first() {
//!         let id = client.annotation_id(uri)?;
//!         let stored = client.get_annotation(&id).await?;
//!         println!("stored {} statements", stored.len());
//!         client.delete_annotation(&id).await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::client::auth::acquire_token;
use crate::client::contexts::{resolve_contexts, ContextCache};
use crate::client::site::{Container, Site};
use crate::client::utils::{
    annotation_id_from, check_id, classify_delete, is_unauthorized_status, linear_backoff,
};
use crate::config::{normalize_container, Configuration};
use crate::error::{AnnotationError, Result};
use crate::graph::{parse_graph, vocab, Graph, Term};
use crate::protocol::{
    check_content_type, CONTENT_TYPE_IIIF, CONTENT_TYPE_OA, CREATE_COMMIT, JSONLD_TYPE,
};
use crate::types::{AnnotationResponse, AuthToken};
use http::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use url::Url;

/// Client for one annotation container.
///
/// Public CRUD methods only return `Err` for invalid arguments, which are detected
/// before any request is made. Transport and server failures are logged and turned
/// into `false`, an empty [`Graph`] or the last server response.
///
/// Clones share the HTTP connection pool, the cached bearer token and the JSON-LD
/// context cache.
#[derive(Clone, Debug)]
pub struct AnnotationClient {
    config: Arc<Configuration>,
    site: Arc<Site>,
    container: Container,
    contexts: Arc<ContextCache>,
}

impl AnnotationClient {
    /// Create a client for the configured host and container.
    ///
    /// No request is made.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for an unparseable host,
    /// [`AnnotationError::Config`] when the HTTP client cannot be built.
    pub fn new(mut config: Configuration) -> Result<Self> {
        config.container = normalize_container(&config.container);
        let site = Arc::new(Site::new(&config)?);
        let container = Container::new(Arc::clone(&site), &config.container)?;

        Ok(AnnotationClient {
            config: Arc::new(config),
            site,
            container,
            contexts: Arc::new(ContextCache::new()),
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The server handle.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// The container handle.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The bearer token currently attached to requests.
    pub fn auth_token(&self) -> Option<AuthToken> {
        self.site.token()
    }

    /// Pre-load a JSON-LD context document so it is never fetched.
    pub fn register_context(&self, url: impl Into<String>, document: Value) {
        self.contexts.insert(url, document);
    }

    // ========== Authentication ==========

    /// Acquire a bearer token for all subsequent requests.
    ///
    /// Returns `false` without any request when no client id is configured, and
    /// `false` (logged) when acquisition fails.
    pub async fn authenticate(&self) -> bool {
        if !self.config.has_client_credentials() {
            debug!("no client id configured, staying anonymous");
            return false;
        }

        match acquire_token(&self.site, &self.config).await {
            Ok(token) => {
                info!("acquired {} token for client {}", token.token_type, self.config.client_id);
                self.site.set_token(token);
                true
            }
            Err(e) => {
                error!("Failed to authenticate client {}: {}", self.config.client_id, e);
                false
            }
        }
    }

    /// Discard any cached token, then [`authenticate`](Self::authenticate).
    pub async fn reauthenticate(&self) -> bool {
        self.site.clear_token();
        self.authenticate().await
    }

    // ========== Delete ==========

    /// Delete an annotation.
    ///
    /// | Status | Result |
    /// |--------|--------|
    /// | 200, 202, 204 | `true` |
    /// | 404, 410 | `true`, nothing logged |
    /// | 401 | re-authenticate, retry once, classify the retry |
    /// | anything else, transport error | `false`, logged |
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for an invalid id; no request is made.
    pub async fn delete_annotation(&self, id: &str) -> Result<bool> {
        check_id(id)?;
        let url = self.container.annotation_url(id)?;

        let mut outcome = self.send_delete(&url).await;
        let unauthorized = matches!(&outcome, Ok(r) if is_unauthorized_status(r.status));
        if unauthorized {
            debug!("DELETE {} was unauthorized, re-authenticating", url);
            self.reauthenticate().await;
            outcome = self.send_delete(&url).await;
        }

        let deleted = match outcome {
            Ok(response) => {
                let status = classify_delete(response.status);
                if !status.is_success() {
                    error!(
                        "Failed to DELETE annotation: {}, {}: {}",
                        id,
                        response.status,
                        response.text()
                    );
                }
                status.is_success()
            }
            Err(e) => {
                error!("Failed to DELETE annotation: {}, {}", id, e);
                false
            }
        };
        Ok(deleted)
    }

    async fn send_delete(&self, url: &Url) -> Result<AnnotationResponse> {
        debug!("DELETE {}", url);
        let request = self.container.request(Method::DELETE, url.clone());
        self.site.send(request).await
    }

    // ========== Create ==========

    /// Create an annotation from a JSON-LD document.
    ///
    /// Non-2xx responses and transport errors are retried with a linear backoff up
    /// to `max_attempts` times. The first 401 triggers one re-authentication and an
    /// immediate retry that does not count as an attempt.
    ///
    /// Returns the successful response, or the last failed one once attempts are
    /// exhausted (`None` if that failure produced no response).
    pub async fn post_annotation(&self, annotation: &str) -> Option<AnnotationResponse> {
        let body = json!({
            "commit": CREATE_COMMIT,
            "annotation": { "data": annotation },
        })
        .to_string();

        let max_attempts = self.config.max_attempts.max(1);
        let mut reauthenticated = false;
        let mut attempt = 0;

        loop {
            let outcome = self.send_post(&body).await;
            if matches!(&outcome, Ok(r) if r.is_success()) {
                return outcome.ok();
            }

            let unauthorized = matches!(&outcome, Ok(r) if is_unauthorized_status(r.status));
            if unauthorized && !reauthenticated {
                reauthenticated = true;
                debug!("POST was unauthorized, re-authenticating");
                self.reauthenticate().await;
                continue;
            }

            attempt += 1;
            if attempt >= max_attempts {
                match &outcome {
                    Ok(r) => error!("Failed to POST annotation: {}: {}", r.status, r.text()),
                    Err(e) => error!("Failed to POST annotation: {}", e),
                }
                return outcome.ok();
            }

            let delay = linear_backoff(attempt, self.config.retry_delay_ms);
            match &outcome {
                Ok(r) => warn!(
                    "POST failed with {} (attempt {}), retrying after {:?}",
                    r.status, attempt, delay
                ),
                Err(e) => warn!(
                    "POST failed (attempt {}), retrying after {:?}: {}",
                    attempt, delay, e
                ),
            }
            sleep(delay).await;
        }
    }

    async fn send_post(&self, body: &str) -> Result<AnnotationResponse> {
        let url = self.container.url().clone();
        debug!("POST {}", url);
        let request = self
            .container
            .request(Method::POST, url)
            .header(CONTENT_TYPE, JSONLD_TYPE)
            .header(ACCEPT, JSONLD_TYPE)
            .body(body.to_string());
        self.site.send(request).await
    }

    // ========== Read ==========

    /// All annotations in the container, as JSON-LD.
    ///
    /// See [`get_annotations_as`](Self::get_annotations_as).
    pub async fn get_annotations(&self) -> Result<Graph> {
        self.get_annotations_as(JSONLD_TYPE).await
    }

    /// All annotations in the container, negotiated as `content_type`.
    ///
    /// Any transport, status or parse failure is logged and yields an empty graph.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for an unsupported content type.
    pub async fn get_annotations_as(&self, content_type: &str) -> Result<Graph> {
        check_content_type(content_type)?;
        let url = self.container.url().clone();

        match self.fetch_graph(url, content_type).await {
            Ok(graph) => Ok(graph),
            Err(e) => {
                error!("Failed to GET annotations: {}", e);
                Ok(Graph::new())
            }
        }
    }

    /// One annotation, as JSON-LD.
    pub async fn get_annotation(&self, id: &str) -> Result<Graph> {
        self.get_annotation_as(id, JSONLD_TYPE).await
    }

    /// One annotation, negotiated as `content_type`.
    ///
    /// Any transport, status or parse failure is logged and yields an empty graph.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for an invalid id or unsupported content
    /// type; no request is made.
    pub async fn get_annotation_as(&self, id: &str, content_type: &str) -> Result<Graph> {
        check_id(id)?;
        check_content_type(content_type)?;
        let url = self.container.annotation_url(id)?;

        match self.fetch_graph(url, content_type).await {
            Ok(graph) => Ok(graph),
            Err(e) => {
                error!("Failed to GET annotation: {}, {}", id, e);
                Ok(Graph::new())
            }
        }
    }

    /// One annotation, using the IIIF presentation context.
    pub async fn get_iiif_annotation(&self, id: &str) -> Result<Graph> {
        self.get_annotation_as(id, CONTENT_TYPE_IIIF).await
    }

    /// One annotation, using the Open Annotation context.
    pub async fn get_oa_annotation(&self, id: &str) -> Result<Graph> {
        self.get_annotation_as(id, CONTENT_TYPE_OA).await
    }

    async fn fetch_graph(&self, url: Url, content_type: &str) -> Result<Graph> {
        debug!("GET {} ({})", url, content_type);
        let request = self
            .container
            .request(Method::GET, url)
            .header(ACCEPT, content_type);
        let response = self.site.send(request).await?;

        if !response.is_success() {
            return Err(AnnotationError::Status {
                status: response.status,
                body: response.text(),
            });
        }
        self.parse_response(&response).await
    }

    // ========== Response processing ==========

    /// Parse a server response into a graph.
    ///
    /// Parse failures are logged and yield an empty graph.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] for a missing response, a response without
    /// a content type, or an unsupported content type.
    pub async fn response_to_graph(&self, response: Option<&AnnotationResponse>) -> Result<Graph> {
        let response =
            response.ok_or_else(|| AnnotationError::invalid("response is missing"))?;

        match self.parse_response(response).await {
            Ok(graph) => Ok(graph),
            Err(e) if e.is_invalid_argument() => Err(e),
            Err(e) => {
                error!("Failed to parse response into a graph: {}", e);
                Ok(Graph::new())
            }
        }
    }

    async fn parse_response(&self, response: &AnnotationResponse) -> Result<Graph> {
        let content_type = response
            .content_type()
            .ok_or_else(|| AnnotationError::invalid("response has no content type"))?;
        let media_type = check_content_type(content_type)?;
        let base = self.base_iri(response);

        if media_type.is_json_ld() {
            let mut document: Value = serde_json::from_slice(&response.body)
                .map_err(|e| AnnotationError::Parse(format!("invalid JSON-LD: {}", e)))?;
            resolve_contexts(&self.site, &self.contexts, &mut document).await;
            let body = serde_json::to_vec(&document)?;
            parse_graph(media_type, &body, Some(base.as_str()))
        } else {
            parse_graph(media_type, &response.body, Some(base.as_str()))
        }
    }

    fn base_iri(&self, response: &AnnotationResponse) -> Url {
        response
            .header("content-location")
            .or_else(|| response.header("location"))
            .and_then(|location| self.container.url().join(location).ok())
            .unwrap_or_else(|| self.container.url().clone())
    }

    // ========== Graph utilities ==========

    /// URIs of every `oa:Annotation` in the graph, in graph order.
    pub fn annotation_uris(&self, graph: &Graph) -> Vec<Url> {
        graph
            .subjects_of(&Term::iri(vocab::RDF_TYPE), &Term::iri(vocab::OA_ANNOTATION))
            .into_iter()
            .filter_map(Term::as_iri)
            .filter_map(|iri| Url::parse(iri).ok())
            .collect()
    }

    /// The id of an annotation URI, percent-encoded as one path segment.
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidArgument`] when the URI carries no id.
    pub fn annotation_id(&self, uri: &Url) -> Result<String> {
        annotation_id_from(uri, self.container.path())
    }
}
