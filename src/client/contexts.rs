//! Remote JSON-LD context resolution.
//!
//! Annotation servers usually reference their vocabulary by URL
//! (`"@context": "http://iiif.io/api/presentation/2/context.json"`). Before a JSON-LD
//! body is parsed, every such reference is replaced by the `@context` member of the
//! referenced document. Documents are fetched once and kept in a small LRU cache.
//!
//! # Examples
//!
//! ```
//! use triannon_client::client::ContextCache;
//! use serde_json::json;
//!
//! let cache = ContextCache::new();
//! cache.insert(
//!     "http://example.org/context.json",
//!     json!({"@context": {"oa": "http://www.w3.org/ns/oa#"}}),
//! );
//! assert_eq!(
//!     cache.get("http://example.org/context.json"),
//!     Some(json!({"oa": "http://www.w3.org/ns/oa#"}))
//! );
//! ```

use crate::error::{AnnotationError, Result};
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashSet;
use std::num::NonZeroUsize;

use super::site::Site;

/// Contexts kept per client.
const CACHE_CAPACITY: usize = 32;

/// Nested context references followed before giving up.
const MAX_DEPTH: usize = 8;

const CONTEXT_ACCEPT: &str = "application/ld+json, application/json";

/// LRU cache of resolved contexts keyed by URL.
#[derive(Debug)]
pub struct ContextCache {
    entries: Mutex<LruCache<String, Value>>,
}

impl ContextCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Store a context document (or a bare context) for a URL.
    ///
    /// A value with an `@context` member is treated as a context document and only
    /// that member is kept.
    pub fn insert(&self, url: impl Into<String>, document: Value) {
        let context = match document {
            Value::Object(mut map) if map.contains_key("@context") => {
                map.remove("@context").unwrap_or(Value::Null)
            }
            other => other,
        };
        self.entries.lock().put(url.into(), context);
    }

    /// The cached context for a URL.
    pub fn get(&self, url: &str) -> Option<Value> {
        self.entries.lock().get(url).cloned()
    }

    /// Number of cached contexts.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace remote `@context` references in `document` with their contents.
///
/// References that cannot be fetched are left in place.
pub async fn resolve_contexts(site: &Site, cache: &ContextCache, document: &mut Value) {
    let mut unresolvable: HashSet<String> = HashSet::new();

    for _ in 0..MAX_DEPTH {
        let mut references = Vec::new();
        collect_references(document, &mut references);
        references.retain(|url| !unresolvable.contains(url));
        references.sort();
        references.dedup();
        if references.is_empty() {
            return;
        }

        for url in references {
            if cache.get(&url).is_some() {
                continue;
            }
            match fetch_context(site, &url).await {
                Ok(context) => cache.insert(url, context),
                Err(e) => {
                    tracing::warn!("could not load JSON-LD context {}: {}", url, e);
                    unresolvable.insert(url);
                }
            }
        }

        inline_references(document, cache);
    }

    tracing::warn!("JSON-LD contexts nested deeper than {} levels were not resolved", MAX_DEPTH);
}

async fn fetch_context(site: &Site, url: &str) -> Result<Value> {
    let url = url::Url::parse(url)?;
    let request = site
        .anonymous_request(Method::GET, url)
        .header(http::header::ACCEPT, CONTEXT_ACCEPT);
    let response = site.send(request).await?;
    if !response.is_success() {
        return Err(AnnotationError::Status {
            status: response.status,
            body: response.text(),
        });
    }

    let document: Value = serde_json::from_slice(&response.body)?;
    if document.get("@context").is_none() {
        return Err(AnnotationError::Parse("context document has no @context member".into()));
    }
    Ok(document)
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                if key == "@context" {
                    match member {
                        Value::String(s) if is_remote(s) => out.push(s.clone()),
                        Value::Array(items) => out.extend(
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .filter(|s| is_remote(s))
                                .map(str::to_string),
                        ),
                        _ => {}
                    }
                } else {
                    collect_references(member, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

fn inline_references(value: &mut Value, cache: &ContextCache) {
    match value {
        Value::Object(map) => {
            for (key, member) in map.iter_mut() {
                if key == "@context" {
                    inline_context(member, cache);
                } else {
                    inline_references(member, cache);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_references(item, cache);
            }
        }
        _ => {}
    }
}

fn inline_context(context: &mut Value, cache: &ContextCache) {
    match context {
        Value::String(s) => {
            if let Some(resolved) = cache.get(s) {
                *context = resolved;
            }
        }
        Value::Array(items) => {
            let mut expanded = Vec::with_capacity(items.len());
            for item in items.drain(..) {
                let resolved = item.as_str().and_then(|s| cache.get(s));
                match resolved {
                    Some(Value::Array(nested)) => expanded.extend(nested),
                    Some(other) => expanded.push(other),
                    None => expanded.push(item),
                }
            }
            *items = expanded;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use serde_json::json;

    #[test]
    fn test_collect_references() {
        let doc = json!({
            "@context": ["http://a.example/ctx", {"x": "http://x#"}],
            "@graph": [{"@context": "https://b.example/ctx", "@id": "_:b"}, {"@context": "relative.json"}]
        });
        let mut refs = Vec::new();
        collect_references(&doc, &mut refs);
        assert_eq!(refs, vec!["http://a.example/ctx", "https://b.example/ctx"]);
    }

    #[test]
    fn test_inline_from_cache() {
        let cache = ContextCache::new();
        cache.insert("http://a.example/ctx", json!({"@context": {"oa": "http://www.w3.org/ns/oa#"}}));
        cache.insert("http://b.example/ctx", json!([{"x": "http://x#"}, {"y": "http://y#"}]));

        let mut doc = json!({
            "@context": ["http://a.example/ctx", "http://b.example/ctx", "http://missing.example/ctx"],
            "@id": "http://example.org/a"
        });
        inline_references(&mut doc, &cache);
        assert_eq!(
            doc["@context"],
            json!([
                {"oa": "http://www.w3.org/ns/oa#"},
                {"x": "http://x#"},
                {"y": "http://y#"},
                "http://missing.example/ctx"
            ])
        );
    }

    #[tokio::test]
    async fn test_resolve_fetches_once_and_follows_nesting() {
        let mut server = mockito::Server::new_async().await;
        let outer_url = format!("{}/outer.json", server.url());
        let inner_url = format!("{}/inner.json", server.url());

        let outer = server
            .mock("GET", "/outer.json")
            .with_status(200)
            .with_body(json!({"@context": [inner_url.clone(), {"oa": "http://www.w3.org/ns/oa#"}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let inner = server
            .mock("GET", "/inner.json")
            .with_status(200)
            .with_body(r#"{"@context": {"cnt": "http://www.w3.org/2011/content#"}}"#)
            .expect(1)
            .create_async()
            .await;

        let site = Site::new(&Configuration::default().with_host(server.url())).unwrap();
        let cache = ContextCache::new();
        let mut doc = json!({"@context": outer_url.clone(), "@id": "http://example.org/a"});
        resolve_contexts(&site, &cache, &mut doc).await;

        assert_eq!(
            doc["@context"],
            json!([{"cnt": "http://www.w3.org/2011/content#"}, {"oa": "http://www.w3.org/ns/oa#"}])
        );

        let mut again = json!({"@context": outer_url});
        resolve_contexts(&site, &cache, &mut again).await;
        outer.assert_async().await;
        inner.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_context_is_left_in_place() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing.json")
            .with_status(404)
            .create_async()
            .await;
        let url = format!("{}/missing.json", server.url());

        let site = Site::new(&Configuration::default().with_host(server.url())).unwrap();
        let cache = ContextCache::new();
        let mut doc = json!({"@context": url.clone()});
        resolve_contexts(&site, &cache, &mut doc).await;
        assert_eq!(doc["@context"], json!(url));
        assert!(cache.is_empty());
    }
}
