#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Triannon client: Open Annotation over HTTP
//!
//! This crate is a client for Triannon-style annotation servers, which store
//! [Open Annotation](http://www.openannotation.org/spec/core/) documents in LDP
//! containers and serve them as RDF.
//!
//! ## Overview
//!
//! The client wraps four operations on one container:
//!
//! 1. **Create** - POST a JSON-LD annotation, retrying with linear backoff
//! 2. **Read** - GET one or all annotations in a negotiated RDF serialization
//! 3. **Delete** - DELETE an annotation; already-gone annotations count as deleted
//! 4. **Authenticate** - acquire a bearer token with client credentials
//!
//! Responses are parsed into an in-memory [`Graph`] of [`Triple`]s, from which
//! annotation URIs and their ids can be extracted.
//!
//! ## Error Model
//!
//! Only [`AnnotationError::InvalidArgument`] escapes the public CRUD operations, and
//! it is raised before any request is made. Everything that goes wrong on the wire
//! is logged through `tracing` and degrades to `false`, an empty graph or the last
//! server response.
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `delete_annotation` | `Ok(false)` (404 and 410 are `Ok(true)`) |
//! | `post_annotation` | last response, or `None` |
//! | `get_annotation(s)` | `Ok(Graph::new())` |
//! | `response_to_graph` | `Ok(Graph::new())` for unparseable bodies |
//!
//! ## Usage
//!
//! ```ignore
//! use triannon_client::{AnnotationClient, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Configuration::from_env();
//!     triannon_client::logging::init_logging(&config)?;
//!
//!     let client = AnnotationClient::new(config)?;
//!     client.authenticate().await;
//!
//!     let graph = client.get_annotations().await?;
//!     for uri in client.annotation_uris(&graph) {
//!         let id = client.annotation_id(&uri)?;
//!         println!("{}", id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - `AnnotationClient`, authentication and HTTP handles
//! - **[config]** - Client configuration and environment loading
//! - **[error]** - Error types and result handling
//! - **[graph]** - RDF terms, triples, graphs and parsing
//! - **[logging]** - `tracing` subscriber setup
//! - **[protocol]** - Media types, profiles and protocol constants
//! - **[types]** - Responses and tokens

pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod protocol;
pub mod types;

pub use client::AnnotationClient;
pub use config::Configuration;
pub use error::{AnnotationError, Result};
pub use graph::{Graph, Term, Triple};
pub use protocol::{MediaType, CONTENT_TYPE_IIIF, CONTENT_TYPE_OA, JSONLD_TYPE};
pub use types::{AnnotationResponse, AuthToken};

#[cfg(test)]
mod tests;
