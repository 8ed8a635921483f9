//! Annotation server client.
//!
//! This module provides the HTTP side of the crate, enabling callers to:
//!
//! - **Create annotations** from JSON-LD documents, with retry and backoff
//! - **Read annotations** from a container in any supported RDF serialization
//! - **Delete annotations**, treating already-deleted ones as success
//! - **Authenticate** with client credentials and a bearer token
//! - **Resolve remote JSON-LD contexts** before parsing
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── annotations - AnnotationClient and CRUD operations
//! ├── auth        - Three-step bearer token flow
//! ├── contexts    - Remote JSON-LD context cache
//! ├── site        - Site and Container HTTP handles
//! └── utils       - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AnnotationClient`] | Main client for one container |
//! | [`Site`] | HTTP transport bound to one server |
//! | [`Container`] | Site scoped to a container path |
//! | [`ContextCache`] | LRU cache of JSON-LD contexts |
//! | [`DeleteStatus`] | Classification of DELETE responses |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use triannon_client::{AnnotationClient, Configuration};
//!
//! let config = Configuration::default()
//!     .with_host("http://localhost:3000")
//!     .with_container("annotations/foo")
//!     .with_retries(5, 2000);
//! let client = AnnotationClient::new(config).unwrap();
//! assert_eq!(client.container().path(), "/annotations/foo/");
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use triannon_client::client::{check_id, encode_segment, is_success_status};
//!
//! assert!(is_success_status(201));
//! assert!(check_id("").is_err());
//! assert!(check_id("..").is_err());
//! assert_eq!(encode_segment("a/b"), "a%2Fb");
//! ```

mod annotations;
mod auth;
mod contexts;
mod site;
mod utils;

pub use annotations::AnnotationClient;
pub use auth::acquire_token;
pub use contexts::{resolve_contexts, ContextCache};
pub use site::{Container, Site};
pub use utils::*;
