//! Media type parsing and content negotiation helpers.
//!
//! Annotation servers negotiate RDF serializations through `Accept` and
//! `Content-Type`. Only the closed set of [`MediaType`]s below can be parsed into a
//! [`Graph`](crate::Graph); anything else is rejected at the boundary.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Accept | media type with optional parameters | `application/ld+json; profile="http://iiif.io/api/presentation/2/context.json"` |
//! | Content-Type | media type with optional parameters | `text/turtle; charset=utf-8` |
//!
//! # Examples
//!
//! ```
//! use triannon_client::protocol::{check_content_type, parse_media_type, MediaType};
//!
//! let (essence, params) = parse_media_type(r#"application/ld+json; profile="http://example.org/ctx""#);
//! assert_eq!(essence, "application/ld+json");
//! assert_eq!(params[0], ("profile".to_string(), "http://example.org/ctx".to_string()));
//!
//! assert_eq!(check_content_type("text/turtle").unwrap(), MediaType::Turtle);
//! assert!(check_content_type("text/html").is_err());
//! ```

use crate::error::{AnnotationError, Result};
use oxrdfio::RdfFormat;
use std::fmt;

/// RDF serializations the client can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// JSON-LD, the default for every operation
    JsonLd,
    /// Turtle
    Turtle,
    /// RDF/XML
    RdfXml,
    /// N-Triples
    NTriples,
    /// N-Quads
    NQuads,
    /// TriG
    TriG,
    /// Notation3
    N3,
}

/// Every accepted media type essence and the serialization it maps to.
const MEDIA_TYPES: &[(&str, MediaType)] = &[
    ("application/ld+json", MediaType::JsonLd),
    ("application/x-ld+json", MediaType::JsonLd),
    ("text/turtle", MediaType::Turtle),
    ("application/x-turtle", MediaType::Turtle),
    ("application/turtle", MediaType::Turtle),
    ("text/rdf+turtle", MediaType::Turtle),
    ("application/rdf+xml", MediaType::RdfXml),
    ("text/rdf+xml", MediaType::RdfXml),
    ("text/rdf", MediaType::RdfXml),
    ("application/n-triples", MediaType::NTriples),
    ("application/n-quads", MediaType::NQuads),
    ("text/x-nquads", MediaType::NQuads),
    ("application/trig", MediaType::TriG),
    ("application/x-trig", MediaType::TriG),
    ("text/n3", MediaType::N3),
    ("text/rdf+n3", MediaType::N3),
    ("application/rdf+n3", MediaType::N3),
];

impl MediaType {
    /// Resolve a bare media type essence (no parameters).
    pub fn from_essence(essence: &str) -> Option<Self> {
        let essence = essence.trim().to_ascii_lowercase();
        MEDIA_TYPES
            .iter()
            .find(|(name, _)| *name == essence)
            .map(|(_, media_type)| *media_type)
    }

    /// The canonical media type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::JsonLd => "application/ld+json",
            MediaType::Turtle => "text/turtle",
            MediaType::RdfXml => "application/rdf+xml",
            MediaType::NTriples => "application/n-triples",
            MediaType::NQuads => "application/n-quads",
            MediaType::TriG => "application/trig",
            MediaType::N3 => "text/n3",
        }
    }

    /// The parser format for this serialization.
    pub fn rdf_format(&self) -> Option<RdfFormat> {
        match self {
            MediaType::JsonLd => RdfFormat::from_media_type(self.as_str()),
            MediaType::Turtle => Some(RdfFormat::Turtle),
            MediaType::RdfXml => Some(RdfFormat::RdfXml),
            MediaType::NTriples => Some(RdfFormat::NTriples),
            MediaType::NQuads => Some(RdfFormat::NQuads),
            MediaType::TriG => Some(RdfFormat::TriG),
            MediaType::N3 => Some(RdfFormat::N3),
        }
    }

    /// True for JSON-LD, which needs remote context resolution before parsing.
    pub fn is_json_ld(&self) -> bool {
        matches!(self, MediaType::JsonLd)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All accepted media type essences.
pub fn content_types() -> impl Iterator<Item = &'static str> {
    MEDIA_TYPES.iter().map(|(name, _)| *name)
}

/// Split a media type header value into its lowercase essence and parameters.
///
/// Parameter names are lowercased; quoted values are unquoted.
pub fn parse_media_type(value: &str) -> (String, Vec<(String, String)>) {
    let mut parts = value.split(';');
    let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

    let params = parts
        .filter_map(|part| {
            let (name, val) = part.split_once('=')?;
            let val = val.trim();
            let val = val
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(val);
            Some((name.trim().to_ascii_lowercase(), val.to_string()))
        })
        .collect();

    (essence, params)
}

/// The `profile` parameter of a media type, if any.
pub fn media_type_profile(value: &str) -> Option<String> {
    let (_, params) = parse_media_type(value);
    params
        .into_iter()
        .find(|(name, _)| name == "profile")
        .map(|(_, val)| val)
}

/// Format a JSON-LD media type naming a context profile.
pub fn format_profile_content_type(profile: &str) -> String {
    format!("{}; profile=\"{}\"", MediaType::JsonLd.as_str(), profile)
}

/// Validate a content type, ignoring any `;` parameters.
///
/// # Errors
///
/// [`AnnotationError::InvalidArgument`] unless the bare media type is a known RDF
/// serialization.
pub fn check_content_type(content_type: &str) -> Result<MediaType> {
    let (essence, _) = parse_media_type(content_type);
    MediaType::from_essence(&essence).ok_or_else(|| {
        AnnotationError::invalid(format!(
            "content type '{}' is not a supported RDF serialization",
            content_type
        ))
    })
}
