//! Protocol constants and content negotiation for annotation servers.
//!
//! # Key Items
//!
//! | Item | Description |
//! |------|-------------|
//! | [`JSONLD_TYPE`] | Default media type for every request |
//! | [`CONTENT_TYPE_IIIF`] | JSON-LD with the IIIF presentation context profile |
//! | [`CONTENT_TYPE_OA`] | JSON-LD with the W3C Open Annotation context profile |
//! | [`MediaType`] | Closed set of parseable RDF serializations |
//! | [`check_content_type`] | Boundary validation for requested and received types |

pub mod headers;

pub use headers::{
    check_content_type, content_types, format_profile_content_type, media_type_profile,
    parse_media_type, MediaType,
};

/// The JSON-LD media type.
pub const JSONLD_TYPE: &str = "application/ld+json";

/// IIIF presentation API context.
pub const PROFILE_IIIF: &str = "http://iiif.io/api/presentation/2/context.json";

/// W3C Open Annotation context.
pub const PROFILE_OA: &str = "http://www.w3.org/ns/oa-context-20130208.json";

/// JSON-LD requested with the IIIF context profile.
pub const CONTENT_TYPE_IIIF: &str =
    "application/ld+json; profile=\"http://iiif.io/api/presentation/2/context.json\"";

/// JSON-LD requested with the Open Annotation context profile.
pub const CONTENT_TYPE_OA: &str =
    "application/ld+json; profile=\"http://www.w3.org/ns/oa-context-20130208.json\"";

/// Value of the `commit` member in a create request.
pub const CREATE_COMMIT: &str = "Create Annotation";

/// Auth API endpoints, relative to the server host.
pub mod auth_paths {
    /// Exchanges client credentials for an authorization code.
    pub const CLIENT_IDENTITY: &str = "/auth/client_identity";
    /// Registers the container user and workgroups for an authorization code.
    pub const LOGIN: &str = "/auth/login";
    /// Exchanges an authorization code for an access token.
    pub const ACCESS_TOKEN: &str = "/auth/access_token";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_content_types() {
        assert_eq!(CONTENT_TYPE_IIIF, format_profile_content_type(PROFILE_IIIF));
        assert_eq!(CONTENT_TYPE_OA, format_profile_content_type(PROFILE_OA));
        assert!(CONTENT_TYPE_IIIF.starts_with(JSONLD_TYPE));
        assert!(CONTENT_TYPE_OA.contains(PROFILE_OA));
    }

    #[test]
    fn test_content_types_include_jsonld() {
        assert!(content_types().any(|ct| ct == JSONLD_TYPE));
    }
}
