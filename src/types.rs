//! Wire-level types shared by the client modules.

use bytes::Bytes;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// A raw response from the annotation server.
///
/// Header names are stored lowercase. Returned by
/// [`AnnotationClient::post_annotation`](crate::AnnotationClient::post_annotation) and
/// consumed by [`AnnotationClient::response_to_graph`](crate::AnnotationClient::response_to_graph).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Bytes,
}

impl AnnotationResponse {
    /// Build a response from its parts.
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Content-Type` header, if present and non-empty.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A bearer token obtained from the server's auth API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Opaque access token
    pub access_token: String,
    /// Token scheme, normally `Bearer`
    pub token_type: String,
    /// When the token was received
    pub acquired_at: SystemTime,
    /// Lifetime announced by the server
    pub expires_in: Option<Duration>,
}

impl AuthToken {
    /// Create a bearer token acquired now.
    pub fn bearer(access_token: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            acquired_at: SystemTime::now(),
            expires_in,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// True once the announced lifetime has elapsed.
    pub fn is_expired(&self) -> bool {
        match self.expires_in {
            Some(lifetime) => self
                .acquired_at
                .elapsed()
                .map(|age| age >= lifetime)
                .unwrap_or(false),
            None => false,
        }
    }
}

/// Body of `POST /auth/client_identity`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClientIdentityResponse {
    pub authorization_code: String,
}

/// Body of `GET /auth/access_token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<AccessTokenResponse> for AuthToken {
    fn from(response: AccessTokenResponse) -> Self {
        let token_type = response
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Bearer".to_string());
        Self {
            access_token: response.access_token,
            token_type,
            acquired_at: SystemTime::now(),
            expires_in: response.expires_in.map(Duration::from_secs),
        }
    }
}
