//! Bearer token acquisition.
//!
//! The annotation server issues tokens in three steps:
//!
//! ```text
//! POST /auth/client_identity          {clientId, clientSecret}  -> {authorizationCode}
//! POST /auth/login?code=<code>        {userId, workgroups}      (session cookie)
//! GET  /auth/access_token?code=<code>                            -> {accessToken, expiresIn}
//! ```
//!
//! The login step relies on the site's cookie store to carry the session into the
//! token request.

use crate::config::Configuration;
use crate::error::{AnnotationError, Result};
use crate::protocol::auth_paths;
use crate::types::{AccessTokenResponse, AnnotationResponse, AuthToken, ClientIdentityResponse};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::site::Site;

/// Run the full token flow for the configured client credentials.
///
/// # Errors
///
/// [`AnnotationError::Auth`] when any step fails or answers with malformed JSON.
pub async fn acquire_token(site: &Site, config: &Configuration) -> Result<AuthToken> {
    let identity: ClientIdentityResponse = {
        let url = site.url(auth_paths::CLIENT_IDENTITY)?;
        let body = json!({
            "clientId": config.client_id,
            "clientSecret": config.client_pass,
        });
        let response = send_step(site, site.anonymous_request(Method::POST, url).json(&body)).await?;
        expect_success("client identity", &response, false)?;
        decode("client identity", &response)?
    };
    let code = identity.authorization_code;

    {
        let mut url = site.url(auth_paths::LOGIN)?;
        url.query_pairs_mut().append_pair("code", &code);
        let body = json!({
            "userId": config.container_user,
            "workgroups": config.container_workgroups,
        });
        let response = send_step(site, site.anonymous_request(Method::POST, url).json(&body)).await?;
        expect_success("login", &response, true)?;
    }

    let mut url = site.url(auth_paths::ACCESS_TOKEN)?;
    url.query_pairs_mut().append_pair("code", &code);
    let response = send_step(site, site.anonymous_request(Method::GET, url)).await?;
    expect_success("access token", &response, false)?;
    let token: AccessTokenResponse = decode("access token", &response)?;

    if token.access_token.is_empty() {
        return Err(AnnotationError::Auth("server returned an empty access token".into()));
    }
    Ok(token.into())
}

async fn send_step(site: &Site, request: reqwest::RequestBuilder) -> Result<AnnotationResponse> {
    site.send(request)
        .await
        .map_err(|e| AnnotationError::Auth(e.to_string()))
}

fn expect_success(step: &str, response: &AnnotationResponse, allow_redirect: bool) -> Result<()> {
    let accepted = response.is_success() || (allow_redirect && (300..400).contains(&response.status));
    if accepted {
        Ok(())
    } else {
        Err(AnnotationError::Auth(format!(
            "{} request failed with {}: {}",
            step,
            response.status,
            response.text()
        )))
    }
}

fn decode<T: DeserializeOwned>(step: &str, response: &AnnotationResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| AnnotationError::Auth(format!("malformed {} response: {}", step, e)))
}
