//! OAuth2 authorization-code flow (with PKCE) for obtaining an access and
//! refresh token pair for a personal Fitbit application.
//!
//! The interactive part (browser consent and the redirect listener) lives in
//! the `fitbit-auth` binary; this module only builds the authorize URL,
//! validates the redirect parameters and performs the token exchange.

use crate::FitbitError;
use crate::config::AppCredentials;
use crate::http_client::error_from_response;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::distr::{Alphanumeric, SampleString};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/";

pub const DEFAULT_SCOPES: &[&str] = &[
    "activity",
    "heartrate",
    "location",
    "nutrition",
    "profile",
    "settings",
    "sleep",
    "social",
    "weight",
];

/// Everything needed to send the user to the consent page and later redeem
/// the returned code.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub redirect_uri: String,
    pub code_verifier: SecretString,
}

/// Tokens issued by the provider.
#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in: u64,
    pub user_id: Option<String>,
    pub scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
    user_id: Option<String>,
    scope: Option<String>,
}

/// Verifier length; RFC 7636 allows 43 to 128 unreserved characters.
const CODE_VERIFIER_LEN: usize = 64;

/// A fresh PKCE verifier.
pub fn generate_code_verifier() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CODE_VERIFIER_LEN)
}

/// `S256` challenge for a verifier.
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Build the consent URL with a new random state and PKCE verifier.
pub fn authorization_request(
    app: &AppCredentials,
    redirect_uri: &str,
    scopes: &[String],
) -> Result<AuthorizationRequest, FitbitError> {
    let state = uuid::Uuid::new_v4().to_string();
    let verifier = generate_code_verifier();
    let challenge = code_challenge(&verifier);
    let scope = scopes.join(" ");

    let base = format!("{}/oauth2/authorize", app.auth_base_url.trim_end_matches('/'));
    let url = reqwest::Url::parse_with_params(
        &base,
        &[
            ("response_type", "code"),
            ("client_id", app.key.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("code_challenge", challenge.as_str()),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| FitbitError::Config(format!("invalid authorize url {base}: {e}")))?;

    Ok(AuthorizationRequest {
        url: url.to_string(),
        state,
        redirect_uri: redirect_uri.to_string(),
        code_verifier: SecretString::new(verifier.into()),
    })
}

/// Check the query parameters the provider redirected back with and return
/// the authorization code.
pub fn code_from_callback(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> Result<String, FitbitError> {
    if let Some(err) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or("");
        return Err(FitbitError::OAuth(format!(
            "authorization denied: {err} {description}"
        )));
    }
    match params.get("state") {
        Some(state) if state == expected_state => {}
        _ => return Err(FitbitError::OAuth("state mismatch in redirect".into())),
    }
    params
        .get("code")
        .filter(|c| !c.is_empty())
        .cloned()
        .ok_or_else(|| FitbitError::OAuth("redirect did not carry a code".into()))
}

/// Redeem an authorization code for tokens.
pub async fn exchange_code(
    app: &AppCredentials,
    request: &AuthorizationRequest,
    code: &str,
) -> Result<TokenPair, FitbitError> {
    let url = format!("{}/oauth2/token", app.api_base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder().build()?;
    let resp = client
        .post(&url)
        .basic_auth(&app.key, Some(app.secret.expose_secret()))
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", app.key.as_str()),
            ("code", code),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("code_verifier", request.code_verifier.expose_secret()),
        ])
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    let token: TokenResponse = resp.json().await?;
    Ok(TokenPair {
        access_token: SecretString::new(token.access_token.into()),
        refresh_token: SecretString::new(token.refresh_token.into()),
        expires_in: token.expires_in,
        user_id: token.user_id,
        scope: token.scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppCredentials {
        AppCredentials {
            key: "23ABCD".into(),
            secret: SecretString::new("shh".into()),
            api_base_url: "https://api.fitbit.com".into(),
            auth_base_url: "https://www.fitbit.com/".into(),
        }
    }

    #[test]
    fn challenge_matches_rfc7636_vector() {
        // Appendix B of RFC 7636.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn verifier_has_valid_length() {
        let v = generate_code_verifier();
        assert_eq!(v.len(), CODE_VERIFIER_LEN);
        assert!(v.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(v, generate_code_verifier());
    }

    #[test]
    fn authorization_url_carries_pkce_and_state() {
        let scopes = vec!["sleep".to_string(), "heartrate".to_string()];
        let req = authorization_request(&app(), DEFAULT_REDIRECT_URI, &scopes).expect("request");
        let url = reqwest::Url::parse(&req.url).expect("url");
        assert_eq!(url.path(), "/oauth2/authorize");
        let q: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(q["client_id"], "23ABCD");
        assert_eq!(q["response_type"], "code");
        assert_eq!(q["scope"], "sleep heartrate");
        assert_eq!(q["redirect_uri"], DEFAULT_REDIRECT_URI);
        assert_eq!(q["state"], req.state);
        assert_eq!(q["code_challenge_method"], "S256");
        assert_eq!(
            q["code_challenge"],
            code_challenge(req.code_verifier.expose_secret())
        );
    }

    #[test]
    fn callback_returns_code_on_matching_state() {
        let params: HashMap<String, String> = [("code", "abc"), ("state", "s1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(code_from_callback(&params, "s1").unwrap(), "abc");
    }

    #[test]
    fn callback_rejects_state_mismatch_and_errors() {
        let params: HashMap<String, String> = [("code", "abc"), ("state", "other")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(matches!(
            code_from_callback(&params, "s1"),
            Err(FitbitError::OAuth(_))
        ));

        let denied: HashMap<String, String> = [("error", "access_denied"), ("state", "s1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let err = code_from_callback(&denied, "s1").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }
}
