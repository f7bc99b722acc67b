use fitbit_client::FitbitError;
use fitbit_client::config::AppCredentials;
use fitbit_client::oauth::{DEFAULT_REDIRECT_URI, authorization_request, exchange_code};
use secrecy::{ExposeSecret, SecretString};
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> AppCredentials {
    AppCredentials {
        key: "23ABCD".into(),
        secret: SecretString::new("shh".into()),
        api_base_url: server.uri(),
        auth_base_url: server.uri(),
    }
}

#[tokio::test]
async fn exchange_code_posts_form_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "acc",
            "refresh_token": "ref",
            "expires_in": 28800,
            "scope": "sleep heartrate",
            "token_type": "Bearer",
            "user_id": "ABC123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server);
    let req = authorization_request(&app, DEFAULT_REDIRECT_URI, &["sleep".to_string()])
        .expect("authorize request");
    let tokens = exchange_code(&app, &req, "the-code").await.expect("tokens");
    assert_eq!(tokens.access_token.expose_secret(), "acc");
    assert_eq!(tokens.refresh_token.expose_secret(), "ref");
    assert_eq!(tokens.expires_in, 28800);
    assert_eq!(tokens.user_id.as_deref(), Some("ABC123"));

    let received = server.received_requests().await.unwrap();
    let auth = received[0].headers.get("authorization").cloned().unwrap();
    assert!(auth.to_str().unwrap().starts_with("Basic "));
}

#[tokio::test]
async fn exchange_code_surfaces_invalid_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"errors":[{"errorType":"invalid_grant"}],"success":false}"#),
        )
        .mount(&server)
        .await;

    let app = app(&server);
    let req = authorization_request(&app, DEFAULT_REDIRECT_URI, &["sleep".to_string()])
        .expect("authorize request");
    let err = exchange_code(&app, &req, "stale").await.unwrap_err();
    match err {
        FitbitError::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}
