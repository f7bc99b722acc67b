//! One-shot local listener that receives the OAuth2 redirect from the browser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use fitbit_client::FitbitError;
use fitbit_client::oauth::code_from_callback;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

type CodeSender = oneshot::Sender<Result<String, FitbitError>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    sender: Arc<Mutex<Option<CodeSender>>>,
}

async fn handle_redirect(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    // favicon and other stray requests
    if !params.contains_key("code") && !params.contains_key("error") {
        return (StatusCode::NOT_FOUND, "waiting for the authorization redirect");
    }
    let result = code_from_callback(&params, &state.expected_state);
    let ok = result.is_ok();
    if let Some(tx) = state.sender.lock().await.take() {
        let _ = tx.send(result);
    }
    if ok {
        (
            StatusCode::OK,
            "Authorization complete. You can close this window.",
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            "Authorization failed. See the terminal for details.",
        )
    }
}

/// `host:port` to bind for a redirect URI.
pub fn listen_addr(redirect_uri: &str) -> Result<String, FitbitError> {
    let url = reqwest::Url::parse(redirect_uri)
        .map_err(|e| FitbitError::Config(format!("invalid redirect uri {redirect_uri}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| FitbitError::Config(format!("redirect uri {redirect_uri} has no host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| FitbitError::Config(format!("redirect uri {redirect_uri} has no port")))?;
    Ok(format!("{host}:{port}"))
}

/// Serve on `listener` until the first redirect carrying a code or an error
/// arrives, or `timeout` elapses.
pub async fn wait_for_code(
    listener: TcpListener,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, FitbitError> {
    let (tx, rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = Router::new()
        .fallback(handle_redirect)
        .with_state(CallbackState {
            expected_state: Arc::from(expected_state),
            sender: Arc::new(Mutex::new(Some(tx))),
        });

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let outcome = tokio::time::timeout(timeout, rx).await;

    let _ = shutdown_tx.send(());
    // Give the browser its response; idle keep-alive connections are cut.
    if tokio::time::timeout(Duration::from_secs(1), &mut server)
        .await
        .is_err()
    {
        server.abort();
    }

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(FitbitError::OAuth(
            "redirect listener stopped before a redirect arrived".into(),
        )),
        Err(_) => Err(FitbitError::OAuth(format!(
            "no redirect received within {}s",
            timeout.as_secs()
        ))),
    }
}
