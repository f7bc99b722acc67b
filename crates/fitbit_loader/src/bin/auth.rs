use std::time::Duration;

use clap::Parser;
use fitbit_client::config::AppCredentials;
use fitbit_client::oauth::{authorization_request, exchange_code};
use fitbit_loader::callback::{listen_addr, wait_for_code};
use fitbit_loader::cli::AuthArgs;
use fitbit_loader::logging::init_logging;
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = AuthArgs::parse();
    init_logging(args.verbose);

    let app = AppCredentials::from_env()?;
    let request = authorization_request(&app, &args.redirect_uri, &args.scopes())?;

    let addr = listen_addr(&args.redirect_uri)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "waiting for the authorization redirect");

    eprintln!("Open this URL in a browser and approve access:\n\n  {}\n", request.url);

    let code = wait_for_code(
        listener,
        &request.state,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;
    let tokens = exchange_code(&app, &request, &code).await?;

    tracing::info!(
        expires_in_secs = tokens.expires_in,
        user_id = tokens.user_id.as_deref().unwrap_or(""),
        scope = tokens.scope.as_deref().unwrap_or(""),
        "tokens issued"
    );
    println!("FITBIT_ACCESS_TOKEN={}", tokens.access_token.expose_secret());
    println!("FITBIT_REFRESH_TOKEN={}", tokens.refresh_token.expose_secret());
    Ok(())
}
