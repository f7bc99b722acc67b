use std::sync::Arc;

use clap::Parser;
use fitbit_client::config::Credentials;
use fitbit_client::http_client::ReqwestFitbitClient;
use fitbit_loader::cli::LoaderArgs;
use fitbit_loader::dates::target_dates;
use fitbit_loader::logging::init_logging;
use fitbit_loader::{Loader, MongoRecordStore};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = LoaderArgs::parse();
    init_logging(args.verbose);

    let creds = Credentials::from_env()?;
    let client = ReqwestFitbitClient::from_credentials(&creds)?;
    let store = MongoRecordStore::connect(&args.mongodb_uri, &args.database).await?;
    tracing::debug!(database = %args.database, "connected to document store");

    let today = chrono::Local::now().date_naive();
    let dates = target_dates(today, args.days, !args.exclude_today);

    let loader = Loader::new(Arc::new(client), Arc::new(store));
    let summary = loader.load(args.metric, &dates).await?;

    tracing::info!(
        metric = ?args.metric,
        fetched = summary.fetched(),
        skipped = summary.skipped(),
        duplicates = summary.duplicates(),
        "load complete"
    );
    Ok(())
}
