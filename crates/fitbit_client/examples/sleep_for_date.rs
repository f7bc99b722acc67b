use chrono::NaiveDate;
use fitbit_client::{FitbitClient, config::Credentials, http_client::ReqwestFitbitClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects FITBIT_* credentials in env, date as first argument
    let creds = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let date = std::env::args()
        .nth(1)
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let client = ReqwestFitbitClient::from_credentials(&creds)?;
    let sleep = client.get_sleep(date).await?;
    println!("{}", serde_json::to_string_pretty(&sleep)?);
    Ok(())
}
