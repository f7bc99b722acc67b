//! Command-line arguments for `fitbit-loader` and `fitbit-auth`.

use clap::Parser;
use fitbit_client::oauth::{DEFAULT_REDIRECT_URI, DEFAULT_SCOPES};

use crate::catalog::MetricType;
use crate::store::{DEFAULT_DATABASE, DEFAULT_MONGODB_URI};

/// Load Fitbit data into MongoDB, skipping days already stored.
#[derive(Parser, Debug)]
#[command(name = "fitbit-loader", version)]
pub struct LoaderArgs {
    /// Metric to load.
    #[arg(long = "type", value_enum)]
    pub metric: MetricType,

    /// Number of days to load, ending today.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,

    /// End the window yesterday so a partial day is never stored.
    #[arg(long)]
    pub exclude_today: bool,

    #[arg(long, short)]
    pub verbose: bool,

    #[arg(long, env = "MONGODB_URI", default_value = DEFAULT_MONGODB_URI)]
    pub mongodb_uri: String,

    #[arg(long, env = "FITBIT_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,
}

/// Obtain an access and refresh token for the app in FITBIT_KEY/FITBIT_SECRET.
#[derive(Parser, Debug)]
#[command(name = "fitbit-auth", version)]
pub struct AuthArgs {
    /// Redirect URI registered for the app; a local listener waits on it.
    #[arg(long, default_value = DEFAULT_REDIRECT_URI)]
    pub redirect_uri: String,

    /// Scopes to request (repeatable). Defaults to every personal scope.
    #[arg(long = "scope")]
    pub scopes: Vec<String>,

    /// Seconds to wait for the browser to come back.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(long, short)]
    pub verbose: bool,
}

impl AuthArgs {
    pub fn scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
        } else {
            self.scopes.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_args_parse() {
        let args =
            LoaderArgs::try_parse_from(["fitbit-loader", "--type", "heart", "--days", "7", "-v"])
                .expect("args");
        assert_eq!(args.metric, MetricType::Heart);
        assert_eq!(args.days, 7);
        assert!(args.verbose);
        assert!(!args.exclude_today);
    }

    #[test]
    fn zero_days_rejected() {
        let args = ["fitbit-loader", "--type", "steps", "--days", "0"];
        assert!(LoaderArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn unknown_type_rejected() {
        let args = ["fitbit-loader", "--type", "weight", "--days", "1"];
        assert!(LoaderArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn type_and_days_required() {
        assert!(LoaderArgs::try_parse_from(["fitbit-loader", "--days", "1"]).is_err());
        assert!(LoaderArgs::try_parse_from(["fitbit-loader", "--type", "sleep"]).is_err());
    }

    #[test]
    fn auth_scopes_default_and_override() {
        let args = AuthArgs::try_parse_from(["fitbit-auth"]).expect("args");
        assert_eq!(args.scopes().len(), DEFAULT_SCOPES.len());
        assert_eq!(args.timeout_secs, 300);

        let args = AuthArgs::try_parse_from([
            "fitbit-auth",
            "--scope",
            "sleep",
            "--scope",
            "heartrate",
        ])
        .expect("args");
        assert_eq!(args.scopes(), vec!["sleep".to_string(), "heartrate".to_string()]);
    }
}
