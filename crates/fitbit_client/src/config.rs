use crate::FitbitError;
use secrecy::SecretString;

pub const DEFAULT_API_BASE_URL: &str = "https://api.fitbit.com";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://www.fitbit.com";

/// Application key and secret; all the token acquisition flow needs.
#[derive(Clone, Debug)]
pub struct AppCredentials {
    pub key: String,
    pub secret: SecretString,
    pub api_base_url: String,
    pub auth_base_url: String,
}

/// Full credential set used by the loader.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub app: AppCredentials,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

fn required<F>(get: &mut F, key: &str) -> Result<String, FitbitError>
where
    F: FnMut(&str) -> Option<String>,
{
    get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FitbitError::Config(format!("{key} missing")))
}

impl AppCredentials {
    pub fn from_env() -> Result<Self, FitbitError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Reads values through `get` instead of the process environment so tests
    /// never have to mutate global state.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, FitbitError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let key = required(&mut get, "FITBIT_KEY")?;
        let secret = required(&mut get, "FITBIT_SECRET")?;
        let api_base_url =
            get("FITBIT_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let auth_base_url =
            get("FITBIT_AUTH_BASE_URL").unwrap_or_else(|| DEFAULT_AUTH_BASE_URL.into());
        Ok(Self {
            key,
            secret: SecretString::new(secret.into()),
            api_base_url,
            auth_base_url,
        })
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, FitbitError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, FitbitError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let app = AppCredentials::from_env_with(&mut get)?;
        let access_token = required(&mut get, "FITBIT_ACCESS_TOKEN")?;
        let refresh_token = required(&mut get, "FITBIT_REFRESH_TOKEN")?;
        Ok(Self {
            app,
            access_token: SecretString::new(access_token.into()),
            refresh_token: SecretString::new(refresh_token.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn full_env(k: &str) -> Option<String> {
        match k {
            "FITBIT_KEY" => Some("23ABCD".into()),
            "FITBIT_SECRET" => Some("shh".into()),
            "FITBIT_ACCESS_TOKEN" => Some("access".into()),
            "FITBIT_REFRESH_TOKEN" => Some("refresh".into()),
            _ => None,
        }
    }

    #[test]
    fn from_env_reads_values_and_defaults() {
        let creds = Credentials::from_env_with(full_env).expect("creds");
        assert_eq!(creds.app.key, "23ABCD");
        assert_eq!(creds.app.secret.expose_secret(), "shh");
        assert_eq!(creds.access_token.expose_secret(), "access");
        assert_eq!(creds.refresh_token.expose_secret(), "refresh");
        assert_eq!(creds.app.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(creds.app.auth_base_url, DEFAULT_AUTH_BASE_URL);
    }

    #[test]
    fn from_env_missing_access_token() {
        let get = |k: &str| match k {
            "FITBIT_ACCESS_TOKEN" => None,
            other => full_env(other),
        };
        let err = Credentials::from_env_with(get).unwrap_err();
        assert!(err.to_string().contains("FITBIT_ACCESS_TOKEN"));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let get = |k: &str| match k {
            "FITBIT_SECRET" => Some(String::new()),
            other => full_env(other),
        };
        assert!(AppCredentials::from_env_with(get).is_err());
    }

    #[test]
    fn app_credentials_do_not_need_tokens() {
        let get = |k: &str| match k {
            "FITBIT_KEY" => Some("k".into()),
            "FITBIT_SECRET" => Some("s".into()),
            "FITBIT_API_BASE_URL" => Some("http://localhost:9000".into()),
            _ => None,
        };
        let app = AppCredentials::from_env_with(get).expect("app creds");
        assert_eq!(app.api_base_url, "http://localhost:9000");
    }
}
