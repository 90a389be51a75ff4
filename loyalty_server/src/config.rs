use std::{env, time::Duration};

use log::*;
use lpg_common::{
    helpers::{first_env_var, parse_boolean_flag, parse_env_var},
    Secret,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_LPG_HOST: &str = "127.0.0.1";
const DEFAULT_LPG_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://127.0.0.1:8081";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Base URL of the accrual resolver, e.g. `http://127.0.0.1:8081`.
    pub accrual_system_address: String,
    /// How often the accrual worker polls for pending orders.
    pub poll_interval: Duration,
    /// Upper bound on a single request to the accrual resolver.
    pub resolver_timeout: Duration,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            accrual_system_address: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            resolver_timeout: DEFAULT_RESOLVER_TIMEOUT,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let mut host = env::var("LPG_HOST").ok().unwrap_or_else(|| DEFAULT_LPG_HOST.into());
        let mut port = match parse_env_var::<u16>("LPG_PORT") {
            Some(Ok(p)) => p,
            Some(Err(s)) => {
                error!("🪛️ {s} is not a valid port for LPG_PORT. Using the default, {DEFAULT_LPG_PORT}, instead.");
                DEFAULT_LPG_PORT
            },
            None => DEFAULT_LPG_PORT,
        };
        if let Some(address) = env::var("RUN_ADDRESS").ok().filter(|s| !s.trim().is_empty()) {
            match split_address(&address) {
                Ok((h, p)) => {
                    host = h;
                    port = p;
                },
                Err(e) => warn!("🪛️ Ignoring RUN_ADDRESS. {e}"),
            }
        }
        let database_url = first_env_var(&["LPG_DATABASE_URL", "DATABASE_URI"]).unwrap_or_else(|| {
            info!("🪛️ LPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let accrual_system_address = first_env_var(&["LPG_ACCRUAL_SYSTEM_ADDRESS", "ACCRUAL_SYSTEM_ADDRESS"])
            .unwrap_or_else(|| {
                warn!(
                    "🪛️ LPG_ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}."
                );
                DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
            });
        let poll_interval = millis_from_env("LPG_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL);
        let resolver_timeout = millis_from_env("LPG_RESOLVER_TIMEOUT_MS", DEFAULT_RESOLVER_TIMEOUT);
        let db_max_connections = match parse_env_var::<u32>("LPG_DB_MAX_CONNECTIONS") {
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                warn!(
                    "🪛️ Invalid configuration value for LPG_DB_MAX_CONNECTIONS. Using the default, \
                     {DEFAULT_DB_MAX_CONNECTIONS}."
                );
                DEFAULT_DB_MAX_CONNECTIONS
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            accrual_system_address,
            poll_interval,
            resolver_timeout,
            auth,
        }
    }

    /// Sets host and port from a `host:port` string.
    pub fn set_address(&mut self, address: &str) -> Result<(), ServerError> {
        let (host, port) = split_address(address)?;
        self.host = host;
        self.port = port;
        Ok(())
    }
}

fn split_address(address: &str) -> Result<(String, u16), ServerError> {
    let address = address.trim();
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ServerError::ConfigurationError(format!("'{address}' is not of the form host:port")))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| ServerError::ConfigurationError(format!("'{port}' is not a valid port. {e}")))?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_string(), port))
}

fn millis_from_env(name: &str, default: Duration) -> Duration {
    match parse_env_var::<u64>(name) {
        Some(Ok(ms)) if ms > 0 => Duration::from_millis(ms),
        Some(_) => {
            warn!("🪛️ Invalid configuration value for {name}. Using the default of {} ms.", default.as_millis());
            default
        },
        None => default,
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token stays valid after it is issued.
    pub token_expiry: chrono::Duration,
    /// Whether the `token` cookie is marked `Secure`. Enable this when serving over TLS.
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since every restart will log all users out. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self {
            jwt_secret: Secret::new(secret),
            token_expiry: chrono::Duration::hours(DEFAULT_TOKEN_EXPIRY_HOURS),
            secure_cookies: false,
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_expiry: chrono::Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), token_expiry, secure_cookies: false }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let jwt_secret = env::var("LPG_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [LPG_JWT_SECRET]")))?;
        if jwt_secret.len() < 16 {
            return Err(ServerError::ConfigurationError(
                "LPG_JWT_SECRET must be at least 16 characters long".to_string(),
            ));
        }
        let hours = match parse_env_var::<i64>("LPG_TOKEN_EXPIRY_HOURS") {
            Some(Ok(h)) if h > 0 => h,
            Some(_) => {
                warn!(
                    "🪛️ Invalid configuration value for LPG_TOKEN_EXPIRY_HOURS. Using the default of \
                     {DEFAULT_TOKEN_EXPIRY_HOURS} hrs."
                );
                DEFAULT_TOKEN_EXPIRY_HOURS
            },
            None => DEFAULT_TOKEN_EXPIRY_HOURS,
        };
        let secure_cookies = parse_boolean_flag(env::var("LPG_SECURE_COOKIES").ok(), false);
        Ok(Self { jwt_secret: Secret::new(jwt_secret), token_expiry: chrono::Duration::hours(hours), secure_cookies })
    }
}
