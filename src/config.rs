use dotenvy::dotenv;
use std::env;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} missing, it is required")]
    Missing(&'static str),
    #[error("PORT must be a valid u16 number, got {0}")]
    InvalidPort(String),
    #[error("BETA_USERS must be comma separated UUIDs, got {0}")]
    InvalidBetaUser(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub beta_users: Vec<Uuid>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();

        let port = env::var("PORT").map_err(|_| ConfigError::Missing("PORT"))?;
        let port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let beta_users = parse_beta_users(&env::var("BETA_USERS").unwrap_or_default())?;

        Ok(Self { port, jwt_secret, beta_users })
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

fn parse_beta_users(raw: &str) -> Result<Vec<Uuid>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| Uuid::parse_str(id).map_err(|_| ConfigError::InvalidBetaUser(id.to_string())))
        .collect()
}
