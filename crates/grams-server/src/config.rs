use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

const DEFAULT_MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
const TOKEN_TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;

/// Server settings, read from `GRAMS_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub picture_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_picture_bytes: usize,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = var("GRAMS_PORT", "3000")
            .parse()
            .context("GRAMS_PORT must be a port number")?;
        let max_picture_bytes: usize = match lookup("GRAMS_MAX_PICTURE_BYTES") {
            Some(v) => v.parse().context("GRAMS_MAX_PICTURE_BYTES must be a byte count")?,
            None => DEFAULT_MAX_PICTURE_BYTES,
        };
        let token_ttl_days: i64 = match lookup("GRAMS_TOKEN_TTL_DAYS") {
            Some(v) => v.parse().context("GRAMS_TOKEN_TTL_DAYS must be a number of days")?,
            None => DEFAULT_TOKEN_TTL_DAYS,
        };
        if !TOKEN_TTL_DAYS_RANGE.contains(&token_ttl_days) {
            bail!(
                "GRAMS_TOKEN_TTL_DAYS must be between {} and {}",
                TOKEN_TTL_DAYS_RANGE.start(),
                TOKEN_TTL_DAYS_RANGE.end()
            );
        }

        Ok(Self {
            jwt_secret: var("GRAMS_JWT_SECRET", DEV_JWT_SECRET),
            db_path: var("GRAMS_DB_PATH", "grams.db").into(),
            picture_dir: var("GRAMS_PICTURE_DIR", "./pictures").into(),
            host: var("GRAMS_HOST", "0.0.0.0"),
            port,
            max_picture_bytes,
            token_ttl_days,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret.is_empty() || self.jwt_secret == DEV_JWT_SECRET
    }
}
