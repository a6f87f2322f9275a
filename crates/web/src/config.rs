use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// In-memory records when unset.
    pub database_url: Option<String>,
    pub api_keys: String,
    pub timer_tick: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let timer_tick_millis = match std::env::var("TIMER_TICK_MILLIS") {
            Ok(value) => value
                .parse::<u64>()
                .context("TIMER_TICK_MILLIS must be a number of milliseconds")?,
            Err(_) => 1000,
        };

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            timer_tick: Duration::from_millis(timer_tick_millis.max(1)),
        })
    }
}
