use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::browse::DEFAULT_SEARCH_DEBOUNCE;
use crate::tmdb::TMDB_BASE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";
const DEFAULT_KEY_FILE: &str = ".cinema-explorer/storage.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub key_file: PathBuf,
    pub tmdb_base_url: String,
    /// Written to storage at startup when no key is stored yet.
    pub seed_api_key: Option<String>,
    pub search_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = get("CINEMA_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CINEMA_BIND_ADDR must be a socket address like 0.0.0.0:3146")?;
        let key_file = get("CINEMA_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE));
        let tmdb_base_url = get("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string());
        let seed_api_key = get("TMDB_API_KEY").map(|k| k.trim().to_string());
        let search_debounce = match get("CINEMA_SEARCH_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .context("CINEMA_SEARCH_DEBOUNCE_MS must be a whole number of milliseconds")?,
            ),
            None => DEFAULT_SEARCH_DEBOUNCE,
        };

        Ok(Self {
            bind_addr,
            key_file,
            tmdb_base_url,
            seed_api_key,
            search_debounce,
        })
    }
}
