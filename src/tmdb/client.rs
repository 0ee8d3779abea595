use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use super::{
    mask_key, Movie, MovieDetails, Paged, TmdbApi, TmdbError, TrendingWindow, VideoList,
};
use crate::storage::Storage;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";

/// Storage item holding the raw API key.
pub const API_KEY_ITEM: &str = "tmdb_api_key";

pub struct TmdbClient {
    client: Client,
    base_url: String,
    storage: Arc<dyn Storage>,
    api_key: RwLock<Option<String>>,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key().as_deref().map(mask_key))
            .finish()
    }
}

impl TmdbClient {
    /// Client against the public TMDB v3 API. The stored key, if any, is loaded here once.
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self> {
        Self::with_base_url(storage, TMDB_BASE)
    }

    pub fn with_base_url(storage: Arc<dyn Storage>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = storage
            .get_item(API_KEY_ITEM)
            .context("loading stored API key")?
            .filter(|k| !k.trim().is_empty());
        let user_agent = format!("cinema-explorer/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match api_key.as_deref() {
            Some(key) => info!("Loaded stored TMDB API key {}", mask_key(key)),
            None => info!("No TMDB API key stored yet"),
        }
        Ok(Self {
            client,
            base_url,
            storage,
            api_key: RwLock::new(api_key),
        })
    }

    fn current_key(&self) -> Option<String> {
        self.api_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace_key(&self, key: Option<String>) {
        *self
            .api_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = key;
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, TmdbError> {
        let key = self.current_key().ok_or(TmdbError::MissingApiKey)?;
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{endpoint}{separator}api_key={}",
            self.base_url,
            urlencoding::encode(&key)
        );
        debug!(endpoint, "TMDB request");

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TmdbError::Transport {
                endpoint: endpoint.to_string(),
                source: e.without_url(),
            })?;
        let status = res.status();
        if !status.is_success() {
            debug!(endpoint, status = status.as_u16(), "TMDB request rejected");
            return Err(TmdbError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        let text = res.text().await.map_err(|e| TmdbError::Transport {
            endpoint: endpoint.to_string(),
            source: e.without_url(),
        })?;
        serde_json::from_str(&text).map_err(|e| TmdbError::Decode {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    fn api_key(&self) -> Option<String> {
        self.current_key()
    }

    fn set_api_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TmdbError::EmptyApiKey.into());
        }
        self.storage
            .set_item(API_KEY_ITEM, key)
            .context("persisting API key")?;
        self.replace_key(Some(key.to_string()));
        info!("API key saved: {}", mask_key(key));
        Ok(())
    }

    fn clear_api_key(&self) -> Result<()> {
        self.storage
            .remove_item(API_KEY_ITEM)
            .context("removing stored API key")?;
        self.replace_key(None);
        info!("API key cleared");
        Ok(())
    }

    async fn popular_movies(&self, page: u32) -> Result<Paged<Movie>> {
        let page = page.max(1);
        Ok(self.get_json(&format!("/movie/popular?page={page}")).await?)
    }

    async fn top_rated_movies(&self, page: u32) -> Result<Paged<Movie>> {
        let page = page.max(1);
        Ok(self.get_json(&format!("/movie/top_rated?page={page}")).await?)
    }

    async fn upcoming_movies(&self, page: u32) -> Result<Paged<Movie>> {
        let page = page.max(1);
        Ok(self.get_json(&format!("/movie/upcoming?page={page}")).await?)
    }

    async fn trending_movies(&self, window: TrendingWindow, page: u32) -> Result<Paged<Movie>> {
        let page = page.max(1);
        let window = window.as_str();
        Ok(self
            .get_json(&format!("/trending/movie/{window}?page={page}"))
            .await?)
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<Paged<Movie>> {
        let page = page.max(1);
        let encoded = urlencoding::encode(query);
        Ok(self
            .get_json(&format!("/search/movie?query={encoded}&page={page}"))
            .await?)
    }

    async fn movie_details(&self, id: i64) -> Result<MovieDetails> {
        Ok(self.get_json(&format!("/movie/{id}")).await?)
    }

    async fn movie_videos(&self, id: i64) -> Result<VideoList> {
        Ok(self.get_json(&format!("/movie/{id}/videos")).await?)
    }
}
