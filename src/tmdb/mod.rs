use anyhow::Result;
use async_trait::async_trait;

mod client;
mod images;
mod types;

pub use client::{TmdbClient, API_KEY_ITEM, TMDB_BASE};
pub use images::{backdrop_url, image_url, poster_url, ImageSize, IMAGE_BASE};
pub use types::{
    Category, Genre, Movie, MovieDetails, MovieVideo, Paged, ProductionCompany,
    ProductionCountry, SpokenLanguage, TrendingWindow, VideoList,
};

/// Failures reported by the TMDB client. Orchestration code carries these inside
/// `anyhow::Error` and downcasts when the distinction matters.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("API key not set")]
    MissingApiKey,
    #[error("API key must not be empty")]
    EmptyApiKey,
    #[error("HTTP error! status: {status} ({endpoint})")]
    Status { status: u16, endpoint: String },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not parse response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TmdbError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TmdbError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Operations the browse and detail views need from TMDB.
///
/// Every data call fails with [`TmdbError::MissingApiKey`] before touching the network when no
/// key is set. Pages start at 1; a page of 0 is treated as 1.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    fn api_key(&self) -> Option<String>;
    fn set_api_key(&self, key: &str) -> Result<()>;
    fn clear_api_key(&self) -> Result<()>;

    fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    async fn popular_movies(&self, page: u32) -> Result<Paged<Movie>>;
    async fn top_rated_movies(&self, page: u32) -> Result<Paged<Movie>>;
    async fn upcoming_movies(&self, page: u32) -> Result<Paged<Movie>>;
    async fn trending_movies(&self, window: TrendingWindow, page: u32) -> Result<Paged<Movie>>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<Paged<Movie>>;
    async fn movie_details(&self, id: i64) -> Result<MovieDetails>;
    async fn movie_videos(&self, id: i64) -> Result<VideoList>;

    /// One page of a browse category. Trending uses the weekly window.
    async fn category_movies(&self, category: Category, page: u32) -> Result<Paged<Movie>> {
        match category {
            Category::Popular => self.popular_movies(page).await,
            Category::Trending => self.trending_movies(TrendingWindow::Week, page).await,
            Category::TopRated => self.top_rated_movies(page).await,
            Category::Upcoming => self.upcoming_movies(page).await,
        }
    }
}

/// Key prefix safe for logs: the first 8 characters followed by `...`.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_to_eight_characters() {
        assert_eq!(mask_key("0123456789abcdef"), "01234567...");
        assert_eq!(mask_key("abc"), "abc...");
    }

    #[test]
    fn status_is_exposed_only_for_status_errors() {
        let err = TmdbError::Status {
            status: 401,
            endpoint: "/movie/popular?page=1".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(TmdbError::MissingApiKey.status(), None);
        assert!(err.to_string().contains("401"));
    }
}
