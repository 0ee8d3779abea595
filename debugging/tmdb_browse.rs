//! Fetch one page of a browse category (or a search) and print each movie as a JSON line.
//! Usage:
//!   cargo run --bin tmdb_browse -- popular [page]
//!   cargo run --bin tmdb_browse -- search "<query>" [page]
//! Uses the stored key (CINEMA_KEY_FILE), falling back to TMDB_API_KEY (.env supported).

use anyhow::{Context, Result};
use cinema_explorer::config::Config;
use cinema_explorer::detail::MovieCard;
use cinema_explorer::storage::{FileStorage, MemoryStorage, Storage};
use cinema_explorer::tmdb::{Category, TmdbApi, TmdbClient, API_KEY_ITEM};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present for local runs.
    dotenv().ok();
    let config = Config::from_env()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let first = args.first().map(String::as_str).unwrap_or("popular");

    // Stored key wins over TMDB_API_KEY, as in the server.
    let stored = FileStorage::new(&config.key_file);
    let has_stored_key = stored
        .get_item(API_KEY_ITEM)?
        .is_some_and(|k| !k.trim().is_empty());
    let storage: Arc<dyn Storage> = match config.seed_api_key.as_deref() {
        Some(key) if !has_stored_key => Arc::new(MemoryStorage::with_item(API_KEY_ITEM, key)),
        _ => Arc::new(stored),
    };
    let client = TmdbClient::with_base_url(storage, config.tmdb_base_url.as_str())?;

    let page_arg = |idx: usize| -> Result<u32> {
        args.get(idx)
            .map(|p| p.parse::<u32>().context("page must be a positive number"))
            .unwrap_or(Ok(1))
    };

    let response = if first == "search" {
        let query = args
            .get(1)
            .context("search needs a query argument")?;
        client.search_movies(query, page_arg(2)?).await?
    } else {
        let category = first.parse::<Category>()?;
        client.category_movies(category, page_arg(1)?).await?
    };

    println!(
        "page {} of {} ({} results)",
        response.page, response.total_pages, response.total_results
    );
    for movie in &response.results {
        let card = MovieCard::from_movie(movie);
        println!("{}", serde_json::to_string(&card)?);
    }

    Ok(())
}
