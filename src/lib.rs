//! Movie discovery backend over The Movie Database (TMDB): browse categories, search, paginate
//! and preview movies, with the TMDB API key persisted locally.

pub mod app;
pub mod browse;
pub mod config;
pub mod detail;
pub mod storage;
pub mod tmdb;
pub mod trailer;
