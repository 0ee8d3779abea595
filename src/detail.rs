use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{error, info};

use crate::tmdb::{self, Movie, MovieDetails, MovieVideo, TmdbApi};
use crate::trailer;

pub const DETAIL_FAILED_NOTICE: &str = "Failed to load movie details. Please check your API key.";

/// What a grid cell shows for one movie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub release_year: String,
    pub rating: String,
}

impl MovieCard {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            poster_url: tmdb::poster_url(movie.poster_path.as_deref()),
            release_year: release_year(&movie.release_date),
            rating: rating(movie.vote_average),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrailerView {
    pub id: String,
    pub name: String,
    pub video_type: String,
    pub embed_url: String,
    pub watch_url: String,
}

impl TrailerView {
    fn from_video(video: &MovieVideo) -> Self {
        Self {
            id: video.id.clone(),
            name: video.name.clone(),
            video_type: video.video_type.clone(),
            embed_url: trailer::embed_url(video),
            watch_url: trailer::watch_url(video),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailView {
    pub details: MovieDetails,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_year: String,
    pub rating: String,
    pub runtime: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub genres: Vec<String>,
    pub main_trailer: Option<TrailerView>,
    pub videos: Vec<TrailerView>,
}

impl MovieDetailView {
    pub fn new(details: MovieDetails, videos: &[MovieVideo]) -> Self {
        let movie = &details.movie;
        Self {
            poster_url: tmdb::poster_url(movie.poster_path.as_deref()),
            backdrop_url: tmdb::backdrop_url(movie.backdrop_path.as_deref()),
            release_year: release_year(&movie.release_date),
            rating: rating(movie.vote_average),
            runtime: details.runtime.filter(|m| *m > 0).map(format_runtime),
            budget: Some(details.budget)
                .filter(|b| *b > 0)
                .map(format_currency),
            revenue: Some(details.revenue)
                .filter(|r| *r > 0)
                .map(format_currency),
            genres: details.genres.iter().map(|g| g.name.clone()).collect(),
            main_trailer: trailer::main_trailer(videos).map(TrailerView::from_video),
            videos: trailer::playable_videos(videos)
                .into_iter()
                .map(TrailerView::from_video)
                .collect(),
            details,
        }
    }
}

/// Loads details and videos concurrently; both must succeed.
pub async fn load_movie_detail(api: &dyn TmdbApi, id: i64) -> Result<MovieDetailView> {
    let loaded = tokio::try_join!(api.movie_details(id), api.movie_videos(id));
    match loaded {
        Ok((details, videos)) => {
            info!(
                movie_id = id,
                title = %details.movie.title,
                videos = videos.results.len(),
                "Loaded movie detail"
            );
            Ok(MovieDetailView::new(details, &videos.results))
        }
        Err(e) => {
            error!("Failed to fetch movie details: {:?}", e);
            Err(e).context(DETAIL_FAILED_NOTICE)
        }
    }
}

/// Year of a `YYYY-MM-DD` release date, or `TBA`.
pub fn release_year(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.year().to_string())
        .unwrap_or_else(|_| "TBA".to_string())
}

/// One decimal place, or `N/A` for unrated movies.
pub fn rating(vote_average: f64) -> String {
    if vote_average > 0.0 {
        format!("{vote_average:.1}")
    } else {
        "N/A".to_string()
    }
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Whole US dollars with thousands separators, e.g. `$160,000,000`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details() -> MovieDetails {
        serde_json::from_value(json!({
            "id": 27205,
            "title": "Inception",
            "poster_path": "/poster.jpg",
            "backdrop_path": null,
            "release_date": "2010-07-15",
            "vote_average": 8.367,
            "genres": [{ "id": 28, "name": "Action" }, { "id": 878, "name": "Science Fiction" }],
            "runtime": 148,
            "budget": 160000000,
            "revenue": 0
        }))
        .expect("details fixture")
    }

    fn video(id: &str, site: &str, kind: &str, official: bool) -> MovieVideo {
        MovieVideo {
            id: id.to_string(),
            key: format!("k{id}"),
            name: format!("Video {id}"),
            site: site.to_string(),
            video_type: kind.to_string(),
            official,
            published_at: String::new(),
        }
    }

    #[test]
    fn formats_display_fields() {
        assert_eq!(release_year("2010-07-15"), "2010");
        assert_eq!(release_year(""), "TBA");
        assert_eq!(release_year("soon"), "TBA");
        assert_eq!(rating(8.367), "8.4");
        assert_eq!(rating(0.0), "N/A");
        assert_eq!(format_runtime(148), "2h 28m");
        assert_eq!(format_runtime(45), "0h 45m");
        assert_eq!(format_currency(160_000_000), "$160,000,000");
        assert_eq!(format_currency(999), "$999");
        assert_eq!(format_currency(1_000), "$1,000");
    }

    #[test]
    fn detail_view_combines_details_and_videos() {
        let videos = vec![
            video("1", "Vimeo", "Trailer", true),
            video("2", "YouTube", "Teaser", false),
            video("3", "YouTube", "Trailer", true),
        ];
        let view = MovieDetailView::new(details(), &videos);

        assert_eq!(
            view.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(view.backdrop_url, None);
        assert_eq!(view.release_year, "2010");
        assert_eq!(view.rating, "8.4");
        assert_eq!(view.runtime.as_deref(), Some("2h 28m"));
        assert_eq!(view.budget.as_deref(), Some("$160,000,000"));
        assert_eq!(view.revenue, None);
        assert_eq!(view.genres, vec!["Action", "Science Fiction"]);
        let main = view.main_trailer.expect("main trailer");
        assert_eq!(main.id, "3");
        assert_eq!(main.embed_url, "https://www.youtube.com/embed/k3");
        assert_eq!(view.videos.len(), 2);
    }

    #[test]
    fn card_uses_poster_size() {
        let card = MovieCard::from_movie(&details().movie);
        assert_eq!(card.id, 27205);
        assert_eq!(
            card.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(card.rating, "8.4");
    }
}
