use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub video: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokenLanguage {
    pub iso_639_1: String,
    pub name: String,
}

/// Movie plus the fields only the details endpoint returns. The details payload carries
/// `genres` instead of `genre_ids`, which the flattened `Movie` defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    pub production_countries: Vec<ProductionCountry>,
    #[serde(default)]
    pub spoken_languages: Vec<SpokenLanguage>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieVideo {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<MovieVideo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

/// Browse facets offered next to the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Popular,
    Trending,
    TopRated,
    Upcoming,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Popular,
        Category::Trending,
        Category::TopRated,
        Category::Upcoming,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::Trending => "trending",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Popular => "Popular",
            Category::Trending => "Trending",
            Category::TopRated => "Top Rated",
            Category::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown category '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_list_item_with_missing_optionals() {
        let value = json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": null,
            "vote_average": 8.4
        });
        let movie: Movie = serde_json::from_value(value).expect("movie deserialize");
        assert_eq!(movie.id, 550);
        assert_eq!(movie.poster_path, None);
        assert!(movie.genre_ids.is_empty());
        assert_eq!(movie.release_date, "");
    }

    #[test]
    fn details_flatten_the_movie_fields() {
        let value = json!({
            "id": 27205,
            "title": "Inception",
            "overview": "Dreams.",
            "poster_path": "/p.jpg",
            "backdrop_path": "/b.jpg",
            "release_date": "2010-07-15",
            "vote_average": 8.4,
            "genres": [{ "id": 28, "name": "Action" }],
            "runtime": 148,
            "budget": 160000000,
            "revenue": 825532764,
            "production_companies": [{ "id": 923, "name": "Legendary", "logo_path": null }],
            "spoken_languages": [{ "iso_639_1": "en", "name": "English" }],
            "status": "Released",
            "tagline": "Your mind is the scene of the crime."
        });
        let details: MovieDetails = serde_json::from_value(value).expect("details deserialize");
        assert_eq!(details.movie.title, "Inception");
        assert_eq!(details.runtime, Some(148));
        assert_eq!(details.genres[0].name, "Action");
        assert!(details.production_countries.is_empty());
    }

    #[test]
    fn video_type_maps_from_type_field() {
        let value = json!({
            "results": [{
                "id": "v1", "key": "abc", "name": "Official Trailer",
                "site": "YouTube", "type": "Trailer", "official": true,
                "published_at": "2010-05-01T00:00:00.000Z"
            }]
        });
        let list: VideoList = serde_json::from_value(value).expect("videos deserialize");
        assert_eq!(list.results[0].video_type, "Trailer");
        assert!(list.results[0].official);
    }

    #[test]
    fn category_ids_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.id().parse::<Category>().unwrap(), category);
        }
        assert_eq!(" Top_Rated ".parse::<Category>().unwrap(), Category::TopRated);
        assert!("now_playing".parse::<Category>().is_err());
        assert_eq!(Category::TopRated.label(), "Top Rated");
        assert_eq!(
            serde_json::to_value(Category::TopRated).unwrap(),
            json!("top_rated")
        );
    }
}
