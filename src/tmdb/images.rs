use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Size token TMDB accepts in image URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    W200,
    W300,
    W400,
    #[default]
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub const ALL: [ImageSize; 6] = [
        ImageSize::W200,
        ImageSize::W300,
        ImageSize::W400,
        ImageSize::W500,
        ImageSize::W780,
        ImageSize::Original,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W200 => "w200",
            ImageSize::W300 => "w300",
            ImageSize::W400 => "w400",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        ImageSize::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown image size '{}'", s))
    }
}

/// `<IMAGE_BASE>/<size><path>`, or `None` when there is no path.
pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    if path.starts_with('/') {
        Some(format!("{IMAGE_BASE}/{size}{path}"))
    } else {
        Some(format!("{IMAGE_BASE}/{size}/{path}"))
    }
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    image_url(path, ImageSize::W500)
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    image_url(path, ImageSize::W780)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_path_yields_none_for_every_size() {
        for size in ImageSize::ALL {
            assert_eq!(image_url(None, size), None);
            assert_eq!(image_url(Some(""), size), None);
        }
    }

    #[test]
    fn builds_host_size_path() {
        assert_eq!(
            image_url(Some("/abc.jpg"), ImageSize::W200).as_deref(),
            Some("https://image.tmdb.org/t/p/w200/abc.jpg")
        );
        assert_eq!(
            image_url(Some("/abc.jpg"), ImageSize::Original).as_deref(),
            Some("https://image.tmdb.org/t/p/original/abc.jpg")
        );
        assert_eq!(
            image_url(Some("abc.jpg"), ImageSize::W300).as_deref(),
            Some("https://image.tmdb.org/t/p/w300/abc.jpg")
        );
    }

    #[test]
    fn poster_and_backdrop_use_their_sizes() {
        assert_eq!(
            poster_url(Some("/p.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        assert_eq!(
            backdrop_url(Some("/b.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w780/b.jpg")
        );
        assert_eq!(ImageSize::default(), ImageSize::W500);
    }

    #[test]
    fn parses_size_tokens() {
        assert_eq!("w780".parse::<ImageSize>().unwrap(), ImageSize::W780);
        assert_eq!("ORIGINAL".parse::<ImageSize>().unwrap(), ImageSize::Original);
        assert!("w999".parse::<ImageSize>().is_err());
    }
}
