use crate::tmdb::MovieVideo;

const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed";
const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch?v=";

fn is_youtube(video: &MovieVideo) -> bool {
    video.site == "YouTube"
}

/// The video to show first: an official YouTube trailer, otherwise any YouTube video.
pub fn main_trailer(videos: &[MovieVideo]) -> Option<&MovieVideo> {
    videos
        .iter()
        .find(|v| is_youtube(v) && v.video_type == "Trailer" && v.official)
        .or_else(|| videos.iter().find(|v| is_youtube(v)))
}

/// Videos the player can switch between, in API order.
pub fn playable_videos(videos: &[MovieVideo]) -> Vec<&MovieVideo> {
    videos.iter().filter(|v| is_youtube(v)).collect()
}

pub fn embed_url(video: &MovieVideo) -> String {
    format!("{YOUTUBE_EMBED}/{}", video.key)
}

pub fn watch_url(video: &MovieVideo) -> String {
    format!("{YOUTUBE_WATCH}{}", video.key)
}
