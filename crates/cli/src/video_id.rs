//! Extracting a YouTube video id from user input.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("built-in id pattern"));

/// Tried in order against URLs.
static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // youtube.com/watch?v=<id>
        r"[?&]v=([A-Za-z0-9_-]{11})",
        // youtu.be/<id>
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        // youtube.com/shorts/<id>, youtube.com/embed/<id>
        r"/(?:shorts|embed)/([A-Za-z0-9_-]{11})",
        // any standalone 11 character token
        r"(?:^|[^A-Za-z0-9_-])([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in url pattern"))
    .collect()
});

/// Returns the 11 character video id in `input`, if there is one.
pub fn parse_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id() {
        assert_eq!(parse_video_id(" YoHD9XEInc0 ").as_deref(), Some("YoHD9XEInc0"));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=YoHD9XEInc0&t=42s").as_deref(),
            Some("YoHD9XEInc0")
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?feature=share&v=8hP9D6kZseM").as_deref(),
            Some("8hP9D6kZseM")
        );
    }

    #[test]
    fn test_short_links() {
        assert_eq!(
            parse_video_id("https://youtu.be/YoHD9XEInc0?si=abc").as_deref(),
            Some("YoHD9XEInc0")
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/shorts/a_b-c1234XY").as_deref(),
            Some("a_b-c1234XY")
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/embed/YoHD9XEInc0").as_deref(),
            Some("YoHD9XEInc0")
        );
    }

    #[test]
    fn test_standalone_token_in_text() {
        assert_eq!(
            parse_video_id("trailer: YoHD9XEInc0 (german)").as_deref(),
            Some("YoHD9XEInc0")
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_video_id(""), None);
        assert_eq!(parse_video_id("not a video"), None);
        assert_eq!(parse_video_id("YoHD9XEInc0toolong"), None);
    }
}
