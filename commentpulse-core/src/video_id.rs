//! Turns whatever the user pasted (a bare id or one of the many YouTube URL
//! shapes) into a canonical [`VideoId`].

use crate::error::CoreError;
use crate::types::VideoId;
use url::Url;

const SHORT_LINK_HOST: &str = "youtu.be";
const MAIN_HOST: &str = "youtube.com";
const ID_PATH_PREFIXES: [&str; 4] = ["shorts", "embed", "live", "v"];

pub fn parse_video_identifier(input: &str) -> Result<VideoId, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_identifier(input, "input is empty"));
    }

    if VideoId::is_canonical(trimmed) {
        return VideoId::new(trimmed);
    }

    let url = parse_url(trimmed)
        .ok_or_else(|| CoreError::invalid_identifier(trimmed, "not a video id or URL"))?;

    let candidate = extract_from_url(&url).ok_or_else(|| {
        CoreError::invalid_identifier(trimmed, "URL does not reference a video")
    })?;

    if !VideoId::is_canonical(&candidate) {
        return Err(CoreError::invalid_identifier(
            trimmed,
            format!("'{}' is not a valid video id", candidate),
        ));
    }

    VideoId::new(candidate)
}

fn parse_url(input: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(input) {
        if url.has_host() {
            return Some(url);
        }
    }

    // Scheme-less links such as "youtu.be/abc" or "www.youtube.com/watch?v=abc"
    let host = input.split(['/', '?']).next().unwrap_or_default();
    if is_youtube_host(host) {
        return Url::parse(&format!("https://{}", input)).ok();
    }
    None
}

fn is_youtube_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host_matches(&host, SHORT_LINK_HOST) || host_matches(&host, MAIN_HOST)
}

/// `host` is `domain` itself or one of its subdomains.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn extract_from_url(url: &Url) -> Option<String> {
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "v") {
        return Some(value.into_owned());
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if host_matches(&host, SHORT_LINK_HOST) {
        let id = url.path().trim_matches('/');
        return (!id.is_empty()).then(|| id.to_string());
    }

    if host_matches(&host, MAIN_HOST) {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        let prefix = segments.next()?;
        if ID_PATH_PREFIXES.contains(&prefix) {
            return segments.next().map(str::to_string);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_canonical_id_returned_unchanged() {
        for id in [ID, "abcdefghij", "A-b_C-d_E-f_", "0123456789"] {
            assert_eq!(parse_video_identifier(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            parse_video_identifier(&format!("  {}\n", ID)).unwrap().as_str(),
            ID
        );
    }

    #[test]
    fn test_watch_url() {
        let parsed =
            parse_video_identifier(&format!("https://www.youtube.com/watch?v={}&t=42s", ID))
                .unwrap();
        assert_eq!(parsed.as_str(), ID);

        let parsed =
            parse_video_identifier(&format!("https://m.youtube.com/watch?feature=share&v={}", ID))
                .unwrap();
        assert_eq!(parsed.as_str(), ID);
    }

    #[test]
    fn test_short_link() {
        let parsed = parse_video_identifier(&format!("https://youtu.be/{}", ID)).unwrap();
        assert_eq!(parsed.as_str(), ID);

        let parsed = parse_video_identifier(&format!("https://youtu.be/{}/?si=xyz", ID)).unwrap();
        assert_eq!(parsed.as_str(), ID);
    }

    #[test]
    fn test_scheme_less_links() {
        assert_eq!(
            parse_video_identifier(&format!("youtu.be/{}", ID))
                .unwrap()
                .as_str(),
            ID
        );
        assert_eq!(
            parse_video_identifier(&format!("www.youtube.com/watch?v={}", ID))
                .unwrap()
                .as_str(),
            ID
        );
    }

    #[test]
    fn test_path_style_links() {
        for prefix in ["shorts", "embed", "live"] {
            let input = format!("https://www.youtube.com/{}/{}", prefix, ID);
            assert_eq!(parse_video_identifier(&input).unwrap().as_str(), ID);
        }
    }

    #[test]
    fn test_malformed_input_fails() {
        for input in [
            "",
            "   ",
            "short",
            "not a url at all",
            "https://www.youtube.com/",
            "https://www.youtube.com/watch?list=PL123",
            "https://youtu.be/",
            "https://youtu.be/abc",
            "https://example.com/page",
            "https://www.youtube.com/watch?v=bad id!",
        ] {
            let result = parse_video_identifier(input);
            assert!(
                matches!(result, Err(CoreError::InvalidIdentifier { .. })),
                "expected InvalidIdentifier for {:?}, got {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_look_alike_hosts_are_rejected() {
        for input in [
            format!("https://notyoutube.com/shorts/{}", ID),
            format!("https://evilyoutu.be/{}", ID),
            format!("evilyoutu.be/{}", ID),
            format!("notyoutube.com/embed/{}", ID),
        ] {
            let result = parse_video_identifier(&input);
            assert!(
                matches!(result, Err(CoreError::InvalidIdentifier { .. })),
                "expected InvalidIdentifier for {:?}, got {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_host_matching() {
        assert!(host_matches("youtube.com", MAIN_HOST));
        assert!(host_matches("www.youtube.com", MAIN_HOST));
        assert!(host_matches("m.youtube.com", MAIN_HOST));
        assert!(!host_matches("notyoutube.com", MAIN_HOST));
        assert!(!host_matches("youtube.com.evil.org", MAIN_HOST));
        assert!(!host_matches("evilyoutu.be", SHORT_LINK_HOST));
    }

    #[test]
    fn test_error_carries_offending_input() {
        match parse_video_identifier("https://example.com/page") {
            Err(CoreError::InvalidIdentifier { input, .. }) => {
                assert_eq!(input, "https://example.com/page")
            }
            other => panic!("Expected InvalidIdentifier, got {:?}", other),
        }
    }
}
