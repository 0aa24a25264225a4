//! Input validation primitives. Pure functions; callers decide
//! what to do with a `false`/`None` result.

const MAX_FREE_TEXT_LEN: usize = 512;
const MAX_COOKIE_LEN: usize = 4 * 1024;
const MAX_API_KEY_LEN: usize = 256;

#[must_use]
pub fn is_valid_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

#[must_use]
pub fn is_valid_file_index(raw: &str) -> bool {
    raw.parse::<u32>().is_ok()
}

#[must_use]
pub fn is_valid_imdb_id(id: &str) -> bool {
    let Some(digits) = id.strip_prefix("tt") else { return false };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// `tt1234567` or `tt1234567:season:episode`, both numeric.
#[must_use]
pub fn is_valid_series_id(id: &str) -> bool {
    let mut parts = id.splitn(3, ':');
    let Some(base) = parts.next() else { return false };
    if !is_valid_imdb_id(base) {
        return false;
    }
    match (parts.next(), parts.next()) {
        (Some(season), Some(episode)) => {
            !season.is_empty()
                && !episode.is_empty()
                && season.chars().all(|c| c.is_ascii_digit())
                && episode.chars().all(|c| c.is_ascii_digit())
        }
        (None, None) => true,
        _ => false,
    }
}

/// API keys are restricted to a safe character class and bounded length —
/// they ride in query strings and must never contain characters that
/// could break a URL or a log line.
#[must_use]
pub fn is_valid_api_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_API_KEY_LEN
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[must_use]
pub fn is_valid_cookie(cookie: &str) -> bool {
    cookie.len() <= MAX_COOKIE_LEN && !cookie.contains('\r') && !cookie.contains('\n')
}

/// Caps length and strips control/HTML-sensitive characters from a
/// free-text query parameter (blacklist terms, language list, etc).
#[must_use]
pub fn sanitize_free_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | '"' | '\''))
        .take(MAX_FREE_TEXT_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_hash_requires_forty_hex_chars() {
        assert!(is_valid_info_hash(&"a".repeat(40)));
        assert!(!is_valid_info_hash(&"a".repeat(39)));
        assert!(!is_valid_info_hash(&"z".repeat(40)));
    }

    #[test]
    fn imdb_id_requires_tt_prefix_and_digits() {
        assert!(is_valid_imdb_id("tt1234567"));
        assert!(!is_valid_imdb_id("nm1234567"));
        assert!(!is_valid_imdb_id("tt"));
    }

    #[test]
    fn series_id_accepts_season_episode_suffix() {
        assert!(is_valid_series_id("tt1234567:1:2"));
        assert!(is_valid_series_id("tt1234567"));
        assert!(!is_valid_series_id("tt1234567:1"));
        assert!(!is_valid_series_id("tt1234567:a:b"));
    }

    #[test]
    fn api_key_rejects_unsafe_characters() {
        assert!(is_valid_api_key("abc123-_XYZ"));
        assert!(!is_valid_api_key("abc 123"));
        assert!(!is_valid_api_key(""));
    }

    #[test]
    fn cookie_rejects_crlf_and_oversize() {
        assert!(is_valid_cookie("session=abc"));
        assert!(!is_valid_cookie("session=abc\r\nSet-Cookie: evil"));
        assert!(!is_valid_cookie(&"a".repeat(5000)));
    }

    #[test]
    fn sanitize_strips_html_sensitive_characters() {
        assert_eq!(sanitize_free_text("<script>alert(1)</script>"), "scriptalert(1)/script");
    }
}
