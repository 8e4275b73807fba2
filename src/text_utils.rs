use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

/// Lowercase, ASCII-only, `[a-z0-9-]` tag. Returns `None` when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    lazy_static! {
        static ref INVALID_TAG_CHARS: Regex = Regex::new(r"[^a-z0-9-]").unwrap();
    }

    let ascii = unidecode::unidecode(tag).to_lowercase();
    let tag = INVALID_TAG_CHARS.replace_all(&ascii, "");
    if tag.is_empty() {
        return None;
    }
    Some(tag.to_string())
}

pub fn strip_html(html: &str) -> String {
    lazy_static! {
        static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
        static ref SPACES: Regex = Regex::new(r"\s+").unwrap();
    }

    let text = HTML_TAG.replace_all(html, " ");
    let text = text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    SPACES.replace_all(text.trim(), " ").to_string()
}

pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_html(html);
    if text.chars().count() <= max_chars {
        return text;
    }

    let cut: String = text.chars().take(max_chars).collect();
    // Avoid cutting a word in half when possible
    let cut = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}

pub fn reading_time_minutes(html: &str) -> usize {
    let words = strip_html(html).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

pub fn format_date_time(date_time: &DateTime<Utc>) -> (String, String) {
    let date = date_time.format("%Y-%m-%d").to_string();
    let time = date_time.format("%H:%M:%S").to_string();
    (date, time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Rust"), Some("rust".to_string()));
        assert_eq!(normalize_tag("  web dev "), Some("webdev".to_string()));
        assert_eq!(normalize_tag("C++"), Some("c".to_string()));
        assert_eq!(normalize_tag("café-2024"), Some("cafe-2024".to_string()));
        assert_eq!(normalize_tag("#!?"), None);
        assert_eq!(normalize_tag(""), None);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>\n<p>again &amp; again</p>"), "Hello world again & again");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("<p>short</p>", 10), "short");
        assert_eq!(excerpt("<p>one two three four</p>", 10), "one two...");
        assert_eq!(excerpt("abcdefghijkl", 5), "abcde...");
    }

    #[test]
    fn test_format_date_time() {
        use chrono::TimeZone;
        let date_time = Utc.with_ymd_and_hms(2017, 9, 10, 10, 42, 32).unwrap();
        let (date, time) = format_date_time(&date_time);
        assert_eq!(date, "2017-09-10");
        assert_eq!(time, "10:42:32");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
    }
}
