//! Utility functions and helpers

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};

static INT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

/// Parse the leading integer of a form value.
///
/// Leading whitespace and a sign are accepted, trailing garbage is ignored
/// (`"348€"` gives `348`), and `None` is returned when no digit leads the
/// value. Values that overflow `i64` are treated as unparsable.
pub fn parse_int_prefix(value: &str) -> Option<i64> {
    INT_PREFIX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Last path segment of a file input value, handling browser fake paths
/// such as `C:\fakepath\photo.jpg`.
pub fn file_name_from_path(path: &str) -> &str {
    path.rsplit(|c| c == '\\' || c == '/').next().unwrap_or(path)
}

/// Lowercased extension of a file name, `None` when there is no dot
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Escape text for inclusion in HTML content or quoted attributes
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format an integer amount in euros with a thousands separator
pub fn format_amount(amount: Option<i64>) -> String {
    match amount {
        Some(n) => {
            let digits = n.unsigned_abs().to_string();
            let mut grouped = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(' ');
                }
                grouped.push(c);
            }
            if n < 0 {
                format!("-{} €", grouped)
            } else {
                format!("{} €", grouped)
            }
        }
        None => "-".to_string(),
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID
pub fn generate_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{:04}", now, seq % 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("348"), Some(348));
        assert_eq!(parse_int_prefix("  20 "), Some(20));
        assert_eq!(parse_int_prefix("-5"), Some(-5));
        assert_eq!(parse_int_prefix("12.75"), Some(12));
        assert_eq!(parse_int_prefix("70abc"), Some(70));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), None);
    }

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(file_name_from_path("C:\\fakepath\\photo.jpg"), "photo.jpg");
        assert_eq!(file_name_from_path("/tmp/scan.png"), "scan.png");
        assert_eq!(file_name_from_path("plain.jpeg"), "plain.jpeg");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("photo."), Some(String::new()));
        assert_eq!(file_extension("jpg"), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<img src=\"x\" onerror='a&b'>"),
            "&lt;img src=&quot;x&quot; onerror=&#39;a&amp;b&#39;&gt;"
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Some(348)), "348 €");
        assert_eq!(format_amount(Some(1234567)), "1 234 567 €");
        assert_eq!(format_amount(Some(-1200)), "-1 200 €");
        assert_eq!(format_amount(None), "-");
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
