use regex::Regex;
use std::sync::OnceLock;

static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("static pattern"))
}

/// Collapse a free-form name into a provider-safe slug. Runs of
/// non-alphanumerics become single hyphens with the edges trimmed; an
/// empty result falls back to `new-project`.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let collapsed = slug_pattern().replace_all(&lowered, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "new-project".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Character-safe prefix for provider name-length limits.
pub fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Split a domain into (label, tld) after lowercasing and stripping a
/// trailing dot. Returns `None` unless the label is `[a-z0-9-]+` and the
/// tld (which may itself be dotted, e.g. `co.uk`) is `[a-z0-9.-]+`.
pub fn parse_domain(domain_name: &str) -> Option<(String, String)> {
    let cleaned = domain_name.trim().to_lowercase();
    let cleaned = cleaned.trim_end_matches('.');
    let (label, tld) = cleaned.split_once('.')?;
    if label.is_empty() || tld.is_empty() {
        return None;
    }
    let label_ok = label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let tld_ok = tld
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if !label_ok || !tld_ok {
        return None;
    }
    Some((label.to_string(), tld.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_runs_and_lowercases() {
        assert_eq!(slugify("Island Breeze!"), "island-breeze");
        assert_eq!(slugify("  My   App 2.0  "), "my-app-2-0");
        assert_eq!(slugify("caf\u{e9} au lait"), "caf-au-lait");
    }

    #[test]
    fn slugify_falls_back_on_empty_results() {
        assert_eq!(slugify(""), "new-project");
        assert_eq!(slugify("!!!"), "new-project");
        assert_eq!(slugify("---"), "new-project");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("abcdef", 4), "abcd");
        assert_eq!(truncate("ab", 4), "ab");
        assert_eq!(truncate("\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}");
    }

    #[test]
    fn parse_domain_accepts_plain_and_dotted_tlds() {
        assert_eq!(
            parse_domain("example.com"),
            Some(("example".to_string(), "com".to_string()))
        );
        assert_eq!(
            parse_domain("My-Site.CO.UK"),
            Some(("my-site".to_string(), "co.uk".to_string()))
        );
        assert_eq!(
            parse_domain("example.com."),
            Some(("example".to_string(), "com".to_string()))
        );
    }

    #[test]
    fn parse_domain_rejects_malformed_input() {
        assert_eq!(parse_domain("nodots"), None);
        assert_eq!(parse_domain(".com"), None);
        assert_eq!(parse_domain("bad_chars.com"), None);
        assert_eq!(parse_domain("spaced name.com"), None);
        assert_eq!(parse_domain(""), None);
    }
}
