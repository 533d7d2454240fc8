use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

const TITLE_PATTERNS: &[&str] = &[
    r"^EPISODE TITLE:[ \t]*(.*)",
    r"^TITLE:[ \t]*(.*)",
    r"^PODCAST TITLE:[ \t]*(.*)",
    r"^##[ \t]*(.*)",
    r"^#[ \t]*(.*)",
    r"^Episode:[ \t]*(.*)",
];

const TITLE_PREFIXES: &[&str] = &["EPISODE TITLE:", "TITLE:", "PODCAST TITLE:"];

const MAX_FILENAME_LEN: usize = 100;

/// Returns the title announced at the start of the script, if any.
pub fn extract_title(script: &str) -> Option<String> {
    let trailing_dashes = Regex::new(r"\s*-+$").ok()?;
    let quotes = Regex::new(r#"^["']|["']$"#).ok()?;

    for pattern in TITLE_PATTERNS {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .ok()?;

        if let Some(caps) = regex.captures(script.trim_start()) {
            let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim();
            let title = trailing_dashes.replace(raw, "");
            let title = quotes.replace_all(&title, "");
            let title = title.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }

    None
}

pub fn default_title(date: NaiveDate) -> String {
    format!("Dynamic Podcast Episode - {}", date.format("%B %d, %Y"))
}

/// Drops a leading title line so it never reaches synthesis.
pub fn strip_title_line(script: &str) -> &str {
    let first = script.lines().next().unwrap_or("").trim().to_uppercase();
    if TITLE_PREFIXES.iter().any(|prefix| first.starts_with(prefix)) {
        match script.find('\n') {
            Some(idx) => script[idx + 1..].trim(),
            None => "",
        }
    } else {
        script
    }
}

pub fn safe_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_FILENAME_LEN)
        .collect()
}
