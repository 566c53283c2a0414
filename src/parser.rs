//! Splits a raw chat message into the user's own words and the IMDb title
//! links pasted alongside them.

use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://www\.imdb\.com/title/tt[0-9]+(/\S*)?").expect("Failed to compile title URL pattern")
});

// IMDb appends `ref_=sr_t_<n>` when a link is copied from search results,
// often with the closing paren of a markdown-style link after it.
static REF_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ref_=sr_t_[0-9]+\)?").expect("Failed to compile ref suffix pattern")
});

static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*\)").expect("Failed to compile empty parens pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// HTML-escaped free text.
    pub description: String,
    pub referenced_urls: Vec<String>,
}

pub fn parse(raw: &str) -> ParsedInput {
    let referenced_urls: Vec<String> = TITLE_URL
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect();

    let description = match REF_SUFFIX.find_iter(raw).last() {
        Some(last) => raw[last.end()..].trim().to_string(),
        None => {
            let without_urls = TITLE_URL.replace_all(raw, "");
            EMPTY_PARENS.replace_all(&without_urls, "").trim().to_string()
        }
    };

    ParsedInput {
        description: escape_html(&description),
        referenced_urls,
    }
}

/// Neutralizes `& < > " '` so the text can sit inside generated markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
