//! Title normalisation: slugification, article stripping, metadata-bracket
//! extraction, and primary/secondary title splitting (spec §4.A).
//!
//! Every function here is pure and total: the empty string slugifies to the
//! empty slug, `split_title` on a delimiterless title returns it unchanged,
//! and nothing panics.

use super::types::{MediaType, Slug};

/// Leading articles stripped from the front of a title, per media type.
/// Checked case-insensitively against the first whitespace-delimited word.
fn leading_articles(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Movie => &["the", "a", "an", "le", "la", "les"],
        MediaType::Application => &["the", "a", "an"],
        MediaType::Game | MediaType::Unknown => &["the", "a", "an"],
    }
}

/// Single-character tokens dropped as stopwords after tokenisation.
const SINGLE_CHAR_STOPWORDS: &[&str] = &["a"];

/// Suffix phrases recognised and stripped from the tail of a (bracket-free)
/// title. Matched case-insensitively, longest-first, repeatedly from the end
/// — a fixed literal list, not a regex (§9 design note #2: false positives
/// on titles that legitimately contain these words are accepted, since the
/// fuzzy strategies downstream recover).
const EDITION_SUFFIXES: &[&str] = &[
    "game of the year edition",
    "definitive edition",
    "collector's edition",
    "limited edition",
    "deluxe edition",
    "special edition",
    "anniversary edition",
    "enhanced edition",
    "complete edition",
    "gold edition",
    "remastered",
    "remaster",
    "director's cut",
];

/// Roman numerals up to XX, mapped to Arabic digits. Only matched as an
/// entire standalone token (case-insensitive).
const ROMAN_NUMERALS: &[(&str, &str)] = &[
    ("XX", "20"), ("XIX", "19"), ("XVIII", "18"), ("XVII", "17"), ("XVI", "16"),
    ("XV", "15"), ("XIV", "14"), ("XIII", "13"), ("XII", "12"), ("XI", "11"),
    ("X", "10"), ("IX", "9"), ("VIII", "8"), ("VII", "7"), ("VI", "6"),
    ("V", "5"), ("IV", "4"), ("III", "3"), ("II", "2"), ("I", "1"),
];

fn roman_to_arabic(token: &str) -> Option<&'static str> {
    let upper = token.to_ascii_uppercase();
    ROMAN_NUMERALS.iter().find(|(roman, _)| *roman == upper).map(|(_, arabic)| *arabic)
}

/// Strip the leading article (if any) from `title`. Operates on the first
/// whitespace-delimited word only, so repeated application on ordinary
/// (single-article) titles is idempotent.
pub fn strip_leading_article(media_type: MediaType, title: &str) -> String {
    let trimmed = title.trim_start();
    let Some(first_space) = trimmed.find(char::is_whitespace) else {
        return trimmed.to_string();
    };
    let first_word = &trimmed[..first_space];
    let articles = leading_articles(media_type);
    if articles.iter().any(|a| a.eq_ignore_ascii_case(first_word)) {
        trimmed[first_space..].trim_start().to_string()
    } else {
        trimmed.to_string()
    }
}

fn has_leading_article(media_type: MediaType, title: &str) -> bool {
    let trimmed = title.trim_start();
    let first_word = trimmed
        .find(char::is_whitespace)
        .map(|idx| &trimmed[..idx])
        .unwrap_or(trimmed);
    leading_articles(media_type).iter().any(|a| a.eq_ignore_ascii_case(first_word))
}

/// Remove every top-level `(...)` or `[...]` run from `text`, treating
/// nested brackets of the same kind as opaque (not separately parsed).
/// An unmatched opening bracket and everything after it is dropped.
pub fn strip_metadata_brackets(text: &str) -> String {
    strip_bracket_kind(&strip_bracket_kind(text, '(', ')'), '[', ']')
}

fn strip_bracket_kind(text: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth: i32 = 0;
    for ch in text.chars() {
        if ch == open {
            depth += 1;
            continue;
        }
        if ch == close {
            if depth > 0 {
                depth -= 1;
            }
            continue;
        }
        if depth == 0 {
            out.push(ch);
        }
    }
    out
}

/// Strip recognised edition/version suffixes from the tail of `text`
/// (already bracket-free). Repeats until no further suffix matches.
pub fn strip_edition_and_version_suffixes(text: &str) -> String {
    let mut current = text.trim_end().to_string();
    loop {
        let before = current.len();
        current = strip_one_edition_suffix(&current);
        current = strip_one_version_suffix(&current);
        if current.len() == before {
            break;
        }
    }
    current.trim_end().to_string()
}

fn strip_one_edition_suffix(text: &str) -> String {
    let trimmed = text.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    for suffix in EDITION_SUFFIXES {
        if lower.ends_with(suffix) {
            let cut = trimmed.len() - suffix.len();
            return trimmed[..cut].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Strip a trailing version/revision marker: `v1.0`, `v2.01`, `Rev A`, `Rev 1`.
fn strip_one_version_suffix(text: &str) -> String {
    let trimmed = text.trim_end();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.is_empty() {
        return trimmed.to_string();
    }
    let last = *words.last().unwrap();
    let last_lower = last.to_ascii_lowercase();

    // "v1.0" / "v2.01" style: starts with 'v' followed by digits/dots.
    if let Some(rest) = last_lower.strip_prefix('v') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return words[..words.len() - 1].join(" ");
        }
    }

    // "Rev A" / "Rev 1": two-word trailing pattern.
    if words.len() >= 2 {
        let second_last = words[words.len() - 2].to_ascii_lowercase();
        if second_last == "rev" && (last.len() <= 2) {
            return words[..words.len() - 2].join(" ");
        }
    }

    trimmed.to_string()
}

/// Split on the first of ` - `, `: `, `'s ` with priority `": "` > `" - "` >
/// `"'s "` when more than one is present (spec §4.A). Whitespace around the
/// delimiter is consumed. Returns `(title, "", false)` when none is found.
pub fn split_title(title: &str) -> (String, String, bool) {
    const DELIMS: &[&str] = &[": ", " - ", "'s "];
    for delim in DELIMS {
        if let Some(idx) = title.find(delim) {
            let main = title[..idx].trim_end().to_string();
            let secondary = title[idx + delim.len()..].trim_start().to_string();
            return (main, secondary, true);
        }
    }
    (title.to_string(), String::new(), false)
}

fn is_alphanumeric_boundary_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Tokenise `text` on non-alphanumeric boundaries, lower-casing each token,
/// converting standalone Roman numerals (≤ XX) to Arabic digits, and
/// dropping single-character stopword tokens.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in lower.chars() {
        if is_alphanumeric_boundary_char(c) {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .filter_map(|tok| {
            let converted = roman_to_arabic(&tok).map(|s| s.to_string()).unwrap_or(tok);
            if converted.chars().count() <= 1 && SINGLE_CHAR_STOPWORDS.contains(&converted.as_str()) {
                None
            } else {
                Some(converted)
            }
        })
        .collect()
}

/// Slugify `title` for `media_type`, returning both the concatenated slug
/// and the token list that produced it (word boundaries are only ever
/// available from this form).
pub fn slugify_with_tokens(media_type: MediaType, title: &str) -> (Slug, Vec<String>) {
    let stripped_article = strip_leading_article(media_type, title);
    let no_brackets = strip_metadata_brackets(&stripped_article);
    let no_suffix = strip_edition_and_version_suffixes(&no_brackets);
    let tokens = tokenize(&no_suffix);
    let slug = Slug::new(tokens.concat());
    (slug, tokens)
}

/// Slugify `title` for `media_type` into its canonical slug (spec §4.A).
pub fn slugify(media_type: MediaType, title: &str) -> Slug {
    slugify_with_tokens(media_type, title).0
}

pub fn title_has_leading_article(media_type: MediaType, title: &str) -> bool {
    has_leading_article(media_type, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_slug() {
        let (slug, tokens) = slugify_with_tokens(MediaType::Game, "");
        assert!(slug.is_empty());
        assert!(tokens.is_empty());
    }

    #[test]
    fn strips_leading_article_and_lowercases() {
        let slug = slugify(MediaType::Game, "The Legend of Zelda");
        assert_eq!(slug.as_str(), "legendofzelda");
    }

    #[test]
    fn strip_leading_article_is_idempotent() {
        let once = strip_leading_article(MediaType::Game, "The Legend of Zelda");
        let twice = strip_leading_article(MediaType::Game, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_metadata_brackets_including_nested() {
        let out = strip_metadata_brackets("Super Mario World (USA) (Rev A) [T+Eng(nested)]");
        assert_eq!(out.trim(), "Super Mario World");
    }

    #[test]
    fn unmatched_open_bracket_consumes_rest() {
        let out = strip_metadata_brackets("Game (unterminated");
        assert_eq!(out.trim(), "Game");
    }

    #[test]
    fn converts_roman_numerals_to_digits() {
        let slug = slugify(MediaType::Game, "Final Fantasy XII");
        assert_eq!(slug.as_str(), "finalfantasy12");
    }

    #[test]
    fn split_title_prefers_colon_over_dash_over_possessive() {
        let (main, sec, split) = split_title("Mario's World - The Legend: Ocarina");
        assert!(split);
        assert_eq!(main, "Mario's World - The Legend");
        assert_eq!(sec, "Ocarina");
    }

    #[test]
    fn split_title_falls_back_to_dash() {
        let (main, sec, split) = split_title("Castlevania - Symphony of the Night");
        assert!(split);
        assert_eq!(main, "Castlevania");
        assert_eq!(sec, "Symphony of the Night");
    }

    #[test]
    fn split_title_no_delimiter() {
        let (main, sec, split) = split_title("Chrono Trigger");
        assert_eq!(main, "Chrono Trigger");
        assert_eq!(sec, "");
        assert!(!split);
    }

    #[test]
    fn strips_edition_suffix() {
        let out = strip_edition_and_version_suffixes("Super Mario World Special Edition");
        assert_eq!(out, "Super Mario World");
    }

    #[test]
    fn strips_version_suffix() {
        assert_eq!(strip_edition_and_version_suffixes("Game v1.0"), "Game");
        assert_eq!(strip_edition_and_version_suffixes("Game Rev A"), "Game");
    }

    #[test]
    fn slugify_is_pure() {
        let a = slugify(MediaType::Game, "crono tigger");
        let b = slugify(MediaType::Game, "crono tigger");
        assert_eq!(a, b);
    }
}
