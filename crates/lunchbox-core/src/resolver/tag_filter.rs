//! Canonical `(operator? type:value)` tag syntax parsing and merge
//! precedence (spec §4.B). Independent of [`crate::tags`], which parses
//! human-readable bracket annotations like `(USA)` for display purposes.

use super::types::{TagFilter, TagOperator};

fn is_type_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_type_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Try to parse a single `operator? type:value` span (without the
/// enclosing parentheses). Returns `None` if the span doesn't match the
/// canonical syntax — e.g. no colon, empty type/value, or a type starting
/// with a digit.
fn parse_tag_body(body: &str) -> Option<TagFilter> {
    let mut chars = body.chars();
    let mut rest = body;
    let operator = match chars.next() {
        Some('+') => {
            rest = &body[1..];
            TagOperator::And
        }
        Some('-') => {
            rest = &body[1..];
            TagOperator::Not
        }
        Some('~') => {
            rest = &body[1..];
            TagOperator::Or
        }
        _ => TagOperator::And,
    };

    let colon_idx = rest.find(':')?;
    let type_part = &rest[..colon_idx];
    let value_part = &rest[colon_idx + 1..];

    let mut type_chars = type_part.chars();
    let first = type_chars.next()?;
    if !is_type_start(first) {
        return None;
    }
    if !type_chars.all(is_type_continue) {
        return None;
    }
    if value_part.is_empty() || value_part.contains(')') {
        return None;
    }

    Some(TagFilter::new(type_part, value_part, operator))
}

/// Collapse runs of whitespace in `text` to a single space, trimming the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scan `input` left to right for canonical `(operator? type:value)` tags.
/// Matching spans are parsed and spliced out; non-matching parenthesised
/// spans are left untouched in the residue.
pub fn extract_canonical_tags(input: &str) -> (Vec<TagFilter>, String) {
    let mut filters = Vec::new();
    let mut residue = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '(' {
            residue.push(c);
            continue;
        }
        let Some(close_rel) = input[idx..].find(')') else {
            // Unmatched opening paren: keep literally, nothing more to scan.
            residue.push('(');
            continue;
        };
        let close_idx = idx + close_rel;
        let body = &input[idx + 1..close_idx];

        match parse_tag_body(body) {
            Some(filter) => {
                filters.push(filter);
            }
            None => {
                residue.push_str(&input[idx..=close_idx]);
            }
        }

        // Advance the outer iterator past the consumed span.
        while let Some(&(next_idx, _)) = chars.peek() {
            if next_idx > close_idx {
                break;
            }
            chars.next();
        }
    }

    (filters, collapse_whitespace(&residue))
}

/// Merge extracted (from-title) and user-supplied filters. User-supplied
/// filters take precedence: for any `tag_type` present in both, the
/// user-supplied entry wins. Order: user-supplied first (original order),
/// then non-conflicting extracted filters.
pub fn merge_tag_filters(extracted: &[TagFilter], user_supplied: &[TagFilter]) -> Vec<TagFilter> {
    let mut merged: Vec<TagFilter> = user_supplied.to_vec();
    for filter in extracted {
        let conflicts = user_supplied
            .iter()
            .any(|u| u.tag_type.eq_ignore_ascii_case(&filter.tag_type));
        if !conflicts {
            merged.push(filter.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_valid_canonical_tag() {
        let (filters, residue) = extract_canonical_tags("Chrono Trigger (region:us)");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].tag_type, "region");
        assert_eq!(filters[0].value, "us");
        assert_eq!(filters[0].operator, TagOperator::And);
        assert_eq!(residue, "Chrono Trigger");
    }

    #[test]
    fn extracts_operator_prefixed_tags() {
        let (filters, _) = extract_canonical_tags("Game (-unfinished:beta)(~lang:en)");
        assert_eq!(filters[0].operator, TagOperator::Not);
        assert_eq!(filters[1].operator, TagOperator::Or);
    }

    #[test]
    fn leaves_invalid_tags_in_residue() {
        let (filters, residue) = extract_canonical_tags("Game (invalidtag) (1invalid:value) (USA)");
        assert!(filters.is_empty());
        assert_eq!(residue, "Game (invalidtag) (1invalid:value) (USA)");
    }

    #[test]
    fn collapses_whitespace_in_residue() {
        let (_, residue) = extract_canonical_tags("Game   (region:us)   Title");
        assert_eq!(residue, "Game Title");
    }

    #[test]
    fn merge_user_supplied_wins_on_conflict() {
        let extracted = vec![TagFilter::new("region", "jp", TagOperator::And)];
        let user = vec![TagFilter::new("region", "us", TagOperator::And)];
        let merged = merge_tag_filters(&extracted, &user);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, "us");
    }

    #[test]
    fn merge_preserves_order_user_first_then_nonconflicting() {
        let extracted = vec![
            TagFilter::new("region", "jp", TagOperator::And),
            TagFilter::new("lang", "en", TagOperator::And),
        ];
        let user = vec![TagFilter::new("region", "us", TagOperator::And)];
        let merged = merge_tag_filters(&extracted, &user);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].tag_type, "region");
        assert_eq!(merged[0].value, "us");
        assert_eq!(merged[1].tag_type, "lang");
    }

    #[test]
    fn merge_empty_both_is_empty() {
        assert!(merge_tag_filters(&[], &[]).is_empty());
    }
}
