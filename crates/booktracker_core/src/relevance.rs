//! crates/booktracker_core/src/relevance.rs
//!
//! Fuzzy token-set similarity and the weighted relevance score used to rank
//! catalog search results.
//!
//! Strings are normalized before comparison: non-ASCII characters are dropped,
//! every remaining character that is not alphanumeric or `_` becomes a space,
//! and the result is lower-cased and trimmed. Comparison is therefore
//! insensitive to case and punctuation.

use crate::domain::CatalogEntry;
use std::collections::BTreeSet;

pub const TITLE_WEIGHT: f64 = 0.6;
pub const AUTHOR_WEIGHT: f64 = 0.3;
pub const DESCRIPTION_WEIGHT: f64 = 0.1;
/// Extra dampening applied to the description similarity before weighting.
pub const DESCRIPTION_DAMPENING: f64 = 0.3;

/// Relevance of `entry` to `query`, in the range 0 to 100.
pub fn relevance_score(query: &str, entry: &CatalogEntry) -> f64 {
    let title_score = f64::from(token_set_ratio(query, &entry.title));
    let author_score = f64::from(token_set_ratio(query, &entry.authors.join(", ")));
    let description_score = if entry.description.is_empty() {
        0.0
    } else {
        f64::from(token_set_ratio(query, &entry.description)) * DESCRIPTION_DAMPENING
    };

    TITLE_WEIGHT * title_score
        + AUTHOR_WEIGHT * author_score
        + DESCRIPTION_WEIGHT * description_score
}

/// Token-set similarity of two strings, 0 to 100.
///
/// Both strings are split into sets of normalized tokens. The shared tokens and
/// each side's leftovers are sorted and rejoined, and the best pairwise ratio of
/// `shared`, `shared + left-only` and `shared + right-only` wins. A string that
/// normalizes to nothing scores 0 against anything.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join_tokens(tokens_a.intersection(&tokens_b));
    let only_a = join_tokens(tokens_a.difference(&tokens_b));
    let only_b = join_tokens(tokens_b.difference(&tokens_a));

    let combined_a = format!("{} {}", shared, only_a).trim().to_string();
    let combined_b = format!("{} {}", shared, only_b).trim().to_string();

    [
        ratio(&shared, &combined_a),
        ratio(&shared, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

/// Similarity of two strings as `2 * LCS / (len_a + len_b)`, scaled to 0 to 100
/// and rounded half to even.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let numerator = 200 * longest_common_subsequence(&a, &b);
    let denominator = a.len() + b.len();
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = match (2 * remainder).cmp(&denominator) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + quotient % 2,
        std::cmp::Ordering::Less => quotient,
    };
    rounded.min(100) as u8
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn join_tokens<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
