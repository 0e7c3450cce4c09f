//! Edit-distance strategies.

use super::{MatchKey, Matcher, Selector, StrategyError};

/// Levenshtein distance over Unicode scalar values, ignoring case.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    edit_distance(a, b, false)
}

/// Damerau-Levenshtein distance (optimal string alignment): adjacent
/// transpositions cost one edit.
#[must_use]
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    edit_distance(a, b, true)
}

fn fold(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn edit_distance(a: &str, b: &str, damerau: bool) -> usize {
    let a = fold(a);
    let b = fold(b);
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Rows are indexed by positions in `b`; `before` is two rows back and
    // only consulted for transpositions.
    let mut before = vec![0_usize; b.len() + 1];
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0_usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        let mut left = i + 1;
        if let Some(first) = current.first_mut() {
            *first = left;
        }
        for (j, &cb) in b.iter().enumerate() {
            let diagonal = previous.get(j).copied().unwrap_or_default();
            let above = previous.get(j + 1).copied().unwrap_or_default();
            let substitution = diagonal + usize::from(ca != cb);
            let mut cost = substitution.min(above + 1).min(left + 1);
            if damerau && i > 0 && j > 0 {
                let swapped = a.get(i - 1) == Some(&cb) && b.get(j - 1) == Some(&ca);
                if swapped {
                    let transposed = before.get(j - 1).copied().unwrap_or_default() + 1;
                    cost = cost.min(transposed);
                }
            }
            if let Some(slot) = current.get_mut(j + 1) {
                *slot = cost;
            }
            left = cost;
        }
        std::mem::swap(&mut before, &mut previous);
        std::mem::swap(&mut previous, &mut current);
    }
    previous.last().copied().unwrap_or_default()
}

/// Selector accepting candidates within the key's Levenshtein distance.
#[derive(Debug, Clone, Copy)]
pub struct LevenshteinSelector {
    damerau: bool,
}

impl LevenshteinSelector {
    /// Plain Levenshtein comparison.
    #[must_use]
    pub const fn plain() -> Self {
        Self { damerau: false }
    }

    /// Damerau-Levenshtein comparison.
    #[must_use]
    pub const fn damerau() -> Self {
        Self { damerau: true }
    }
}

struct LevenshteinMatcher {
    query: String,
    limit: usize,
    damerau: bool,
}

impl Matcher for LevenshteinMatcher {
    fn is_match(&mut self, candidate: &str) -> bool {
        edit_distance(&self.query, candidate, self.damerau) <= self.limit
    }
}

impl Selector for LevenshteinSelector {
    fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError> {
        Ok(Box::new(LevenshteinMatcher {
            query: key.word.to_owned(),
            limit: key.lev_distance,
            damerau: self.damerau,
        }))
    }
}
