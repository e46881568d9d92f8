//! Sørensen–Dice similarity over character bigrams.

use std::collections::HashMap;

/// Similarity of `a` and `b` in `[0, 1]`.
///
/// Whitespace is ignored. Identical strings score 1; strings shorter than
/// two characters (after stripping) score 0 otherwise. Bigrams are counted
/// as a multiset, so repeated pairs only match as often as they occur in
/// both strings.
pub fn compare(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a.len() + b.len() - 2) as f64
}

/// Best-scoring candidate as `(index, score)`. Ties keep the earliest
/// candidate. `None` when there are no candidates.
pub fn best_match<'a, I>(needle: &str, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = compare(needle, candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best
}
