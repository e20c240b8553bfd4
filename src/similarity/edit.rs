//! Edit-distance and q-gram string measures.

use std::collections::HashMap;

/// Levenshtein distance over Unicode scalar values.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 − distance / max(len)`, in [0, 1]. Two empty strings score 0.
pub fn levenshtein(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

fn qgrams(s: &str, q: usize) -> HashMap<Vec<char>, usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut grams = HashMap::new();
    if chars.len() < q {
        if !chars.is_empty() {
            *grams.entry(chars).or_insert(0) += 1;
        }
        return grams;
    }
    for window in chars.windows(q) {
        *grams.entry(window.to_vec()).or_insert(0) += 1;
    }
    grams
}

/// Dice coefficient over character trigram multisets.
///
/// Strings shorter than three characters are compared as a single gram.
pub fn qgram(a: &str, b: &str) -> f64 {
    const Q: usize = 3;
    let ga = qgrams(a, Q);
    let gb = qgrams(b, Q);
    let total: usize = ga.values().sum::<usize>() + gb.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    let shared: usize = ga
        .iter()
        .map(|(gram, &n)| n.min(gb.get(gram).copied().unwrap_or(0)))
        .sum();
    2.0 * shared as f64 / total as f64
}
