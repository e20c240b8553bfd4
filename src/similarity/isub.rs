//! ISub string similarity.
//!
//! Repeatedly removes the longest common substring of the two strings while
//! it is longer than two characters, then combines the matched fraction
//! (commonality) with a penalty for the unmatched remainders and a
//! Winkler-style prefix bonus:
//!
//! ```text
//! commonality   = 2·common / (len1 + len2)
//! bonus         = min(4, prefix) · 0.1 · (1 − commonality)
//! dissimilarity = u1·u2 / (0.6 + 0.4·(u1 + u2 − u1·u2))
//! isub          = max(0, commonality − dissimilarity + bonus)
//! ```
//!
//! where `u1`, `u2` are the unmatched fractions of each string. Many
//! thresholds downstream are tuned against these exact numbers, including
//! the leftmost-longest order in which substrings are removed.

/// Weight of the unmatched-fraction product in the dissimilarity denominator.
const P: f64 = 0.6;

/// Lower-case and drop `.`, `_` and spaces.
fn normalize(s: &str) -> Vec<char> {
    s.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '_' | ' '))
        .collect()
}

/// Leftmost-longest common substring as `(start1, end1, start2, end2)`.
///
/// Returns a zero-length span when the strings share no character.
fn longest_common_substring(s1: &[char], s2: &[char]) -> (usize, usize, usize, usize) {
    let (l1, l2) = (s1.len(), s2.len());
    let mut best = 0;
    let mut span = (0, 0, 0, 0);

    let mut i = 0;
    while i < l1 && l1 - i > best {
        let mut j = 0;
        while l2 - j > best {
            let mut k = i;
            while j < l2 && s1[k] != s2[j] {
                j += 1;
            }
            if j != l2 {
                let p = j;
                j += 1;
                k += 1;
                while j < l2 && k < l1 && s1[k] == s2[j] {
                    j += 1;
                    k += 1;
                }
                if k - i > best {
                    best = k - i;
                    span = (i, k, p, j);
                }
            }
        }
        i += 1;
    }
    span
}

/// Length of the common prefix of the raw inputs.
fn common_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// ISub similarity in [0, 1].
///
/// An empty input scores 0. Two non-empty inputs that both normalize to
/// nothing (only separators) score 1, as do identical normalized inputs.
pub fn isub(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut s1 = normalize(a);
    let mut s2 = normalize(b);
    if s1 == s2 {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let (l1, l2) = (s1.len(), s2.len());
    let mut common = 0;
    let mut best = 2;

    while !s1.is_empty() && !s2.is_empty() && best != 0 {
        let (start1, end1, start2, end2) = longest_common_substring(&s1, &s2);
        best = end1 - start1;
        s1.drain(start1..end1);
        s2.drain(start2..end2);
        if best > 2 {
            common += best;
        } else {
            best = 0;
        }
    }

    let commonality = 2.0 * common as f64 / (l1 + l2) as f64;
    let bonus = common_prefix(a, b).min(4) as f64 * 0.1 * (1.0 - commonality);

    let u1 = l1.saturating_sub(common) as f64 / l1 as f64;
    let u2 = l2.saturating_sub(common) as f64 / l2 as f64;
    let product = u1 * u2;
    let sum = u1 + u2;
    let dissimilarity = if sum - product == 0.0 {
        0.0
    } else {
        product / (P + (1.0 - P) * (sum - product))
    };

    (commonality - dissimilarity + bonus).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identical_and_empty() {
        assert_eq!(isub("lung", "lung"), 1.0);
        assert_eq!(isub("ab", "ab"), 1.0);
        assert_eq!(isub("Bone_Marrow", "bone marrow"), 1.0);
        assert_eq!(isub("", "lung"), 0.0);
        assert_eq!(isub("lung", ""), 0.0);
        assert_eq!(isub("._ ", "x"), 0.0);
        assert_eq!(isub("", ""), 0.0);
    }

    #[test]
    fn separator_only_inputs() {
        assert_eq!(isub("._", "._"), 1.0);
        assert_eq!(isub("_", " . "), 1.0);
        assert_eq!(isub("._", ""), 0.0);
        assert_eq!(isub("x", "__"), 0.0);
    }

    #[test]
    fn reference_values() {
        close(isub("heart", "hearts"), 0.945_455);
        close(isub("Heart", "Heart Muscle"), 0.775);
        close(isub("cardiac", "cardiac organ"), 0.842_105);
        close(isub("organism", "organization"), 0.612_941);
        close(isub("lung", "lungs"), 0.933_333);
        close(isub("left lung", "lung"), 0.7);
        close(isub("heart valve", "heart"), 0.8);
    }

    #[test]
    fn unrelated_strings_score_zero() {
        assert_eq!(isub("heart", "cardiac organ"), 0.0);
        assert_eq!(isub("abc", "xyz"), 0.0);
        assert_eq!(isub("femur", "fibula"), 0.0);
        // Common substrings of length <= 2 do not count.
        assert_eq!(isub("ab", "abc"), 0.0);
    }

    #[test]
    fn symmetric_on_samples() {
        let pairs = [
            ("heart", "hearts"),
            ("organism", "organization"),
            ("left lung", "lung"),
        ];
        for (a, b) in pairs {
            close(isub(a, b), isub(b, a));
        }
    }

    #[test]
    fn leftmost_longest_span() {
        let s1: Vec<char> = "abcxabcd".chars().collect();
        let s2: Vec<char> = "zabcd".chars().collect();
        assert_eq!(longest_common_substring(&s1, &s2), (4, 8, 1, 5));
        let s1: Vec<char> = "abcxabc".chars().collect();
        assert_eq!(longest_common_substring(&s1, &s2), (0, 3, 1, 4));
    }
}
