//! Similarity between normalized keys.
//!
//! The score is `2 * M / (|a| + |b|)` where `M` is the length of the longest
//! common subsequence of the two keys, counted in chars. It is symmetric,
//! 1.0 for identical keys and 0.0 when nothing is shared.

/// Score two keys in `[0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use avmerge::matcher::similarity;
///
/// assert_eq!(similarity("abc", "abc"), 1.0);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// assert_eq!(similarity("ab", "abcd"), similarity("abcd", "ab"));
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Longest common subsequence length with a single rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Iterate over the longer side so the row is the shorter one.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for &lc in long {
        let mut diagonal = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[short.len()]
}
