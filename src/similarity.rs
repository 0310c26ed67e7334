//! Text normalization and fuzzy similarity scoring shared by the matcher.

/// Normalizes free text for comparison.
///
/// Lowercases, replaces every character outside `[a-z0-9]` and whitespace
/// with a space, then collapses whitespace runs and trims. Punctuation-heavy
/// strings like "Acme, Corp." and "ACME CORP" normalize to the same value.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity ratio between two strings in `[0.0, 1.0]`.
///
/// Both inputs are normalized first, then scored as
/// `2 * lcs_len / (len_a + len_b)` over their characters. Symmetric and
/// deterministic; two strings that both normalize to empty count as
/// identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    let lcs = lcs_length(&a_chars, &b_chars);

    (2.0 * lcs as f64) / total as f64
}

/// Longest common subsequence length, space-optimized to two rows.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                curr[j - 1].max(prev[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Acme, Corp."), "acme corp");
        assert_eq!(normalize("  Chief  Financial   Officer "), "chief financial officer");
        assert_eq!(normalize("O'Brien & Sons Ltd"), "o brien sons ltd");
    }

    #[test]
    fn normalize_handles_empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ???"), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Jane Smith", "Acme, Corp.", "  mixed   CASE  42!  "] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn similarity_identical_strings_is_one() {
        assert_eq!(similarity("Jane Smith", "Jane Smith"), 1.0);
        assert_eq!(similarity("jane smith", "JANE SMITH"), 1.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let forward = similarity("Acme Corp", "ACME Corporation");
        let backward = similarity("ACME Corporation", "Acme Corp");
        assert_eq!(forward, backward);
    }

    #[test]
    fn similarity_known_ratio() {
        // "acme corp" (9 chars) vs "acme corporation" (16 chars), lcs = 9
        let score = similarity("Acme Corp", "ACME Corporation");
        assert!((score - 0.72).abs() < 1e-9);
    }

    #[test]
    fn similarity_empty_cases() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("!!!", "???"), 1.0);
        assert_eq!(similarity("", "something"), 0.0);
        assert_eq!(similarity("something", ""), 0.0);
    }

    #[test]
    fn similarity_unrelated_strings_is_low() {
        let score = similarity("Jane Smith", "Zzyzx Quorblatt");
        assert!(score < 0.4);
    }
}
