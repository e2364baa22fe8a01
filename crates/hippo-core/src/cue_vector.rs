//! Deterministic text-to-vector projection and cosine similarity for cued recall.

use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

/// Fixed dimensionality of a cue vector.
pub const VECTOR_DIM: usize = 32;

/// Lowercase and trim a word or cue the same way everywhere it is compared.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn hash_prefix(prefix: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    prefix.hash(&mut hasher);
    hasher.finish()
}

/// Project a (already-normalized) string onto a fixed-size vector.
///
/// For every prefix length `1..=len`, the prefix's hash is folded into one of
/// [`VECTOR_DIM`] buckets with a weight that decays geometrically the further
/// the prefix sits from the end of the string. Two strings sharing a long
/// common prefix therefore accumulate large shared mass in the same early
/// buckets, which is what makes cosine similarity between their vectors track
/// prefix overlap.
pub fn vectorize(normalized: &str) -> [f64; VECTOR_DIM] {
    let mut v = [0.0f64; VECTOR_DIM];
    let chars: Vec<char> = normalized.chars().collect();
    let len = chars.len();
    if len == 0 {
        return v;
    }

    for prefix_len in 1..=len {
        let prefix: String = chars[..prefix_len].iter().collect();
        let h = hash_prefix(&prefix);
        let bucket = (h % VECTOR_DIM as u64) as usize;
        // decays with distance from the end of the string: earlier (shorter)
        // prefixes, shared by more strings, get more weight.
        let distance_from_end = (len - prefix_len) as i32;
        let weight = 0.85f64.powi(distance_from_end);
        v[bucket] += weight;
    }

    v
}

/// Cosine similarity between two vectors, `0.0` if either is the zero vector.
pub fn cosine_similarity(a: &[f64; VECTOR_DIM], b: &[f64; VECTOR_DIM]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Convenience: normalize, vectorize and compare two raw strings in one call.
pub fn similarity(a: &str, b: &str) -> f64 {
    let va = vectorize(&normalize(a));
    let vb = vectorize(&normalize(b));
    cosine_similarity(&va, &vb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_produce_identical_vectors() {
        let v1 = vectorize(&normalize("hippocampus"));
        let v2 = vectorize(&normalize("  Hippocampus  "));
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_exact_match_yields_similarity_one() {
        let sim = similarity("memory", "memory");
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_longer_common_prefix_yields_higher_similarity() {
        let short_prefix = similarity("mem", "memory");
        let long_prefix = similarity("memor", "memory");
        assert!(long_prefix > short_prefix);
    }

    #[test]
    fn test_disjoint_strings_yield_low_similarity() {
        let sim = similarity("zebra", "quartz");
        let same = similarity("zebra", "zebra");
        assert!(sim < same);
    }

    #[test]
    fn test_empty_string_has_zero_vector() {
        let v = vectorize(&normalize(""));
        assert_eq!(v, [0.0; VECTOR_DIM]);
        assert_eq!(cosine_similarity(&v, &v), 0.0);
    }

    #[test]
    fn test_substring_prefix_match_is_positive() {
        let sim = similarity("cat", "category");
        assert!(sim > 0.0);
    }
}
