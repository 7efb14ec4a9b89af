/// Guards the denominator for degenerate (zero) vectors.
const EPSILON: f32 = 1e-8;

/// Cosine similarity in [-1, 1].
///
/// Symmetric; self-similarity of a nonzero vector is ~1.0. Mismatched
/// lengths score over the shorter prefix, which only occurs if a caller
/// bypasses load-time dimensionality validation.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt() + EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn self_similarity_is_one() {
        let v = [0.3_f32, -1.2, 4.5, 0.0, 2.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn symmetric() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [-2.0_f32, 0.5, 1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn zero_vector_does_not_divide_by_zero() {
        let zero = [0.0_f32; 4];
        let v = [1.0_f32, 0.0, 0.0, 0.0];
        let sim = cosine_similarity(&zero, &v);
        assert!(sim.is_finite());
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = [1.0_f32, 0.0];
        let b = [0.0_f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }
}
