//! Similarity Engine

use crate::embedding::Embedding;
use crate::error::{ScoringError, ScoringResult};

/// Similarity reported when either side has no data for an aspect
pub const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Cosine similarity of two equal-length vectors, in [-1, 1]
///
/// A zero-norm input yields 0.0. Vectors of different lengths come from
/// different model variants and are rejected.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> ScoringResult<f64> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Similarity of two aspect embeddings
///
/// An all-zero side means the aspect is absent there, which must bias the
/// score neither way: the result is [`NEUTRAL_SIMILARITY`]. Not clamped
/// beyond cosine's natural range.
pub fn aspect_similarity(a: &Embedding, b: &Embedding) -> ScoringResult<f64> {
    if a.dimension() != b.dimension() {
        return Err(ScoringError::DimensionMismatch {
            left: a.dimension(),
            right: b.dimension(),
        });
    }

    if a.is_zero() || b.is_zero() {
        return Ok(NEUTRAL_SIMILARITY);
    }

    cosine_similarity(&a.vector, &b.vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunematch_common::ModelVariant;

    #[test]
    fn test_identical_vectors() {
        let sim = cosine_similarity(&[0.6, 0.8, 0.0], &[0.6, 0.8, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_and_opposite_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
        let opposite = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((opposite + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_norm_is_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let result = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]);
        assert!(matches!(
            result,
            Err(ScoringError::DimensionMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_absent_aspect_is_neutral() {
        let present = {
            let mut e = Embedding::zeros(ModelVariant::Fast);
            e.vector[0] = 1.0;
            e
        };
        let absent = Embedding::zeros(ModelVariant::Fast);

        assert_eq!(aspect_similarity(&present, &absent).unwrap(), NEUTRAL_SIMILARITY);
        assert_eq!(aspect_similarity(&absent, &absent).unwrap(), NEUTRAL_SIMILARITY);
    }

    #[test]
    fn test_aspect_similarity_rejects_mixed_variants() {
        let general = Embedding::zeros(ModelVariant::General);
        let creative = Embedding::zeros(ModelVariant::Creative);

        let result = aspect_similarity(&general, &creative);

        assert!(matches!(result, Err(ScoringError::DimensionMismatch { .. })));
    }
}
