//! Weighted score fusion and top-k selection.

use faq_core::SearchMethod;

/// Fusion weights. They are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f32,
    pub semantic: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.3,
            semantic: 0.7,
        }
    }
}

/// Combine aligned lexical and semantic score vectors.
///
/// Without semantic scores the lexical scores pass through unchanged and
/// the method is [`SearchMethod::Lexical`].
pub fn weighted_fusion(
    lexical: &[f32],
    semantic: Option<&[f32]>,
    weights: FusionWeights,
) -> (Vec<f32>, SearchMethod) {
    match semantic {
        Some(semantic) => {
            debug_assert_eq!(lexical.len(), semantic.len());
            let combined = lexical
                .iter()
                .zip(semantic.iter())
                .map(|(l, s)| weights.lexical * l + weights.semantic * s)
                .collect();
            (combined, SearchMethod::Hybrid)
        }
        None => (lexical.to_vec(), SearchMethod::Lexical),
    }
}

/// Indices of the best `k` positive scores, best first.
///
/// Ties keep corpus order. Scores at or below zero are dropped even if that
/// leaves fewer than `k` indices; NaN sorts last and is dropped too.
pub fn select_top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let key = |i: usize| {
        let s = scores[i];
        if s.is_nan() {
            f32::NEG_INFINITY
        } else {
            s
        }
    };

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    indices.truncate(k);
    indices.retain(|&i| scores[i] > 0.0);
    indices
}
