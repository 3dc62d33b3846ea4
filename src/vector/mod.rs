//! Primitive vector operations shared by every component.
//!
//! All vectors are plain `f64` slices. Callers are expected to keep vectors of
//! one simulation at a single dimension; the `checked_*` variants validate that
//! explicitly for data arriving from outside the engine.

use rand::Rng;

use crate::error::{Result, SimError};

/// Euclidean norm of `v`.
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Return `v / ||v||`.
///
/// A zero vector is returned unchanged.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Normalize `v` in place. A zero vector is left untouched.
pub fn normalize_in_place(v: &mut [f64]) {
    let mag = magnitude(v);
    if mag == 0.0 {
        return;
    }
    for x in v.iter_mut() {
        *x /= mag;
    }
}

/// Cosine similarity of `a` and `b`, in `[-1, 1]`.
///
/// Returns `0.0` when either operand has zero magnitude. Both slices must have
/// the same length; use [`checked_cosine_similarity`] for untrusted input.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "cosine_similarity on mismatched dimensions");

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Rounding can push |cos| a hair past 1 for parallel vectors
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Cosine similarity that rejects empty or mismatched vectors.
pub fn checked_cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(SimError::InvalidInput(
            "cosine similarity of an empty vector".to_string(),
        ));
    }
    if a.len() != b.len() {
        return Err(SimError::dimension(a.len(), b.len()));
    }
    Ok(cosine_similarity(a, b))
}

/// Vector of `dimension` components drawn uniformly from `[-1, 1]`.
pub fn random_vector(dimension: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..dimension).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}

/// Add independent uniform noise in `[-amplitude, amplitude]` to every component.
pub fn jitter(v: &[f64], amplitude: f64, rng: &mut impl Rng) -> Vec<f64> {
    v.iter()
        .map(|x| x + rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Ensure `v` is non-empty and exactly `dimension` long.
pub fn ensure_dimension(v: &[f64], dimension: usize) -> Result<()> {
    if v.is_empty() {
        return Err(SimError::InvalidInput("empty vector".to_string()));
    }
    if v.len() != dimension {
        return Err(SimError::dimension(dimension, v.len()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(SimError::InvalidInput(
            "vector contains a non-finite component".to_string(),
        ));
    }
    Ok(())
}
