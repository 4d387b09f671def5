//! Vector normalization and distance functions.

use ragify_core::{Error, Result};

/// Euclidean (L2) norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` in place to unit L2 norm.
///
/// Fails for zero vectors and vectors with non-finite components, which
/// have no direction to preserve.
pub fn normalize(v: &mut [f32]) -> Result<()> {
    let norm = l2_norm(v);
    if !norm.is_finite() {
        return Err(Error::invalid_data("vector has non-finite components"));
    }
    if norm == 0.0 {
        return Err(Error::invalid_data("cannot normalize a zero vector"));
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Return a unit-norm copy of `v`.
pub fn normalized(v: &[f32]) -> Result<Vec<f32>> {
    let mut out = v.to_vec();
    normalize(&mut out)?;
    Ok(out)
}

/// Squared Euclidean distance.
///
/// On unit vectors this equals `2 - 2 * cosine`, so ranking by it is
/// ranking by cosine similarity.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
