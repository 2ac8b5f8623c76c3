//! Vector math for embeddings.
//!
//! Every function here is total: degenerate input yields zeros, never NaN.

/// Accumulated in f64 so very large or very small components neither
/// overflow nor underflow.
fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

fn degenerate(norm: f64) -> bool {
    norm == 0.0 || !norm.is_finite()
}

/// Scale to a unit vector. Zero, NaN or infinite norms give a zero vector.
pub fn normalize_l2(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if degenerate(norm) {
        return vec![0.0; v.len()];
    }
    v.iter().map(|&x| (f64::from(x) / norm) as f32).collect()
}

/// L2-normalize, then min-max rescale every component into `[-1, 1]`.
///
/// Stored chunk vectors and query vectors both go through this, so they
/// stay comparable.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if degenerate(norm) {
        return vec![0.0; v.len()];
    }

    let unit: Vec<f32> = v.iter().map(|&x| (f64::from(x) / norm) as f32).collect();
    let min = unit.iter().copied().fold(f32::INFINITY, f32::min);
    let max = unit.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if max == min || min.is_nan() || max.is_nan() {
        return vec![0.0; v.len()];
    }

    unit.iter()
        .map(|&x| {
            if x.is_finite() {
                ((x - min) / (max - min)) * 2.0 - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Cosine similarity. Mismatched lengths or a zero denominator give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    let (norm_a, norm_b) = (l2_norm(a), l2_norm(b));
    if degenerate(norm_a) || degenerate(norm_b) {
        return 0.0;
    }
    let cosine = dot / norm_a / norm_b;
    if cosine.is_finite() { cosine as f32 } else { 0.0 }
}
