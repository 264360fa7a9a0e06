//! Single-site fields from the central defect.
//!
//! The defect sits at the origin. Each spin at `r_s` feels
//! `(3·cos²θ_s − 1) / |r_s|³`, normalised so that the largest value equals
//! `energy_scale · scaling_factor`.

use crate::geometry::{FieldDirection, Position, dot, norm};

/// Per-site z-field strengths for the given positions.
pub fn single_site_fields(
    positions: &[Position],
    direction: FieldDirection,
    energy_scale: f64,
    scaling_factor: f64,
) -> Vec<f64> {
    let field = direction.unit();
    let mut strengths: Vec<f64> = positions
        .iter()
        .map(|&p| {
            let r = norm(p);
            let cos_theta = dot(p, field) / r;
            (3.0 * cos_theta * cos_theta - 1.0) / r.powi(3)
        })
        .collect();

    let max = strengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let norm_factor = if max != 0.0 && max.is_finite() { max } else { 1.0 };
    for s in &mut strengths {
        *s = *s / norm_factor * energy_scale * scaling_factor;
    }
    strengths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_field_equals_scale() {
        let positions = [[0.0, 0.0, 1.0], [2.0, 0.0, 0.0], [0.0, 0.0, -3.0]];
        let fields = single_site_fields(&positions, FieldDirection::Z, 4.0, 0.1);
        // On-axis at r = 1: (3 - 1)/1 = 2 is the maximum.
        assert!((fields[0] - 0.4).abs() < 1e-12);
        // Equatorial at r = 2: -1/8, relative -1/16.
        assert!((fields[1] - (-0.4 / 16.0)).abs() < 1e-12);
        // On-axis at r = 3: 2/27, relative 1/27.
        assert!((fields[2] - 0.4 / 27.0).abs() < 1e-12);
    }
}
