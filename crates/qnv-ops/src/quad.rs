//! Globally adaptive Gauss–Kronrod (G7/K15) quadrature for continuous
//! drive terms.
//!
//! Every panel is evaluated with the 15-point Kronrod rule; the embedded
//! 7-point Gauss rule supplies the panel's error estimate. The panel with
//! the largest estimate is bisected until the summed estimate meets the
//! tolerance. The nodes are not equispaced, so periodic integrands that
//! alias on a uniform grid are still resolved.

use crate::error::{OpsError, OpsResult};

/// Absolute tolerance, matching the usual QUADPACK default.
pub const EPS_ABS: f64 = 1.49e-8;
/// Relative tolerance.
pub const EPS_REL: f64 = 1.49e-8;
/// Maximum number of panel bisections.
pub const MAX_SUBDIVISIONS: usize = 1000;

/// Kronrod abscissae on `(0, 1)`; odd indices are the Gauss nodes.
const XGK: [f64; 7] = [
    0.9914553711208126,
    0.9491079123427585,
    0.8648644233597691,
    0.7415311855993945,
    0.5860872354676911,
    0.4058451513773972,
    0.20778495500789848,
];
const WGK: [f64; 7] = [
    0.022935322010529224,
    0.06309209262997856,
    0.10479001032225019,
    0.14065325971552592,
    0.1690047266392679,
    0.19035057806478542,
    0.20443294007529889,
];
const WGK_CENTER: f64 = 0.20948214108472782;
const WG: [f64; 3] = [0.1294849661688697, 0.27970539148927664, 0.3818300505051189];
const WG_CENTER: f64 = 0.4179591836734694;

/// Integrate `f` over `[a, b]`.
///
/// Reversed bounds give the negated integral; an empty interval gives 0.
/// Non-finite samples or failure to reach the tolerance within
/// [`MAX_SUBDIVISIONS`] bisections are errors.
pub fn integrate<F>(f: F, a: f64, b: f64) -> OpsResult<f64>
where
    F: Fn(f64) -> f64,
{
    if !a.is_finite() || !b.is_finite() {
        return Err(OpsError::Quadrature {
            a,
            b,
            reason: "bounds must be finite".into(),
        });
    }
    if a == b {
        return Ok(0.0);
    }
    if b < a {
        return integrate(f, b, a).map(|v| -v);
    }

    let bounds = (a, b);
    let mut panels = vec![Panel::evaluate(&f, a, b, bounds)?];
    let mut subdivisions = 0;
    loop {
        let value: f64 = panels.iter().map(|p| p.value).sum();
        let error: f64 = panels.iter().map(|p| p.error).sum();
        let abs_mass: f64 = panels.iter().map(|p| p.abs_mass).sum();
        // Below a few ulps of the integrand's mass the estimate is roundoff.
        let tol = EPS_ABS
            .max(EPS_REL * value.abs())
            .max(50.0 * f64::EPSILON * abs_mass);
        if error <= tol {
            return Ok(value);
        }
        if subdivisions == MAX_SUBDIVISIONS {
            return Err(OpsError::Quadrature {
                a,
                b,
                reason: format!(
                    "no convergence after {MAX_SUBDIVISIONS} subdivisions (error estimate {error:.3e})"
                ),
            });
        }

        let worst = panels
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.error.total_cmp(&y.1.error))
            .map_or(0, |(i, _)| i);
        let Panel { a: lo, b: hi, .. } = panels.swap_remove(worst);
        let mid = 0.5 * (lo + hi);
        panels.push(Panel::evaluate(&f, lo, mid, bounds)?);
        panels.push(Panel::evaluate(&f, mid, hi, bounds)?);
        subdivisions += 1;
    }
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
    abs_mass: f64,
}

impl Panel {
    fn evaluate<F>(f: &F, a: f64, b: f64, bounds: (f64, f64)) -> OpsResult<Self>
    where
        F: Fn(f64) -> f64,
    {
        let center = 0.5 * (a + b);
        let half = 0.5 * (b - a);

        let fc = sample(f, center, bounds)?;
        let mut kronrod = WGK_CENTER * fc;
        let mut gauss = WG_CENTER * fc;
        let mut abs_mass = WGK_CENTER * fc.abs();
        for (i, (&x, &w)) in XGK.iter().zip(WGK.iter()).enumerate() {
            let lo = sample(f, center - half * x, bounds)?;
            let hi = sample(f, center + half * x, bounds)?;
            kronrod += w * (lo + hi);
            abs_mass += w * (lo.abs() + hi.abs());
            if i % 2 == 1 {
                gauss += WG[i / 2] * (lo + hi);
            }
        }

        Ok(Self {
            a,
            b,
            value: kronrod * half,
            error: ((kronrod - gauss) * half).abs(),
            abs_mass: abs_mass * half,
        })
    }
}

fn sample<F>(f: &F, x: f64, bounds: (f64, f64)) -> OpsResult<f64>
where
    F: Fn(f64) -> f64,
{
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(OpsError::Quadrature {
            a: bounds.0,
            b: bounds.1,
            reason: format!("integrand is not finite at t = {x}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_polynomial_exact() {
        let v = integrate(|x| 3.0 * x * x, 0.0, 2.0).unwrap();
        assert!((v - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_sine_period() {
        let w = 2.0 * PI;
        let v = integrate(|x| (w * x).sin(), 0.0, 0.25).unwrap();
        assert!((v - 1.0 / w).abs() < 1e-9);
    }

    #[test]
    fn test_whole_periods_integrate_to_zero() {
        // Equispaced 3- and 5-point samples all sit on crests here.
        let v = integrate(|t| (4.0 * t).cos(), 0.0, 2.0 * PI).unwrap();
        assert!(v.abs() < 1e-9, "got {v}");

        let w = 8.0 * PI / 0.2;
        let v = integrate(|t| (w * t).cos(), 0.0, 0.2).unwrap();
        assert!(v.abs() < 1e-9, "got {v}");
    }

    #[test]
    fn test_many_oscillations() {
        let v = integrate(|t| (200.0 * t).cos(), 0.0, 10.0).unwrap();
        assert!((v - (2000.0_f64).sin() / 200.0).abs() < 1e-8);
    }

    #[test]
    fn test_endpoint_singularity_in_derivative() {
        let v = integrate(f64::sqrt, 0.0, 1.0).unwrap();
        assert!((v - 2.0 / 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_reversed_and_empty_bounds() {
        let fwd = integrate(f64::exp, 0.0, 1.0).unwrap();
        let rev = integrate(f64::exp, 1.0, 0.0).unwrap();
        assert!((fwd + rev).abs() < 1e-14);
        assert!((fwd - (std::f64::consts::E - 1.0)).abs() < 1e-12);
        assert_eq!(integrate(f64::exp, 0.3, 0.3).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_integrand_is_error() {
        // The Kronrod nodes never hit the endpoints, so use an interior pole.
        let err = integrate(|x| 1.0 / (x - 0.5), 0.0, 1.0);
        assert!(matches!(err, Err(OpsError::Quadrature { .. })));
        let err = integrate(|_| f64::NAN, 0.0, 1.0);
        assert!(matches!(err, Err(OpsError::Quadrature { .. })));
    }
}
