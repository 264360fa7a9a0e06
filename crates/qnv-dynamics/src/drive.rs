//! Drive parameters shared by every element of a protocol.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use qnv_ops::{OpsResult, quad};
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};

/// Static single-site z offset, in units of `J`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detuning {
    /// Same offset on every spin.
    Uniform(f64),
    /// One offset per spin.
    PerSite(Vec<f64>),
}

impl Detuning {
    /// Check the per-site length against the number of spins.
    pub fn validate(&self, n_sites: usize) -> DynamicsResult<()> {
        let values: &[f64] = match self {
            Detuning::Uniform(v) => std::slice::from_ref(v),
            Detuning::PerSite(vs) => {
                if vs.len() != n_sites {
                    return Err(DynamicsError::DetuningLength {
                        expected: n_sites,
                        got: vs.len(),
                    });
                }
                vs
            }
        };
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(DynamicsError::InvalidParameter {
                name: "detuning",
                reason: format!("values must be finite, got {bad}"),
            });
        }
        Ok(())
    }

    /// Per-site coefficients multiplied by `duration`.
    pub fn coefficients(&self, n_sites: usize, duration: f64) -> Vec<f64> {
        match self {
            Detuning::Uniform(v) => vec![v * duration; n_sites],
            Detuning::PerSite(vs) => vs.iter().map(|v| v * duration).collect(),
        }
    }
}

/// A continuous drive `f(t)` applied uniformly along z and integrated over
/// each dipolar window.
#[derive(Clone)]
pub struct AcDrive {
    label: String,
    f: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl AcDrive {
    /// Wrap an arbitrary function of time.
    pub fn new(label: impl Into<String>, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    /// `amplitude · sin(ω t)`.
    pub fn sine(amplitude: f64, angular_frequency: f64) -> Self {
        Self::new(
            format!("{amplitude}*sin({angular_frequency}*t)"),
            move |t| amplitude * (angular_frequency * t).sin(),
        )
    }

    /// `amplitude · cos(ω t)`.
    pub fn cosine(amplitude: f64, angular_frequency: f64) -> Self {
        Self::new(
            format!("{amplitude}*cos({angular_frequency}*t)"),
            move |t| amplitude * (angular_frequency * t).cos(),
        )
    }

    /// Human-readable description.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value at `t`.
    pub fn eval(&self, t: f64) -> f64 {
        (self.f)(t)
    }

    /// `∫_a^b f(t) dt`.
    pub fn integrate(&self, a: f64, b: f64) -> OpsResult<f64> {
        quad::integrate(|t| (self.f)(t), a, b)
    }
}

impl fmt::Debug for AcDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcDrive").field("label", &self.label).finish()
    }
}

/// Per-step rewrite of a block's durations: `new = f(nominal, step)`.
#[derive(Clone)]
pub struct Modulation {
    label: String,
    f: Arc<dyn Fn(f64, usize) -> f64 + Send + Sync>,
}

impl Modulation {
    /// Wrap an arbitrary modulation.
    pub fn new(
        label: impl Into<String>,
        f: impl Fn(f64, usize) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    /// `nominal · (1 + rate · step)`.
    pub fn linear_ramp(rate: f64) -> Self {
        Self::new(format!("linear_ramp({rate})"), move |d, step| {
            d * (1.0 + rate * step as f64)
        })
    }

    /// `nominal · (1 + amplitude · sin(2π · step / period))`.
    pub fn sinusoidal(amplitude: f64, period: f64) -> Self {
        Self::new(
            format!("sinusoidal({amplitude}, {period})"),
            move |d, step| d * (1.0 + amplitude * (TAU * step as f64 / period).sin()),
        )
    }

    /// Human-readable description.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Duration to use at `step`.
    pub fn apply(&self, nominal: f64, step: usize) -> f64 {
        (self.f)(nominal, step)
    }
}

impl fmt::Debug for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modulation").field("label", &self.label).finish()
    }
}

/// Drive settings common to every element.
#[derive(Debug, Clone, Default)]
pub struct DriveParams {
    /// Rabi frequency in units of `J`; kick amplitude is `duration · rabi_freq`.
    pub rabi_freq: f64,
    /// Optional static detuning.
    pub detuning: Option<Detuning>,
    /// Optional continuous drive.
    pub ac: Option<AcDrive>,
    /// Optional relative jitter of dipolar durations, e.g. `0.05` for ±5 %.
    pub noise: Option<f64>,
}

impl DriveParams {
    /// Drive with only a Rabi frequency.
    pub fn new(rabi_freq: f64) -> Self {
        Self {
            rabi_freq,
            ..Self::default()
        }
    }

    /// Add a detuning.
    pub fn with_detuning(mut self, detuning: Detuning) -> Self {
        self.detuning = Some(detuning);
        self
    }

    /// Add a continuous drive.
    pub fn with_ac(mut self, ac: AcDrive) -> Self {
        self.ac = Some(ac);
        self
    }

    /// Add duration noise.
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Check every parameter against a system of `n_sites` spins.
    pub fn validate(&self, n_sites: usize) -> DynamicsResult<()> {
        if !self.rabi_freq.is_finite() {
            return Err(DynamicsError::InvalidParameter {
                name: "rabi_freq",
                reason: format!("must be finite, got {}", self.rabi_freq),
            });
        }
        if let Some(detuning) = &self.detuning {
            detuning.validate(n_sites)?;
        }
        if let Some(noise) = self.noise {
            if !(noise.is_finite() && noise >= 0.0) {
                return Err(DynamicsError::InvalidParameter {
                    name: "noise",
                    reason: format!("must be a non-negative fraction, got {noise}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detuning_length() {
        let d = Detuning::PerSite(vec![0.1, 0.2]);
        assert!(d.validate(2).is_ok());
        assert!(matches!(
            d.validate(3),
            Err(DynamicsError::DetuningLength { expected: 3, got: 2 })
        ));
        assert_eq!(Detuning::Uniform(0.5).coefficients(3, 2.0), vec![1.0; 3]);
    }

    #[test]
    fn test_detuning_untagged_yaml() {
        let u: Detuning = serde_yaml_ng::from_str("0.25").unwrap();
        assert_eq!(u, Detuning::Uniform(0.25));
        let p: Detuning = serde_yaml_ng::from_str("[0.1, 0.2]").unwrap();
        assert_eq!(p, Detuning::PerSite(vec![0.1, 0.2]));
    }

    #[test]
    fn test_ac_integral() {
        let ac = AcDrive::cosine(2.0, 1.0);
        // ∫_0^{π/2} 2 cos t dt = 2
        let v = ac.integrate(0.0, std::f64::consts::FRAC_PI_2).unwrap();
        assert!((v - 2.0).abs() < 1e-7);
    }

    #[test]
    fn test_ac_integral_over_whole_periods() {
        // Four full periods inside a 0.2 window.
        let ac = AcDrive::cosine(1.0, 8.0 * std::f64::consts::PI / 0.2);
        let v = ac.integrate(0.0, 0.2).unwrap();
        assert!(v.abs() < 1e-9, "got {v}");

        // Shifted by a quarter period the window integral is still zero.
        let v = ac.integrate(0.0125, 0.2125).unwrap();
        assert!(v.abs() < 1e-9, "got {v}");

        let ac = AcDrive::sine(3.0, 8.0 * std::f64::consts::PI / 0.2);
        let v = ac.integrate(0.0, 0.0125).unwrap();
        assert!((v - 3.0 * 0.2 / (8.0 * std::f64::consts::PI)).abs() < 1e-9, "got {v}");
    }

    #[test]
    fn test_modulations() {
        assert_eq!(Modulation::linear_ramp(0.5).apply(0.2, 2), 0.4);
        let m = Modulation::sinusoidal(0.5, 4.0);
        assert!((m.apply(1.0, 1) - 1.5).abs() < 1e-12);
        assert!((m.apply(1.0, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_noise_rejected() {
        let d = DriveParams::new(1.0).with_noise(-0.1);
        assert!(matches!(
            d.validate(2),
            Err(DynamicsError::InvalidParameter { name: "noise", .. })
        ));
    }
}
