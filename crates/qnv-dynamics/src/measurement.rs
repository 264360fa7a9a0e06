//! Measurement storage.

use ndarray::Array2;

use crate::error::{DynamicsError, DynamicsResult};

/// Time series of observable expectation values.
///
/// Schedules whose measurement count follows from the block structure use
/// [`Preallocated`](MeasurementBuffer::Preallocated); the others grow as
/// blocks are drawn.
#[derive(Debug, Clone)]
pub enum MeasurementBuffer {
    /// Fixed number of points, zero-filled until measured.
    Preallocated {
        /// `[n_obs, n_points]`.
        values: Array2<f64>,
        /// `[n_points]`.
        times: Vec<f64>,
        /// Points recorded so far.
        filled: usize,
    },
    /// Grows by one point per measurement.
    Growable {
        /// Number of observables.
        n_obs: usize,
        /// Row-major `[n_points, n_obs]`.
        values: Vec<f64>,
        /// `[n_points]`.
        times: Vec<f64>,
    },
}

impl MeasurementBuffer {
    /// Buffer with room for exactly `n_points` measurements.
    pub fn preallocated(n_obs: usize, n_points: usize) -> Self {
        MeasurementBuffer::Preallocated {
            values: Array2::zeros((n_obs, n_points)),
            times: vec![0.0; n_points],
            filled: 0,
        }
    }

    /// Growable buffer with a capacity hint.
    pub fn growable(n_obs: usize, capacity: usize) -> Self {
        MeasurementBuffer::Growable {
            n_obs,
            values: Vec::with_capacity(capacity * n_obs),
            times: Vec::with_capacity(capacity),
        }
    }

    /// Append one measurement.
    pub fn record(&mut self, time: f64, values: &[f64]) -> DynamicsResult<()> {
        match self {
            MeasurementBuffer::Preallocated {
                values: data,
                times,
                filled,
            } => {
                if *filled >= times.len() {
                    return Err(DynamicsError::BufferOverflow {
                        capacity: times.len(),
                    });
                }
                for (o, v) in values.iter().enumerate() {
                    data[[o, *filled]] = *v;
                }
                times[*filled] = time;
                *filled += 1;
            }
            MeasurementBuffer::Growable {
                values: data,
                times,
                ..
            } => {
                data.extend_from_slice(values);
                times.push(time);
            }
        }
        Ok(())
    }

    /// Points recorded so far.
    pub fn len(&self) -> usize {
        match self {
            MeasurementBuffer::Preallocated { filled, .. } => *filled,
            MeasurementBuffer::Growable { times, .. } => times.len(),
        }
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the fixed-size variant.
    pub fn is_preallocated(&self) -> bool {
        matches!(self, MeasurementBuffer::Preallocated { .. })
    }

    /// Copy of the full buffer as `([n_obs, n_points], times)`. Preallocated
    /// buffers include their not-yet-measured zero points.
    pub fn snapshot(&self) -> (Array2<f64>, Vec<f64>) {
        match self {
            MeasurementBuffer::Preallocated { values, times, .. } => {
                (values.clone(), times.clone())
            }
            MeasurementBuffer::Growable {
                n_obs,
                values,
                times,
            } => (transpose(*n_obs, values, times.len()), times.clone()),
        }
    }

    /// Finish the run.
    pub fn into_parts(self) -> (Array2<f64>, Vec<f64>) {
        match self {
            MeasurementBuffer::Preallocated { values, times, .. } => (values, times),
            MeasurementBuffer::Growable {
                n_obs,
                values,
                times,
            } => (transpose(n_obs, &values, times.len()), times),
        }
    }
}

fn transpose(n_obs: usize, row_major: &[f64], n_points: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_obs, n_points), |(o, p)| row_major[p * n_obs + o])
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// `[n_obs, n_points]` expectation values per site.
    pub observables: Array2<f64>,
    /// Elapsed time of every point.
    pub times: Vec<f64>,
    /// Observable labels, row order.
    pub labels: Vec<String>,
    /// Group the checkpoints went to, if a store was attached.
    pub group: Option<String>,
}

impl Trajectory {
    /// Number of time points.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Series of the observable with `label`.
    pub fn series(&self, label: &str) -> Option<Vec<f64>> {
        let row = self.labels.iter().position(|l| l == label)?;
        Some(self.observables.row(row).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preallocated_overflow() {
        let mut b = MeasurementBuffer::preallocated(2, 2);
        b.record(0.0, &[1.0, 2.0]).unwrap();
        b.record(0.5, &[3.0, 4.0]).unwrap();
        assert!(matches!(
            b.record(1.0, &[5.0, 6.0]),
            Err(DynamicsError::BufferOverflow { capacity: 2 })
        ));
        let (values, times) = b.into_parts();
        assert_eq!(values, ndarray::array![[1.0, 3.0], [2.0, 4.0]]);
        assert_eq!(times, vec![0.0, 0.5]);
    }

    #[test]
    fn test_growable_layout_matches_preallocated() {
        let mut g = MeasurementBuffer::growable(2, 0);
        let mut p = MeasurementBuffer::preallocated(2, 3);
        for (t, v) in [(0.0, [1.0, -1.0]), (0.1, [0.5, -0.5]), (0.2, [0.25, 0.0])] {
            g.record(t, &v).unwrap();
            p.record(t, &v).unwrap();
        }
        assert_eq!(g.snapshot(), p.snapshot());
        assert_eq!(g.len(), 3);
        assert!(!g.is_preallocated());
    }

    #[test]
    fn test_snapshot_keeps_unfilled_zeros() {
        let mut p = MeasurementBuffer::preallocated(1, 3);
        p.record(0.0, &[1.0]).unwrap();
        let (values, times) = p.snapshot();
        assert_eq!(values.shape(), &[1, 3]);
        assert_eq!(values[[0, 2]], 0.0);
        assert_eq!(times.len(), 3);
        assert_eq!(p.len(), 1);
    }
}
