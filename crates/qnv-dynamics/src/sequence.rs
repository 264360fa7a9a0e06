//! Declarative pulse sequences.
//!
//! A [`BuildingBlock`] is an ordered list of elements applied `repetitions`
//! times in a row. Each element is either free evolution under the dipolar
//! Hamiltonian (`dd`) for a duration, or a kick about `x`, `y` or `z` whose
//! parameter is the kick time; the rotation amplitude is
//! `duration · rabi_freq`.

use std::fmt;
use std::str::FromStr;

use qnv_ops::PauliOp;
use serde::{Deserialize, Serialize};

use crate::error::{DynamicsError, DynamicsResult};

/// What an element does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Uniform rotation about an axis.
    Kick(PauliOp),
    /// Free evolution under the dipolar Hamiltonian.
    Dipolar,
}

impl ElementKind {
    /// Whether this element is followed by a measurement.
    pub fn is_dipolar(self) -> bool {
        matches!(self, ElementKind::Dipolar)
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "dd" => Ok(ElementKind::Dipolar),
            "x" => Ok(ElementKind::Kick(PauliOp::X)),
            "y" => Ok(ElementKind::Kick(PauliOp::Y)),
            "z" => Ok(ElementKind::Kick(PauliOp::Z)),
            other => Err(format!(
                "kind '{other}' not understood, expected one of 'x', 'y', 'z', 'dd'"
            )),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Dipolar => f.write_str("dd"),
            ElementKind::Kick(axis) => write!(f, "{axis}"),
        }
    }
}

/// One step of a building block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceElement {
    /// Element kind.
    pub kind: ElementKind,
    /// Duration in units of `1/J`.
    pub duration: f64,
}

impl SequenceElement {
    /// Dipolar evolution for `duration`.
    pub fn dipolar(duration: f64) -> Self {
        Self {
            kind: ElementKind::Dipolar,
            duration,
        }
    }

    /// Kick about `axis` for `duration`.
    pub fn kick(axis: PauliOp, duration: f64) -> Self {
        Self {
            kind: ElementKind::Kick(axis),
            duration,
        }
    }
}

/// A repeatable unit of a drive protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingBlock {
    elements: Vec<SequenceElement>,
    repetitions: usize,
}

impl BuildingBlock {
    /// Build a block from typed elements.
    pub fn new(elements: Vec<SequenceElement>, repetitions: usize) -> DynamicsResult<Self> {
        for (e, element) in elements.iter().enumerate() {
            if !element.duration.is_finite() {
                return Err(DynamicsError::InvalidElement {
                    element: e,
                    reason: format!("duration must be finite, got {}", element.duration),
                });
            }
        }
        Ok(Self {
            elements,
            repetitions,
        })
    }

    /// Build a block from `(kind, duration)` pairs such as `("dd", 0.2)`.
    pub fn from_raw<S: AsRef<str>>(raw: &[(S, f64)], repetitions: usize) -> DynamicsResult<Self> {
        let elements = raw
            .iter()
            .enumerate()
            .map(|(e, (kind, duration))| {
                let kind = kind
                    .as_ref()
                    .parse::<ElementKind>()
                    .map_err(|reason| DynamicsError::InvalidElement { element: e, reason })?;
                Ok(SequenceElement {
                    kind,
                    duration: *duration,
                })
            })
            .collect::<DynamicsResult<Vec<_>>>()?;
        Self::new(elements, repetitions)
    }

    /// Elements in application order.
    pub fn elements(&self) -> &[SequenceElement] {
        &self.elements
    }

    /// How many times the element list is applied back to back.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Dipolar elements in one pass.
    pub fn dipolar_count(&self) -> usize {
        self.elements.iter().filter(|e| e.kind.is_dipolar()).count()
    }

    /// Elements applied per use of the block.
    pub fn sequence_elements(&self) -> usize {
        self.elements.len() * self.repetitions
    }

    /// Measurements taken per use of the block.
    pub fn data_points(&self) -> usize {
        self.dipolar_count() * self.repetitions
    }

    /// Same block with every duration passed through `f`.
    pub fn map_durations(&self, mut f: impl FnMut(f64) -> f64) -> DynamicsResult<Self> {
        let elements = self
            .elements
            .iter()
            .map(|e| SequenceElement {
                kind: e.kind,
                duration: f(e.duration),
            })
            .collect();
        Self::new(elements, self.repetitions)
    }
}

/// Serialized form of a block: `{ elements: [[dd, 0.2], [x, 0.5]], repetitions: 1 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    /// `(kind, duration)` pairs.
    pub elements: Vec<(String, f64)>,
    /// Repetition count.
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
}

fn default_repetitions() -> usize {
    1
}

impl RawBlock {
    /// Validate into a [`BuildingBlock`].
    pub fn to_block(&self) -> DynamicsResult<BuildingBlock> {
        BuildingBlock::from_raw(&self.elements, self.repetitions)
    }
}

/// Validate a list of raw blocks, tagging failures with the block index.
pub fn blocks_from_raw(raw: &[RawBlock]) -> DynamicsResult<Vec<BuildingBlock>> {
    raw.iter()
        .enumerate()
        .map(|(b, block)| block.to_block().map_err(|e| e.in_block(b)))
        .collect()
}
