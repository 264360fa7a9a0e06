//! Evolution of a state vector under a compiled drive protocol.

use std::borrow::Cow;

use chrono::Utc;
use num_complex::Complex64;
use qnv_store::{AttrValue, Attributes, CheckpointStore, Dataset, WriteMode};
use qnv_system::{NvSystem, Observable};
use tracing::{debug, info};

use crate::compiler::{CompiledBlock, PropagatorSlot, SequenceCompiler};
use crate::drive::{Detuning, DriveParams};
use crate::error::{DynamicsError, DynamicsResult};
use crate::measurement::{MeasurementBuffer, Trajectory};
use crate::rng::noise_draws;
use crate::schedule::DriveProgram;
use crate::sequence::BuildingBlock;

/// Dataset holding `[n_obs, n_points]` expectation values.
pub const OBSERVABLES_DATASET: &str = "observables";
/// Dataset holding the elapsed time of every point.
pub const TIMES_DATASET: &str = "times";

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Checkpoint group requested in the store.
    pub group: String,
    /// Checkpoint after this many outer iterations.
    pub save_every: usize,
    /// Seed of the noise draws.
    pub seed: u64,
    /// Extra attributes stored with every checkpoint.
    pub extra: Attributes,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            group: "new_data_set".to_string(),
            save_every: 1000,
            seed: 1,
            extra: Attributes::new(),
        }
    }
}

/// Progress after one outer iteration.
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    /// Iterations completed.
    pub completed: usize,
    /// Total iterations.
    pub n_steps: usize,
    /// Elapsed time.
    pub elapsed: f64,
    /// Measurements recorded so far.
    pub points: usize,
}

/// Runs drive protocols on one spin system.
#[derive(Debug)]
pub struct EvolutionEngine<'a> {
    system: &'a NvSystem,
    blocks: Vec<BuildingBlock>,
    compiler: SequenceCompiler,
    compiled: Vec<CompiledBlock>,
}

impl<'a> EvolutionEngine<'a> {
    /// Validate the drive and compile every block.
    pub fn new(
        system: &'a NvSystem,
        blocks: Vec<BuildingBlock>,
        drive: DriveParams,
    ) -> DynamicsResult<Self> {
        let compiler = SequenceCompiler::new(system.hamiltonian().clone(), drive)?;
        let compiled = compiler.compile(&blocks)?;
        debug!(blocks = blocks.len(), "compiled drive protocol");
        Ok(Self {
            system,
            blocks,
            compiler,
            compiled,
        })
    }

    /// The system being driven.
    pub fn system(&self) -> &NvSystem {
        self.system
    }

    /// Blocks as given.
    pub fn blocks(&self) -> &[BuildingBlock] {
        &self.blocks
    }

    /// Blocks as compiled.
    pub fn compiled(&self) -> &[CompiledBlock] {
        &self.compiled
    }

    /// Drive parameters.
    pub fn drive(&self) -> &DriveParams {
        self.compiler.drive()
    }

    /// Elements applied per block use.
    pub fn sequence_elements(&self) -> Vec<usize> {
        self.compiled.iter().map(CompiledBlock::sequence_elements).collect()
    }

    /// Measurements per block use.
    pub fn data_points(&self) -> Vec<usize> {
        self.compiled.iter().map(CompiledBlock::data_points).collect()
    }

    /// Exact number of measurements for schedules that apply every block
    /// each iteration: `1 + n_steps · Σ data_points`.
    pub fn measurement_count(&self, program: &DriveProgram) -> Option<usize> {
        program
            .is_preallocated()
            .then(|| 1 + program.n_steps() * self.data_points().iter().sum::<usize>())
    }

    /// Run `program` from `initial_state`, measuring `observables`.
    pub fn evolve(
        &self,
        initial_state: &[Complex64],
        program: &DriveProgram,
        observables: &[Observable],
        options: &RunOptions,
        store: Option<&mut dyn CheckpointStore>,
    ) -> DynamicsResult<Trajectory> {
        self.evolve_observed(initial_state, program, observables, options, store, |_| {})
    }

    /// Like [`evolve`](Self::evolve), calling `observer` after every outer
    /// iteration.
    pub fn evolve_observed(
        &self,
        initial_state: &[Complex64],
        program: &DriveProgram,
        observables: &[Observable],
        options: &RunOptions,
        store: Option<&mut dyn CheckpointStore>,
        mut observer: impl FnMut(&StepReport),
    ) -> DynamicsResult<Trajectory> {
        self.validate(initial_state, program, observables, options)?;

        let n_steps = program.n_steps();
        let order = program.block_order(self.compiled.len());
        let data_points = self.data_points();
        let per_step_points: usize = data_points.iter().sum();

        let noise_quota = match &order {
            Some(order) => order.iter().map(|&b| data_points[b]).sum(),
            None => n_steps * per_step_points,
        };
        let noise = if self.drive().noise.is_some() {
            noise_draws(options.seed, noise_quota)
        } else {
            Vec::new()
        };

        let buffer = match (self.measurement_count(program), &order) {
            (Some(n_points), _) => MeasurementBuffer::preallocated(observables.len(), n_points),
            (None, Some(order)) => MeasurementBuffer::growable(
                observables.len(),
                1 + order.iter().map(|&b| data_points[b]).sum::<usize>(),
            ),
            (None, None) => MeasurementBuffer::growable(observables.len(), 1),
        };

        let mut run = RunState {
            psi: initial_state.to_vec(),
            work: self.system.basis().workspace(),
            elapsed: 0.0,
            buffer,
            noise,
            noise_cursor: 0,
            observables,
            scratch: Vec::with_capacity(observables.len()),
        };

        info!(
            mode = program.mode(),
            n_steps,
            blocks = self.compiled.len(),
            observables = observables.len(),
            noise = self.drive().noise,
            "starting evolution"
        );

        run.measure()?;
        let mut checkpoint = store
            .map(|store| {
                let attrs = self.metadata(program, observables, options);
                Checkpointer::start(store, attrs, &options.group, &run.buffer)
            })
            .transpose()?;

        for step in 0..n_steps {
            match &order {
                Some(order) => self.apply_block(&self.compiled[order[step]], &mut run)?,
                None => {
                    for (b, block) in self.blocks_for_step(program, step)?.iter().enumerate() {
                        self.apply_block(block, &mut run)
                            .map_err(|e| e.in_block(b))?;
                    }
                }
            }

            let completed = step + 1;
            debug!(
                step = completed,
                elapsed = run.elapsed,
                points = run.buffer.len(),
                "finished outer iteration"
            );
            observer(&StepReport {
                completed,
                n_steps,
                elapsed: run.elapsed,
                points: run.buffer.len(),
            });

            if completed % options.save_every == 0 {
                if let Some(cp) = checkpoint.as_mut() {
                    cp.write(&run.buffer, WriteMode::Overwrite)?;
                }
            }
        }

        if let Some(cp) = checkpoint.as_mut() {
            cp.write(&run.buffer, WriteMode::Overwrite)?;
        }

        let group = checkpoint.map(|cp| cp.group);
        let points = run.buffer.len();
        let (values, times) = run.buffer.into_parts();
        info!(points, elapsed = run.elapsed, group = ?group, "evolution finished");

        Ok(Trajectory {
            observables: values,
            times,
            labels: observables.iter().map(|o| o.label().to_string()).collect(),
            group,
        })
    }

    fn validate(
        &self,
        initial_state: &[Complex64],
        program: &DriveProgram,
        observables: &[Observable],
        options: &RunOptions,
    ) -> DynamicsResult<()> {
        let dim = self.system.basis().dim();
        if initial_state.len() != dim {
            return Err(DynamicsError::StateLength {
                expected: dim,
                got: initial_state.len(),
            });
        }
        if let Some(obs) = observables.iter().find(|o| o.dim() != dim) {
            return Err(DynamicsError::ObservableDimension {
                label: obs.label().to_string(),
                expected: dim,
                got: obs.dim(),
            });
        }
        if options.save_every == 0 {
            return Err(DynamicsError::InvalidParameter {
                name: "save_every",
                reason: "must be at least 1".into(),
            });
        }
        program.validate(self.compiled.len())
    }

    /// Blocks applied in one iteration of a periodic or time-dependent
    /// program.
    fn blocks_for_step(
        &self,
        program: &DriveProgram,
        step: usize,
    ) -> DynamicsResult<Vec<Cow<'_, CompiledBlock>>> {
        let DriveProgram::TimeDependent { modulations, .. } = program else {
            return Ok(self.compiled.iter().map(Cow::Borrowed).collect());
        };
        self.blocks
            .iter()
            .zip(&self.compiled)
            .zip(modulations)
            .enumerate()
            .map(|(b, ((block, compiled), modulation))| match modulation {
                None => Ok(Cow::Borrowed(compiled)),
                Some(m) => {
                    let modulated = block
                        .map_durations(|d| m.apply(d, step))
                        .and_then(|blk| self.compiler.compile_block(&blk))
                        .map_err(|e| e.in_block(b))?;
                    Ok(Cow::Owned(modulated))
                }
            })
            .collect()
    }

    fn apply_block(&self, block: &CompiledBlock, run: &mut RunState<'_>) -> DynamicsResult<()> {
        for _ in 0..block.repetitions() {
            for element in block.elements() {
                let start = run.elapsed;
                run.elapsed += element.duration;
                match &element.slot {
                    PropagatorSlot::Precomputed(p) => p.apply(&mut run.psi, &mut run.work)?,
                    PropagatorSlot::Deferred => {
                        let draw = run.next_draw()?;
                        self.compiler
                            .build_noisy(start, element.duration, draw)?
                            .apply(&mut run.psi, &mut run.work)?;
                    }
                }
                if element.kind.is_dipolar() {
                    run.measure()?;
                }
            }
        }
        Ok(())
    }

    fn metadata(
        &self,
        program: &DriveProgram,
        observables: &[Observable],
        options: &RunOptions,
    ) -> Attributes {
        let cfg = self.system.config();
        let drive = self.drive();
        let mut attrs = Attributes::new();
        attrs.insert("system_size".into(), cfg.n_sites.into());
        attrs.insert("seed".into(), cfg.seed.into());
        attrs.insert("field_direction".into(), cfg.field_direction.as_str().into());
        attrs.insert("min_dist".into(), cfg.min_dist.into());
        attrs.insert("max_dist".into(), cfg.max_dist.into());
        attrs.insert("scaling_factor".into(), cfg.scaling_factor.into());
        attrs.insert("energy_scale".into(), self.system.energy_scale().into());
        attrs.insert(
            "detuning".into(),
            match &drive.detuning {
                Some(Detuning::Uniform(v)) => AttrValue::Float(*v),
                Some(Detuning::PerSite(vs)) => AttrValue::FloatList(vs.clone()),
                None => AttrValue::from("None"),
            },
        );
        attrs.insert("rabi_freq".into(), drive.rabi_freq.into());
        attrs.insert(
            "noise".into(),
            drive.noise.map_or_else(|| AttrValue::from("None"), AttrValue::Float),
        );
        if let Some(ac) = &drive.ac {
            attrs.insert("ac".into(), ac.label().into());
        }
        attrs.insert("mode".into(), program.mode().into());
        attrs.insert("run_seed".into(), options.seed.into());
        attrs.insert(
            "labels".into(),
            observables
                .iter()
                .map(Observable::label)
                .collect::<Vec<_>>()
                .join(",")
                .into(),
        );
        attrs.insert("created_at".into(), Utc::now().to_rfc3339().into());
        attrs.extend(options.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        attrs
    }
}

struct RunState<'r> {
    psi: Vec<Complex64>,
    work: Vec<Complex64>,
    elapsed: f64,
    buffer: MeasurementBuffer,
    noise: Vec<f64>,
    noise_cursor: usize,
    observables: &'r [Observable],
    scratch: Vec<f64>,
}

impl RunState<'_> {
    fn measure(&mut self) -> DynamicsResult<()> {
        self.scratch.clear();
        for obs in self.observables {
            self.scratch.push(obs.per_site(&self.psi)?);
        }
        self.buffer.record(self.elapsed, &self.scratch)
    }

    fn next_draw(&mut self) -> DynamicsResult<f64> {
        let draw = self
            .noise
            .get(self.noise_cursor)
            .copied()
            .ok_or(DynamicsError::NoiseExhausted {
                drawn: self.noise_cursor,
            })?;
        self.noise_cursor += 1;
        Ok(draw)
    }
}

struct Checkpointer<'s> {
    store: &'s mut dyn CheckpointStore,
    group: String,
    attrs: Attributes,
}

impl<'s> Checkpointer<'s> {
    /// First write; picks a fresh group if the requested one is taken.
    fn start(
        store: &'s mut dyn CheckpointStore,
        attrs: Attributes,
        group: &str,
        buffer: &MeasurementBuffer,
    ) -> DynamicsResult<Self> {
        let mut cp = Self {
            store,
            group: group.to_string(),
            attrs,
        };
        cp.write(buffer, WriteMode::AvoidCollision)?;
        Ok(cp)
    }

    fn write(&mut self, buffer: &MeasurementBuffer, mode: WriteMode) -> DynamicsResult<()> {
        let (values, times) = buffer.snapshot();
        let mut attrs = self.attrs.clone();
        attrs.insert("filled".into(), buffer.len().into());

        let shape = vec![values.nrows(), values.ncols()];
        let observables =
            Dataset::new(shape, values.iter().copied().collect())?.with_attrs(attrs.clone());
        let times = Dataset::vector(times).with_attrs(attrs);

        self.group = self.store.write_snapshot(
            &self.group,
            &[(OBSERVABLES_DATASET, observables), (TIMES_DATASET, times)],
            mode,
        )?;
        Ok(())
    }
}
