//! Benchmarks for propagator application
//!
//! Run with: cargo bench -p qnv-ops

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qnv_ops::{Coupling, Operator, PauliOp, Propagator, SpinBasis, TermKind, TermSpec};

fn chain_dipolar(b: SpinBasis) -> Operator {
    let n = b.n_sites();
    let mut xy = Vec::new();
    let mut z = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let c = 1.0 / ((j - i) as f64).powi(3);
            xy.push(Coupling::pair(-c, i, j));
            z.push(Coupling::pair(2.0 * c, i, j));
        }
    }
    Operator::build(
        b,
        &[
            TermSpec::new(TermKind::double(PauliOp::X), xy.clone()),
            TermSpec::new(TermKind::double(PauliOp::Y), xy),
            TermSpec::new(TermKind::double(PauliOp::Z), z),
        ],
    )
    .unwrap()
}

fn bench_propagator_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagator_apply");

    for n_sites in &[4usize, 8, 10, 12] {
        let b = SpinBasis::new(*n_sites).unwrap();
        let u = Propagator::unitary(chain_dipolar(b).scale(0.2));
        group.bench_with_input(BenchmarkId::new("dipolar", n_sites), n_sites, |bench, _| {
            let mut psi = b.polarized_up();
            let mut work = b.workspace();
            bench.iter(|| u.apply(black_box(&mut psi), &mut work).unwrap());
        });
    }

    group.finish();
}

fn bench_operator_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator_build");
    for n_sites in &[6usize, 10] {
        let b = SpinBasis::new(*n_sites).unwrap();
        group.bench_with_input(BenchmarkId::new("dipolar", n_sites), n_sites, |bench, _| {
            bench.iter(|| chain_dipolar(black_box(b)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_propagator_apply, bench_operator_build);
criterion_main!(benches);
