//! codec.rs: benchs encode / decode / aller-retour esbc
//!
//! Lancer :
//!   cargo bench -p esbc-benches
//!   cargo bench -p esbc-benches -- --save-baseline main
//!   cargo bench -p esbc-benches -- --baseline main
//!
//! Données : corpus embarqué (`esbc_benches::corpus`), aucun fichier externe.

use anyhow::Result;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use esbc_benches::{corpus, Case};
use esbc_compiler::{Compiler, CompilerOptions, ProgramSpec};

fn encode(spec: &ProgramSpec) -> Result<Vec<u8>> {
    Ok(Compiler::new(CompilerOptions::default()).encode(spec)?.into_vec())
}

// ────────────────────────────────────────────────────────────────────────────
// Encodage : description → octets
// ────────────────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for Case { name, spec } in corpus() {
        let body_bytes: usize = spec.functions.iter().map(|f| f.body.len()).sum::<usize>() + spec.main_body.len();
        group.throughput(Throughput::Bytes(body_bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &spec, |b, spec| {
            b.iter(|| encode(black_box(spec)).map(|bc| bc.len()).unwrap_or_default());
        });
    }
    group.finish();
}

// ────────────────────────────────────────────────────────────────────────────
// Décodage : octets → texte, et octets → listing
// ────────────────────────────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for Case { name, spec } in corpus() {
        let Ok(bytes) = encode(&spec) else {
            eprintln!("skip {name}: encoding failed");
            continue;
        };
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("source", name), &bytes, |b, bytes| {
            b.iter(|| esbc_decompiler::decompile(black_box(bytes)).map(|s| s.len()).unwrap_or_default());
        });
        group.bench_with_input(BenchmarkId::new("listing", name), &bytes, |b, bytes| {
            b.iter(|| esbc_core::disasm::listing(black_box(bytes)).map(|s| s.len()).unwrap_or_default());
        });
    }
    group.finish();
}

// ────────────────────────────────────────────────────────────────────────────
// Aller-retour : octets → texte → description → octets
// ────────────────────────────────────────────────────────────────────────────

fn round_trip(bytes: &[u8]) -> Result<usize> {
    let text = esbc_decompiler::decompile(bytes)?;
    Ok(encode(&ProgramSpec::from_source(&text)?)?.len())
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    for Case { name, spec } in corpus() {
        let Ok(bytes) = encode(&spec) else { continue };
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| round_trip(black_box(bytes)).unwrap_or_default());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip);
criterion_main!(benches);
