//! Parse throughput benchmark for shsyntax
//!
//! Measures whole-file parses of a realistic entrypoint script, a long
//! generated script, and nesting close to the default limit.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const ENTRYPOINT: &str = include_str!("../tests/fixtures/docker-entrypoint.sh");

/// Line counts for generated scripts
const SCRIPT_LINES: &[usize] = &[100, 1000, 10000];

fn generated_script(lines: usize) -> String {
    let mut script = String::new();
    for i in 0..lines {
        let line = match i % 4 {
            0 => format!("export VAR_{i}=(a b [3]=c)\n"),
            1 => format!("if [[ -n \"$VAR_{i}\" ]]; then echo {i} | tr a b; fi\n"),
            2 => format!("for x in 1 2 3; do y=$((x + {i})); done\n"),
            _ => format!("case $x in a|b) echo \"${{x:-{i}}}\" ;; *) : ;; esac\n"),
        };
        script.push_str(&line);
    }
    script
}

fn bench_entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("entrypoint");
    group.throughput(Throughput::Bytes(ENTRYPOINT.len() as u64));
    group.bench_function("parse", |b| {
        b.iter(|| shsyntax::parse(black_box(ENTRYPOINT)));
    });
    group.bench_function("tokenize", |b| {
        b.iter(|| shsyntax::parser::lexer::tokenize(black_box(ENTRYPOINT)));
    });
    group.finish();
}

fn bench_generated(c: &mut Criterion) {
    let mut group = c.benchmark_group("generated");
    for &lines in SCRIPT_LINES {
        let script = generated_script(lines);
        group.throughput(Throughput::Bytes(script.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &script, |b, script| {
            b.iter(|| shsyntax::parse(black_box(script)));
        });
    }
    group.finish();
}

fn bench_nesting(c: &mut Criterion) {
    let depth = 200;
    let script = format!("{}a{}", "( ".repeat(depth), " )".repeat(depth));
    c.bench_function("nested_subshells_200", |b| {
        b.iter(|| shsyntax::parse(black_box(&script)));
    });
}

/// The benchmark inputs parse without diagnostics
#[test]
fn verify_inputs_parse_cleanly() {
    let parse = shsyntax::parse(&generated_script(8)).unwrap();
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
}

criterion_group!(benches, bench_entrypoint, bench_generated, bench_nesting);
criterion_main!(benches);
