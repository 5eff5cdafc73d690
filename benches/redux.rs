//! cargo bench --bench redux
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use seqre::{Engine, Regex};

/// Deterministic pseudo random DNA.
fn synthetic_dna(len: usize) -> String {
    let mut state = 42u64;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"acgt"[(state >> 33) as usize % 4] as char
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let seq = synthetic_dna(100_000);

    {
        let dfa = Regex::new("agggtaaa|tttaccct").unwrap();
        assert!(dfa.uses_dfa());
        c.bench_function("count_variant_dfa", |b| {
            b.iter(|| dfa.count(black_box(seq.as_str())))
        });

        let nfa = Regex::builder()
            .engine(Engine::Nfa)
            .build("agggtaaa|tttaccct")
            .unwrap();
        c.bench_function("count_variant_pikevm", |b| {
            b.iter(|| nfa.count(black_box(seq.as_str())))
        });

        let bare = Regex::builder()
            .engine(Engine::Nfa)
            .prefilter(false)
            .build("agggtaaa|tttaccct")
            .unwrap();
        c.bench_function("count_variant_pikevm_no_prefilter", |b| {
            b.iter(|| bare.count(black_box(seq.as_str())))
        });
    }

    {
        let re = Regex::new("agggta[cgt]a|t[acg]taccct").unwrap();
        c.bench_function("count_class_variant", |b| {
            b.iter(|| re.count(black_box(seq.as_str())))
        });
    }

    {
        let text = "tHat is aND will be tHaN BY WaS not ".repeat(2_000);
        let re = Regex::new("tHa[Nt]").unwrap();
        c.bench_function("replace_all", |b| {
            b.iter(|| re.replace_all(black_box(text.as_str()), "<4>"))
        });
    }

    c.bench_function("compile_variant", |b| {
        b.iter(|| Regex::new(black_box("agggtaaa|tttaccct")).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
