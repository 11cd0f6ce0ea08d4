// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use rust_serial_analyzer::acquisition::{decode, LinkConfig};
use rust_serial_analyzer::preprocessing::lowpass;
use rust_serial_analyzer::spectral;

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let block: Vec<f64> = (0..256).map(|_| 512.0 + 100.0 * rng.random::<f64>()).collect();
    let recording: Vec<f64> = (0..24_064).map(|_| 512.0 + 100.0 * rng.random::<f64>()).collect();

    let link = LinkConfig::new(8000, 256).unwrap();
    let line = format!(
        "WAV:{}",
        block
            .iter()
            .map(|v| format!("{:.4}", v))
            .collect::<Vec<_>>()
            .join(",")
    );

    c.bench_function("decode_waveform_line", |b| {
        b.iter(|| decode(black_box(&line), black_box(&link)))
    });

    c.bench_function("spectrum_block_256", |b| {
        b.iter(|| spectral::analyze(black_box(&block), 8000))
    });

    c.bench_function("spectrum_recording_3s", |b| {
        b.iter(|| spectral::analyze(black_box(&recording), 8000))
    });

    c.bench_function("lowpass_recording_3s", |b| {
        b.iter(|| lowpass(black_box(&recording), 8000, 1000.0, 4))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
