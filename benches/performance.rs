//! Performance benchmarks for crypto-strategies
//!
//! Run with: `cargo bench`
//! View results: `open target/criterion/report/index.html`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

// Note: Full benchmarks require the actual crypto_strategies crate to be built
// This is a placeholder structure showing what benchmarks we'll add

fn benchmark_indicators(c: &mut Criterion) {
    // Benchmark technical indicators (ATR, EMA, RSI, etc.)
    c.bench_function("placeholder_atr", |b| b.iter(|| black_box(42)));
}

fn benchmark_backtest(c: &mut Criterion) {
    // Benchmark full backtest execution
    c.bench_function("placeholder_backtest", |b| b.iter(|| black_box(1000)));
}

criterion_group!(benches, benchmark_indicators, benchmark_backtest);
criterion_main!(benches);
