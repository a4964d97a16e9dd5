use criterion::{black_box, BatchSize, BenchmarkId, Criterion};
use criterion::{criterion_group, criterion_main};

use rlog::{FieldStore, Log, LoggableType, RlogDecoder, Value};

const PUTS_PER_ITER: usize = 10_000;

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    // Ascending timestamps with a changing value hit the append fast path.
    group.bench_function("append_changing", |b| {
        b.iter_batched(
            || FieldStore::new(LoggableType::Number),
            |mut field| {
                for i in 0..PUTS_PER_ITER {
                    field.put(i as f64 * 0.02, black_box(Value::Number(i as f64)));
                }
                field
            },
            BatchSize::LargeInput,
        );
    });

    // A held value exercises the dedup path: every put after the first is a no-op.
    group.bench_function("append_held", |b| {
        b.iter_batched(
            || FieldStore::new(LoggableType::Number),
            |mut field| {
                for i in 0..PUTS_PER_ITER {
                    field.put(i as f64 * 0.02, black_box(Value::Number(1.0)));
                }
                field
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_get_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_range");
    for &size in &[1_000_usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut field = FieldStore::new(LoggableType::Number);
            for i in 0..size {
                field.put(i as f64 * 0.02, Value::Number(i as f64));
            }
            let mid = size as f64 * 0.01;
            b.iter(|| field.get_range(black_box(mid - 1.0), black_box(mid + 1.0)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for &frames in &[1_000_usize, 10_000] {
        let buf = sample_buffer(frames);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &buf, |b, buf| {
            b.iter_batched(
                || (Log::new(), RlogDecoder::new()),
                |(mut log, mut decoder)| {
                    assert!(decoder.decode(&mut log, black_box(buf)));
                    log
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn sample_buffer(frames: usize) -> Vec<u8> {
    let mut buf = vec![0x01, 0x00];
    for i in 0..frames {
        buf.extend_from_slice(&(i as f64 * 0.02).to_be_bytes());
        if i == 0 {
            // Key declaration: id 1, "/bench".
            buf.push(0x01);
            buf.extend_from_slice(&1i16.to_be_bytes());
            buf.extend_from_slice(&6u16.to_be_bytes());
            buf.extend_from_slice(b"/bench");
        }
        // Field update: id 1, double payload.
        buf.push(0x02);
        buf.extend_from_slice(&1i16.to_be_bytes());
        buf.push(0x05);
        buf.extend_from_slice(&(i as f64).to_be_bytes());
        buf.push(0x00);
    }
    buf
}

criterion_group!(benches, bench_put, bench_get_range, bench_decode);
criterion_main!(benches);
