//! Benchmarks for protocol processing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pidlink_rs::protocol::{decode_line, encode_command, CommandId, FrameCodec};
use pidlink_rs::store::SampleStore;
use pidlink_rs::types::Sample;
use pidlink_rs::ReportId;

/// Build a realistic inbound stream: sample lines for all three loops
/// with the occasional log line mixed in
fn sample_stream(lines: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..lines {
        let id = (1 + (i % 9)) as u8;
        stream.push(id);
        stream.extend(format!("{:.3}", (i as f64 * 0.37).sin() * 200.0).into_bytes());
        stream.push(b'\n');
        if i % 50 == 0 {
            stream.push(255);
            stream.extend_from_slice(b"PID loop status nominal");
            stream.push(b'\n');
        }
    }
    stream
}

fn bench_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");

    for chunk_size in [64usize, 256, 1024].iter() {
        let stream = sample_stream(1000);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("feed_chunked", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut codec = FrameCodec::new();
                    let mut count = 0usize;
                    for chunk in stream.chunks(chunk_size) {
                        count += codec.feed(black_box(chunk)).count();
                    }
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

fn bench_line_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_decoding");
    group.throughput(Throughput::Elements(1));

    group.bench_function("numeric_sample", |b| {
        b.iter(|| black_box(decode_line(black_box(b"\x01123.456"))));
    });

    group.bench_function("log_text", |b| {
        b.iter(|| black_box(decode_line(black_box(b"\xffPID loop status nominal"))));
    });

    group.bench_function("malformed", |b| {
        b.iter(|| black_box(decode_line(black_box(b"\x01not a number"))));
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    let stream = sample_stream(1000);
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("feed_decode_store", |b| {
        b.iter(|| {
            let mut codec = FrameCodec::new();
            let store = SampleStore::new();
            for chunk in stream.chunks(256) {
                for line in codec.feed(chunk) {
                    let Ok(line) = line else { continue };
                    if let pidlink_rs::DecodedEvent::NumericSample { channel, value } =
                        decode_line(&line)
                    {
                        store.append(channel, Sample::new(value, 0.0));
                    }
                }
            }
            black_box(store.snapshot_and_clear())
        });
    });

    group.finish();
}

fn bench_command_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_encoding");
    group.throughput(Throughput::Elements(1));

    group.bench_function("valued", |b| {
        b.iter(|| black_box(encode_command(CommandId::Pid1Kp, Some(black_box(12.5)))));
    });

    group.bench_function("bare", |b| {
        b.iter(|| black_box(encode_command(CommandId::GetAllPidConfigs, None)));
    });

    group.finish();
}

fn bench_store_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_append");
    group.throughput(Throughput::Elements(1));

    group.bench_function("append", |b| {
        let store = SampleStore::new();
        let mut i = 0u64;
        b.iter(|| {
            store.append(ReportId::Pid1Input, Sample::new(i as f64, i as f64 * 1e-3));
            i = i.wrapping_add(1);
        });
        black_box(store.snapshot_and_clear());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_codec,
    bench_line_decoding,
    bench_full_pipeline,
    bench_command_encoding,
    bench_store_append
);
criterion_main!(benches);
