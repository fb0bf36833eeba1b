use std::{hint::black_box, time::Duration};

use audio_transcode_io::{
    buffer::TranscodeBuffer,
    id3::{Id3Tag, render_v1},
    types::MetaTag,
};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// Encoded chunk sizes: a short CBR frame run up to a large VBR block.
const CHUNK_SIZES: &[usize] = &[417, 4_608, 65_536];
const OUTPUT_BYTES: usize = 8 * 1024 * 1024;
const READ_SIZES: &[usize] = &[4_096, 131_072];

fn bench_buffer_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_append");
    configure_group(&mut group);
    group.throughput(Throughput::Bytes(OUTPUT_BYTES as u64));

    for &chunk_size in CHUNK_SIZES {
        let chunk = vec![0xAAu8; chunk_size];
        group.bench_with_input(
            BenchmarkId::new("append", chunk_size),
            &chunk,
            |b, chunk| {
                b.iter_batched(
                    TranscodeBuffer::new,
                    |mut buffer| {
                        for _ in 0..OUTPUT_BYTES / chunk.len() {
                            buffer.append(black_box(chunk)).expect("append failed");
                        }
                        buffer
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_buffer_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_finalize");
    configure_group(&mut group);

    let mut tag = Id3Tag::new();
    tag.set_text(MetaTag::Title, Some("Benchmark"));
    let trailer = render_v1(&tag).expect("trailer render failed");
    let audio = vec![0x55u8; OUTPUT_BYTES];

    group.bench_function("trailer_and_commit", |b| {
        b.iter_batched(
            || {
                let mut buffer = TranscodeBuffer::with_capacity(OUTPUT_BYTES + trailer.len());
                buffer.write_from_end(&trailer, 0).expect("anchor failed");
                buffer.append(&audio).expect("append failed");
                buffer
            },
            |mut buffer| {
                buffer
                    .set_final_length(black_box(OUTPUT_BYTES + trailer.len()))
                    .expect("commit failed");
                buffer
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_buffer_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_read");
    configure_group(&mut group);

    let mut buffer = TranscodeBuffer::new();
    buffer
        .append(&vec![0x11u8; OUTPUT_BYTES])
        .expect("append failed");

    for &read_size in READ_SIZES {
        group.throughput(Throughput::Bytes(OUTPUT_BYTES as u64));
        group.bench_with_input(
            BenchmarkId::new("sequential", read_size),
            &read_size,
            |b, &read_size| {
                b.iter(|| {
                    let mut offset = 0;
                    let mut total = 0;
                    while offset < buffer.len() {
                        let bytes = buffer.read_at(black_box(offset), read_size);
                        total += bytes.len();
                        offset += read_size;
                    }
                    total
                });
            },
        );
    }

    group.finish();
}

fn configure_group(group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(8));
}

criterion_group!(
    name = buffer_benches;
    config = Criterion::default()
        .sample_size(50)
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(8))
        .configure_from_args();
    targets = bench_buffer_append, bench_buffer_finalize, bench_buffer_read
);
criterion_main!(buffer_benches);
