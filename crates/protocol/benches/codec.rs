//! Performance benchmarks for the wire layer.
//!
//! These benchmarks measure the hot paths of a transfer:
//! - Frame encoding/decoding
//! - Envelope seal/open at the chunk sizes the server emits

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use protocol::{open, seal, Frame, FrameCodec, FrameType, SessionKey};

/// Benchmark frame encode/decode at representative payload sizes.
fn bench_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");
    let codec = FrameCodec::new();

    for (name, size) in [("small_64B", 64), ("chunk_64KB", 64 * 1024), ("chunk_256KB", 256 * 1024)]
    {
        let frame = Frame::new(FrameType::Data, vec![0xa5; size]);
        let encoded = codec.encode(&frame).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("encode_{name}"), |b| {
            b.iter(|| codec.encode(black_box(&frame)).unwrap());
        });
        group.bench_function(format!("decode_{name}"), |b| {
            b.iter(|| codec.decode(black_box(&encoded)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark envelope seal/open at the chunk sizes used by downloads.
fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let key = SessionKey::generate();

    for (name, size) in [("1KB", 1024), ("64KB", 64 * 1024), ("256KB", 256 * 1024)] {
        let plaintext = vec![0x5a; size];
        let sealed = seal(&plaintext, &key).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("seal_{name}"), |b| {
            b.iter(|| seal(black_box(&plaintext), &key).unwrap());
        });
        group.bench_function(format!("open_{name}"), |b| {
            b.iter(|| open(black_box(&sealed), &key).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_codec, bench_envelope);
criterion_main!(benches);
