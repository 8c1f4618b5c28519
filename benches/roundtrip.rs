use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use rawflate::{
    compress_to_vec_with, decompress_to_vec, CompressionType, DeflateOptions, StreamDecompressor,
};

fn inputs() -> Vec<(&'static str, Vec<u8>)> {
    let mut rng = rand::thread_rng();
    let uniform: Vec<u8> = (0..1024 * 1024).map(|_| rng.gen()).collect();
    let low: Vec<u8> = (0..1024 * 1024)
        .map(|_| (rng.gen_range::<u8, _>(0..16) * 2).wrapping_sub(16))
        .collect();
    let mixture: Vec<u8> = (0..1024 * 1024)
        .map(|_| match rng.gen_range(0..100) {
            0 => rng.gen(),
            1..=2 => rng.gen_range::<u8, _>(0..32).wrapping_sub(16),
            11..=50 => rng.gen_range::<u8, _>(0..16).wrapping_sub(8),
            _ => 0,
        })
        .collect();
    vec![("uniform", uniform), ("low", low), ("mixture", mixture)]
}

fn options(compression_type: CompressionType) -> DeflateOptions {
    DeflateOptions {
        compression_type,
        lazy_threshold: 0,
    }
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    group.sample_size(10);
    for (name, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for &compression_type in &[
            CompressionType::None,
            CompressionType::Fixed,
            CompressionType::Dynamic,
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", compression_type), name),
                &data,
                |b, data| b.iter(|| compress_to_vec_with(data, options(compression_type))),
            );
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    group.sample_size(10);
    for (name, data) in inputs() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for &compression_type in &[CompressionType::Fixed, CompressionType::Dynamic] {
            let compressed = compress_to_vec_with(&data, options(compression_type));
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", compression_type), name),
                &compressed,
                |b, compressed| b.iter(|| decompress_to_vec(compressed).unwrap()),
            );
        }

        let compressed = compress_to_vec_with(&data, options(CompressionType::Dynamic));
        group.bench_with_input(BenchmarkId::new("Stream", name), &compressed, |b, compressed| {
            b.iter(|| {
                let mut decompressor = StreamDecompressor::default();
                let mut total = 0;
                for chunk in compressed.chunks(4096) {
                    total += decompressor.decompress(Some(chunk)).unwrap().len();
                }
                total
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
