use std::fs;
use std::io::Write;
use std::time::{Duration, Instant};

use rawflate::{
    compress_to_vec_with, BufferType, CompressionType, DeflateOptions, Decompressor,
    InflateOptions,
};

const COMPRESSION_TYPES: [CompressionType; 3] = [
    CompressionType::None,
    CompressionType::Fixed,
    CompressionType::Dynamic,
];

#[derive(Default)]
struct Totals {
    compressed_bytes: usize,
    ratios: Vec<f64>,
    compress_time: Duration,
    decompress_time: Duration,
}

fn main() {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: rawflate FILE...");
        std::process::exit(2);
    }

    let lazy_threshold = std::env::var("RAWFLATE_LAZY")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let mut total_bytes = 0;
    let mut totals: Vec<Totals> = COMPRESSION_TYPES.iter().map(|_| Totals::default()).collect();

    for (i, path) in paths.iter().enumerate() {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) => {
                eprintln!("skipping {}: {}", path, err);
                continue;
            }
        };
        if raw.is_empty() {
            continue;
        }
        total_bytes += raw.len();

        for (&compression_type, totals) in COMPRESSION_TYPES.iter().zip(&mut totals) {
            let options = DeflateOptions {
                compression_type,
                lazy_threshold,
            };
            let start = Instant::now();
            let compressed = compress_to_vec_with(&raw, options);
            totals.compress_time += start.elapsed();

            for &buffer_type in &[BufferType::Block, BufferType::Adaptive] {
                let start = Instant::now();
                let decompressed = Decompressor::new(
                    &compressed,
                    InflateOptions {
                        buffer_type,
                        ..Default::default()
                    },
                )
                .decompress();
                totals.decompress_time += start.elapsed();

                if decompressed.as_deref() != Ok(&raw[..]) {
                    eprintln!(
                        "roundtrip failed for {} ({:?}, {:?}): {:?}",
                        path,
                        compression_type,
                        buffer_type,
                        decompressed.err()
                    );
                    std::process::exit(1);
                }
            }

            totals.compressed_bytes += compressed.len();
            totals.ratios.push(100.0 * compressed.len() as f64 / raw.len() as f64);
        }

        if i % 10 == 9 {
            print!(".");
            std::io::stdout().flush().unwrap();
            if i % 500 == 499 {
                println!();
            }
        }
    }
    println!();

    if total_bytes == 0 {
        println!("no input");
        return;
    }

    for (compression_type, totals) in COMPRESSION_TYPES.iter().zip(&totals) {
        let mean = totals.ratios.iter().sum::<f64>() / totals.ratios.len() as f64;
        let geomean =
            (totals.ratios.iter().map(|r| r.ln()).sum::<f64>() / totals.ratios.len() as f64).exp();
        println!(
            "{:>8}: total: {:.2}%, mean: {:.2}%, geomean: {:.2}%, compress: {:.1} MB/s, decompress: {:.1} MB/s",
            format!("{:?}", compression_type),
            100.0 * totals.compressed_bytes as f64 / total_bytes as f64,
            mean,
            geomean,
            total_bytes as f64 / totals.compress_time.as_secs_f64() / 1e6,
            2.0 * total_bytes as f64 / totals.decompress_time.as_secs_f64() / 1e6,
        );
    }
}
