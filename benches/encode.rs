//! Encoding benchmarks for parajpeg using criterion.
//!
//! Covers encoder configurations, image sizes and device thread counts.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parajpeg::{Encoder, EncoderConfig, Subsampling};

/// Create a synthetic test image with gradient and noise.
fn create_test_image(width: usize, height: usize) -> Vec<u8> {
    let mut rgb = vec![0u8; width * height * 3];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 3;
            let noise = ((x * 7 + y * 13) % 50) as u8;
            rgb[idx] = ((x * 255 / width) as u8).saturating_add(noise);
            rgb[idx + 1] = ((y * 255 / height) as u8).saturating_add(noise);
            rgb[idx + 2] = (((x + y) * 255 / (width + height)) as u8).saturating_add(noise);
        }
    }
    rgb
}

fn bench_encoder_configs(c: &mut Criterion) {
    let (width, height) = (512usize, 512usize);
    let rgb = create_test_image(width, height);

    let configs = [
        ("q75_420", EncoderConfig::default()),
        ("q90_444", EncoderConfig::default().quality(90).subsampling(Subsampling::S444)),
        ("q85_422", EncoderConfig::default().quality(85).subsampling(Subsampling::S422)),
        ("q75_420_opt", EncoderConfig::default().optimize_huffman(true)),
    ];

    let mut group = c.benchmark_group("configs");
    group.throughput(Throughput::Elements((width * height) as u64));

    for (name, config) in configs {
        let mut encoder = Encoder::with_config(width as u32, height as u32, config).unwrap();
        group.bench_function(BenchmarkId::new("encode", name), |b| {
            b.iter(|| encoder.encode(black_box(&rgb)).unwrap())
        });
    }
    group.finish();
}

fn bench_image_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sizes");

    for &size in &[64usize, 256, 1024] {
        let rgb = create_test_image(size, size);
        let mut encoder = Encoder::create(size as u32, size as u32, 85).unwrap();

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rgb, |b, rgb| {
            b.iter(|| encoder.encode(black_box(rgb)).unwrap())
        });
    }
    group.finish();
}

fn bench_thread_counts(c: &mut Criterion) {
    let (width, height) = (1024usize, 1024usize);
    let rgb = create_test_image(width, height);

    let mut group = c.benchmark_group("threads");
    group.throughput(Throughput::Elements((width * height) as u64));

    for &threads in &[1usize, 2, 4, 8] {
        let config = EncoderConfig::default().threads(threads);
        let mut encoder = Encoder::with_config(width as u32, height as u32, config).unwrap();
        group.bench_function(BenchmarkId::from_parameter(threads), |b| {
            b.iter(|| encoder.encode(black_box(&rgb)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encoder_configs,
    bench_image_sizes,
    bench_thread_counts
);
criterion_main!(benches);
