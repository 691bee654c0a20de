//! Benchmarks for the resize path.
//!
//! Run with: cargo bench -p thumbing-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thumbing_core::config::{LimitsConfig, ResizeConfig};
use thumbing_core::resize::{ImageDecoder, Resizer};
use thumbing_core::store::object::etag;

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("encode fixture");
    buf.into_inner()
}

fn benchmark_decode(c: &mut Criterion) {
    let bytes = png_bytes(&DynamicImage::new_rgb8(1024, 768));
    let decoder = ImageDecoder::new(LimitsConfig::default());
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("decode_png_1024", |b| {
        b.iter(|| {
            let _ = rt.block_on(decoder.decode(black_box(bytes.clone()), "input/bench.png"));
        })
    });
}

fn benchmark_resize_and_encode(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);
    let resizer = Resizer::new(ResizeConfig::default());

    c.bench_function("resize_encode_512px", |b| {
        b.iter(|| {
            let _ = resizer.resize_and_encode(black_box(&img), ImageFormat::Png, "input/bench.png");
        })
    });
}

fn benchmark_etag(c: &mut Criterion) {
    let bytes = vec![0u8; 1 << 20];

    c.bench_function("etag_blake3_1mb", |b| {
        b.iter(|| {
            let _ = etag(black_box(&bytes));
        })
    });
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_resize_and_encode,
    benchmark_etag
);
criterion_main!(benches);
