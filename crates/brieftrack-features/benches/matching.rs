use brieftrack_core::GrayImage;
use brieftrack_features::{
    extract_features, FastDetector, Matcher, MatcherParams, ReferenceIndex,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn block_texture(w: usize, h: usize, block: usize, seed: u64) -> GrayImage {
    let bw = w.div_ceil(block);
    let mut s = seed;
    let cells: Vec<u8> = (0..bw * h.div_ceil(block))
        .map(|_| {
            s = s
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (s >> 56) as u8
        })
        .collect();
    let mut img = GrayImage::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            img.set(x, y, cells[(y / block) * bw + x / block]);
        }
    }
    img
}

fn bench_matching(c: &mut Criterion) {
    let reference = block_texture(320, 240, 6, 11);
    let detector = FastDetector::default();
    let index = ReferenceIndex::build_from_image(&reference.view(), &detector).expect("model");
    let query = extract_features(&reference.view(), &detector);
    let matcher = Matcher::new(&index, &MatcherParams::default());

    c.bench_function("extract_320x240", |b| {
        b.iter(|| extract_features(black_box(&reference.view()), &detector))
    });
    c.bench_function("match_all", |b| {
        b.iter(|| matcher.match_all(black_box(&query)))
    });
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
