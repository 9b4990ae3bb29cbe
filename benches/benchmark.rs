use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};
use keypoint_benchmark::features::{
    BriefDescriptor, BruteForceMatcher, DescriptorExtractor, Detector, FastDetector, Matcher,
    NativeFeatures,
};
use keypoint_benchmark::frame::{Frame, FrameWindow};
use keypoint_benchmark::pipeline::{PairPipeline, PipelineOptions};
use keypoint_benchmark::types::{
    Configuration, DescriptorFamily, DescriptorKind, DetectorKind, MatcherKind, SelectorKind,
};

fn checkerboard(w: u32, h: u32, cell: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Luma([30])
        } else {
            Luma([220])
        }
    })
}

fn bench_fast(c: &mut Criterion) {
    let img = checkerboard(640, 480, 24);
    let detector = FastDetector::default();
    c.bench_function("fast_detect", |b| b.iter(|| detector.detect(black_box(&img))));
}

fn bench_brief(c: &mut Criterion) {
    let img = checkerboard(640, 480, 24);
    let kps = FastDetector::default().corners(&img).unwrap();
    let descriptor = BriefDescriptor::default();
    c.bench_function("brief_describe", |b| {
        b.iter(|| {
            let mut kps = kps.clone();
            descriptor.describe(black_box(&img), &mut kps)
        })
    });
}

fn bench_matcher(c: &mut Criterion) {
    let img = checkerboard(640, 480, 24);
    let mut kps = FastDetector::default().corners(&img).unwrap();
    let desc = BriefDescriptor::default()
        .describe(&img, &mut kps)
        .unwrap()
        .value;
    let nn = BruteForceMatcher::new(SelectorKind::NearestNeighbor, DescriptorFamily::Binary);
    let knn = BruteForceMatcher::new(SelectorKind::KNearest, DescriptorFamily::Binary);
    c.bench_function("bf_match_nn", |b| {
        b.iter(|| nn.match_descriptors(black_box(&desc), black_box(&desc)))
    });
    c.bench_function("bf_match_knn", |b| {
        b.iter(|| knn.match_descriptors(black_box(&desc), black_box(&desc)))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let img = Arc::new(checkerboard(640, 480, 24));
    let pipeline = PairPipeline::build(
        &NativeFeatures,
        Configuration::new(DetectorKind::Orb, DescriptorKind::Orb),
        MatcherKind::BruteForce,
        SelectorKind::KNearest,
        PipelineOptions::default(),
    )
    .unwrap();
    let mut window = FrameWindow::new(2).unwrap();
    window.push(Frame::new(Arc::clone(&img)));
    pipeline.process(&mut window).unwrap();
    c.bench_function("orb_orb_pair", |b| {
        b.iter(|| {
            window.push(Frame::new(Arc::clone(&img)));
            pipeline.process(&mut window)
        })
    });
}

criterion_group!(benches, bench_fast, bench_brief, bench_matcher, bench_pipeline);
criterion_main!(benches);
