//! Benchmarks for the per-frame gesture detection hot path

use std::collections::VecDeque;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hand_gesture_detection::{
    alignment::HandAligner,
    circular::CircularDetector,
    config::Config,
    kinematics::KinematicsTracker,
    landmarks::Landmark,
    micro_flow::{cohesion_score, FlowSample},
    poses::check_hand_pose,
};

fn synthetic_hand() -> Vec<Landmark> {
    let mut lms = vec![Landmark::with_visibility(0.5, 0.55, 0.95); 21];
    lms[0] = Landmark::with_visibility(0.50, 0.80, 0.95);
    lms[5] = Landmark::with_visibility(0.44, 0.55, 0.95);
    lms[9] = Landmark::with_visibility(0.49, 0.54, 0.95);
    lms[13] = Landmark::with_visibility(0.54, 0.55, 0.95);
    lms[17] = Landmark::with_visibility(0.58, 0.57, 0.95);
    lms[8] = Landmark::with_visibility(0.454, 0.32, 0.95);
    lms[12] = Landmark::with_visibility(0.466, 0.32, 0.95);
    lms
}

fn bench_alignment(c: &mut Criterion) {
    let hand = synthetic_hand();

    c.bench_function("aligner_update", |b| {
        let mut aligner = HandAligner::new();
        b.iter(|| aligner.update(black_box(&hand), 640, 480));
    });

    let mut aligner = HandAligner::new();
    aligner.update(&hand, 640, 480);
    c.bench_function("aligner_distance_and_angle", |b| {
        b.iter(|| {
            let d = aligner.normalized_distance(black_box(&hand));
            let a = aligner.fingertip_angle(black_box(&hand));
            (d, a)
        });
    });
}

fn bench_kinematics(c: &mut Criterion) {
    let hand = synthetic_hand();

    c.bench_function("kinematics_compute", |b| {
        let mut tracker = KinematicsTracker::new(0.35, 24);
        b.iter(|| tracker.compute(black_box(&hand)));
    });
}

fn bench_pose_check(c: &mut Criterion) {
    let hand = synthetic_hand();
    c.bench_function("check_hand_pose", |b| {
        b.iter(|| check_hand_pose(black_box(&hand)));
    });
}

fn bench_cohesion_score(c: &mut Criterion) {
    let flows: Vec<FlowSample> = (0..5)
        .map(|i| {
            let t = f64::from(i) * 0.5;
            FlowSample {
                a: (1.0 + t, 0.5 + t),
                b: (0.9 + t, 0.45 + t),
            }
        })
        .collect();

    c.bench_function("cohesion_score", |b| {
        b.iter(|| cohesion_score(black_box(&flows)));
    });
}

fn bench_circular(c: &mut Criterion) {
    let config = Config::default();

    // A trail tracing a circle, as during an active gesture
    let trail: VecDeque<(f64, f64)> = (0..24)
        .map(|i| {
            let angle = (f64::from(i) * 20.0).to_radians();
            (0.08 * angle.cos(), 0.08 * angle.sin())
        })
        .collect();

    c.bench_function("circular_update", |b| {
        let mut detector = CircularDetector::new(config.circular.clone()).unwrap();
        let mut ts = 0i64;
        b.iter(|| {
            ts += 33;
            detector.update(black_box(&trail), 0.23, true, ts)
        });
    });
}

criterion_group!(
    benches,
    bench_alignment,
    bench_kinematics,
    bench_pose_check,
    bench_cohesion_score,
    bench_circular
);
criterion_main!(benches);
