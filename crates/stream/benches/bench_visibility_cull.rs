use std::hint::black_box;
use std::time::{Duration, Instant};

use glam::Vec2;
use gridview_common::ViewBounds;
use gridview_stream::{CullSettings, FrameScheduler, FrameSettings, VisibilityCuller};

fn make_highlights(count: usize, extent: u32) -> Vec<Vec2> {
    let mut state = 0x9e37_79b9_u32;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let x = (state % extent) as f32;
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let y = (state % extent) as f32;
            Vec2::new(x, y)
        })
        .collect()
}

/// Pan a fixed-size window across the grid so every pass sees new bounds.
fn bench_panning_cull(count: usize, view: f64, iterations: usize) {
    let highlights = make_highlights(count, 1024);
    let mut culler = VisibilityCuller::new(CullSettings::default());

    let start = Instant::now();
    for i in 0..iterations {
        let offset = (i % 512) as f64;
        let bounds = ViewBounds::new(offset, offset + view, offset, offset + view);
        black_box(culler.refresh(black_box(&highlights), black_box(bounds)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  panning cull ({count} highlights, view={view}, {iterations} iters): {per_iter:?}/iter, uploads {}",
        culler.stats().uploads
    );
}

/// Repeated identical bounds: should cost a comparison, not a scan.
fn bench_static_cull(count: usize, iterations: usize) {
    let highlights = make_highlights(count, 1024);
    let mut culler = VisibilityCuller::new(CullSettings::default());
    let bounds = ViewBounds::new(0.0, 1024.0, 0.0, 1024.0);

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(culler.refresh(black_box(&highlights), black_box(bounds)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  static cull ({count} highlights, {iterations} iters): {per_iter:?}/iter, passes {}",
        culler.stats().passes
    );
}

fn bench_scheduler(iterations: usize) {
    let mut scheduler = FrameScheduler::new(FrameSettings::default());
    let t0 = Instant::now();
    let mut drawn = 0usize;

    let start = Instant::now();
    for i in 0..iterations {
        let now = t0 + Duration::from_millis(i as u64);
        if i % 50 == 0 {
            scheduler.mark_dirty();
        }
        if scheduler.begin_frame(black_box(now)) == gridview_stream::FrameDecision::Draw {
            drawn += 1;
        }
    }
    let elapsed = start.elapsed();
    println!(
        "  scheduler ({iterations} requests at 1ms spacing): {:?}/iter, drawn {drawn}",
        elapsed / iterations as u32
    );
}

fn main() {
    println!("=== Visibility Cull Benchmarks ===\n");

    println!("Panning cull:");
    bench_panning_cull(10_000, 64.0, 1000);
    bench_panning_cull(50_000, 64.0, 500);
    bench_panning_cull(50_000, 512.0, 200);

    println!("\nStatic cull:");
    bench_static_cull(50_000, 100_000);

    println!("\nFrame scheduler:");
    bench_scheduler(100_000);

    println!("\n=== Done ===");
}
