//! Performance benchmarks for frame rendering and gesture classification
//!
//! A frame has to fit comfortably inside the 33ms budget at 30 fps.
//! Run with: cargo bench

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ratatui::layout::Rect;

use devdash::adapters::mock::{
    MockAssistant, MockCache, MockCodeHost, MockPeripherals, MockVoice, TestDisplay,
};
use devdash::app::App;
use devdash::config::AppConfig;
use devdash::input::{GestureClassifier, InputEvent};
use devdash::models::{CiState, PullRequest, PullState};
use devdash::screens::{ScreenId, Services};
use devdash::traits::RenderTarget;

const REPO: &str = "octo/widgets";

fn pulls(count: u64) -> Vec<PullRequest> {
    (1..=count)
        .map(|number| PullRequest {
            repo: REPO.to_string(),
            number,
            title: format!("Change number {}", number),
            author: "mona".to_string(),
            state: PullState::Open,
            ci_status: CiState::Success,
            files_changed: 4,
            additions: 120,
            deletions: 30,
            url: format!("https://github.com/{}/pull/{}", REPO, number),
            head_sha: format!("{:040x}", number),
            updated_at: Utc::now() - ChronoDuration::minutes(number as i64),
        })
        .collect()
}

fn services() -> Services {
    let config = AppConfig::default()
        .with_token("bench-token")
        .with_repos([REPO])
        .with_deploy_repo(REPO);
    Services {
        config: Arc::new(config),
        cache: Arc::new(MockCache::new().with_pulls(pulls(20))),
        code_host: Arc::new(MockCodeHost::new()),
        assistant: Arc::new(MockAssistant::new()),
        peripherals: Arc::new(MockPeripherals::new()),
        voice: Arc::new(MockVoice::unavailable()),
    }
}

/// Benchmark one full frame (chrome plus content) for each screen
fn bench_frame_render(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();

    let mut group = c.benchmark_group("frame_render");
    let mut app = App::new(services(), Instant::now());
    let mut display = TestDisplay::new(80, 24).unwrap();

    for id in ScreenId::ALL {
        app.navigate_to(id.name());
        group.bench_with_input(BenchmarkId::from_parameter(id.name()), &id, |b, _| {
            b.iter(|| {
                display
                    .draw(|frame| app.render(frame, black_box(Instant::now())))
                    .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark classifying a frame's worth of pointer events
fn bench_gesture_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_batch");

    for presses in [1usize, 10, 50].iter() {
        let events: Vec<InputEvent> = (0..*presses)
            .flat_map(|i| {
                let x = (i % 80) as u16;
                [
                    InputEvent::PointerDown { x, y: 10 },
                    InputEvent::PointerUp {
                        x: x.saturating_add(20),
                        y: 10,
                    },
                ]
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_presses", presses)),
            &events,
            |b, events| {
                let mut classifier = GestureClassifier::new();
                classifier.set_viewport(Rect::new(0, 0, 80, 24), 480, 320);
                let start = Instant::now();
                b.iter(|| {
                    let gestures = classifier
                        .process_events(events.iter().copied(), start + Duration::from_millis(80))
                        .unwrap();
                    black_box(gestures)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_frame_render, bench_gesture_batch);

criterion_main!(benches);
