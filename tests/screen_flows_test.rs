//! Screen flows driven end to end against the mock collaborators.
//!
//! Each test builds one screen on a private task hub, triggers it the way
//! the manager would (buttons, swipes, refresh jobs) and applies the events
//! its background tasks send back.

mod common;

use common::{failed_run, pull, test_config, Channel, Harness, REPO};
use devdash::adapters::mock::{MockCache, MockVoice};
use devdash::app::AppMessage;
use devdash::error::NetworkError;
use devdash::hardware::{LedPattern, Melody};
use devdash::input::{Gesture, GestureKind};
use devdash::models::{DeployOutcome, ReviewVerdict};
use devdash::screens::ci_diagnosis::{CiButton, Diagnosis};
use devdash::screens::context_chat::{ChatButton, ChatState, QUICK_QUESTIONS};
use devdash::screens::deploy::{DeployButton, DeployState};
use devdash::screens::home::HomeButton;
use devdash::screens::pr_triage::Analysis;
use devdash::screens::standup::{StandupButton, StandupState};
use devdash::screens::{
    CiDiagnosisScreen, ContextChatScreen, DeployScreen, HomeScreen, PrTriageScreen, Screen,
    ScreenEvent, ScreenId, ScreenStatus, StandupScreen,
};
use devdash::traits::Peripherals;
use devdash::ui::avatar::Mood;
use serde_json::json;
use std::time::Instant;

fn swipe(kind: GestureKind) -> Gesture {
    Gesture {
        kind,
        x: 10,
        y: 10,
        start_x: 10,
        start_y: 10,
    }
}

fn timeout_error() -> NetworkError {
    NetworkError::Timeout {
        operation: "chat completion".to_string(),
        duration_secs: 60,
    }
}

async fn run_refresh<S: Screen>(screen: &mut S) {
    let job = screen.refresh().expect("screen has a refresh job");
    let event = job.await.expect("refresh job succeeds");
    screen.apply(event);
}

// ============================================================================
// Home
// ============================================================================

#[tokio::test]
async fn test_home_counts_and_status() {
    let cache = MockCache::new()
        .with_pulls(vec![pull(REPO, 1, 5), pull(REPO, 2, 10)])
        .with_runs(vec![failed_run(REPO, 9)]);
    let harness = Harness::with_cache(cache);
    harness.code_host.set_notifications(3);
    let channel = Channel::new();
    let mut screen = HomeScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Home),
        Instant::now(),
    );

    run_refresh(&mut screen).await;

    assert_eq!(screen.counts(), (Some(2), Some(1), Some(3)));
    assert_eq!(screen.status(), ScreenStatus::Error);
}

#[tokio::test]
async fn test_home_keeps_notifications_when_count_unavailable() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = HomeScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Home),
        Instant::now(),
    );

    screen.apply(ScreenEvent::HomeCounts {
        pulls: 0,
        failing: 0,
        notifications: Some(4),
    });
    screen.apply(ScreenEvent::HomeCounts {
        pulls: 1,
        failing: 0,
        notifications: None,
    });

    assert_eq!(screen.counts(), (Some(1), Some(0), Some(4)));
    assert_eq!(screen.status(), ScreenStatus::Success);
}

#[tokio::test]
async fn test_home_card_requests_navigation() {
    let harness = Harness::new();
    let mut channel = Channel::new();
    let mut screen = HomeScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Home),
        Instant::now(),
    );

    screen.on_button(HomeButton::Failing);

    assert!(matches!(
        channel.next().await,
        AppMessage::NavigateTo(ScreenId::CiDiagnosis)
    ));
}

#[tokio::test]
async fn test_home_long_press_requests_refresh() {
    let harness = Harness::new();
    let mut channel = Channel::new();
    let mut screen = HomeScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Home),
        Instant::now(),
    );

    screen.on_long_press(&swipe(GestureKind::LongPress));

    assert!(matches!(channel.next().await, AppMessage::RefreshNow));
}

#[tokio::test]
async fn test_home_refresh_failure_offers_retry() {
    let harness = Harness::new();
    harness.cache.set_failing(true);
    let mut channel = Channel::new();
    let mut screen = HomeScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Home),
        Instant::now(),
    );

    screen.on_long_press(&swipe(GestureKind::LongPress));
    assert_eq!(screen.mood(), Mood::Thinking);
    assert!(matches!(channel.next().await, AppMessage::RefreshNow));
    run_refresh(&mut screen).await;

    assert!(screen.error().is_some());
    assert_eq!(screen.mood(), Mood::Idle);
    assert_eq!(screen.status(), ScreenStatus::Warning);

    harness.cache.set_failing(false);
    screen.on_button(HomeButton::Retry);
    assert_eq!(screen.mood(), Mood::Thinking);
    assert!(matches!(channel.next().await, AppMessage::RefreshNow));
    run_refresh(&mut screen).await;

    assert_eq!(screen.error(), None);
    assert_eq!(screen.counts(), (Some(0), Some(0), Some(0)));
    assert_eq!(screen.mood(), Mood::Happy);
}

// ============================================================================
// PR triage
// ============================================================================

#[tokio::test]
async fn test_triage_request_changes_carries_concern() {
    let cache = MockCache::new().with_pulls(vec![pull(REPO, 3, 60), pull(REPO, 7, 5)]);
    let harness = Harness::with_cache(cache);
    harness.code_host.set_diff("--- src/retry.rs (+40/-12)");
    harness.assistant.push_reply(
        r#"{"summary": "Adds retries", "risk": "medium", "concern": "No tests for backoff"}"#,
    );
    let mut channel = Channel::new();
    let mut screen = PrTriageScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::PrTriage),
    );

    run_refresh(&mut screen).await;
    assert_eq!(screen.current().map(|p| p.number), Some(7));

    screen.on_enter();
    assert_eq!(screen.analysis(), &Analysis::Loading);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::PullInsight { .. }))
        .await;
    let Analysis::Ready(insight) = screen.analysis() else {
        panic!("expected a ready analysis, got {:?}", screen.analysis());
    };
    assert_eq!(insight.concern.as_deref(), Some("No tests for backoff"));

    assert!(screen.on_swipe_left(&swipe(GestureKind::SwipeLeft)));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::ReviewSubmitted { .. }))
        .await;

    let reviews = harness.code_host.reviews();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].number, 7);
    assert_eq!(reviews[0].verdict, ReviewVerdict::RequestChanges);
    assert_eq!(
        reviews[0].body,
        "Changes requested from DevDash: No tests for backoff"
    );
    assert_eq!(screen.notice(), Some("Requested changes on #7"));
    assert_eq!(screen.index(), 1);
}

#[tokio::test]
async fn test_triage_approve_by_swipe_right() {
    let cache = MockCache::new().with_pulls(vec![pull(REPO, 11, 1)]);
    let harness = Harness::with_cache(cache);
    let mut channel = Channel::new();
    let mut screen = PrTriageScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::PrTriage),
    );
    run_refresh(&mut screen).await;

    assert!(screen.on_swipe_right(&swipe(GestureKind::SwipeRight)));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::ReviewSubmitted { .. }))
        .await;

    let reviews = harness.code_host.reviews();
    assert_eq!(reviews[0].verdict, ReviewVerdict::Approve);
    assert_eq!(reviews[0].body, "Approved from DevDash.");
    assert_eq!(screen.notice(), Some("Approved #11"));
}

#[tokio::test]
async fn test_triage_without_pulls_lets_swipes_navigate() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = PrTriageScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::PrTriage),
    );
    run_refresh(&mut screen).await;

    assert!(!screen.on_swipe_left(&swipe(GestureKind::SwipeLeft)));
    assert!(!screen.on_swipe_right(&swipe(GestureKind::SwipeRight)));
    assert!(harness.code_host.reviews().is_empty());
}

#[tokio::test]
async fn test_triage_analysis_failure_offers_retry() {
    let cache = MockCache::new().with_pulls(vec![pull(REPO, 5, 1)]);
    let harness = Harness::with_cache(cache);
    harness.assistant.push_error(timeout_error());
    let mut channel = Channel::new();
    let mut screen = PrTriageScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::PrTriage),
    );
    run_refresh(&mut screen).await;
    screen.on_enter();

    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::PullInsight { .. }))
        .await;
    assert_eq!(screen.analysis(), &Analysis::Failed);

    screen.on_button(devdash::screens::pr_triage::TriageButton::RetryAnalysis);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::PullInsight { .. }))
        .await;
    assert!(matches!(screen.analysis(), Analysis::Ready(_)));
}

// ============================================================================
// CI diagnosis
// ============================================================================

#[tokio::test]
async fn test_ci_diagnoses_and_files_fix_issue() {
    let cache = MockCache::new().with_runs(vec![failed_run(REPO, 42)]);
    let harness = Harness::with_cache(cache);
    harness.code_host.set_run_log("Job: test - failure\n  Step: snapshots - FAILED");
    harness.assistant.push_reply(
        r#"{"diagnosis": "Snapshot mismatch", "fix": "Update snapshots", "caused_by": "abc123"}"#,
    );
    let mut channel = Channel::new();
    let mut screen = CiDiagnosisScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::CiDiagnosis),
    );

    run_refresh(&mut screen).await;
    assert_eq!(screen.status(), ScreenStatus::Error);
    assert!(matches!(screen.diagnosis(), Diagnosis::Streaming(_)));

    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Diagnosis { .. }))
        .await;
    let Diagnosis::Ready(diagnosis) = screen.diagnosis() else {
        panic!("expected a diagnosis, got {:?}", screen.diagnosis());
    };
    assert_eq!(diagnosis.fix, "Update snapshots");

    screen.on_button(CiButton::Fix);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::IssueOpened(_)))
        .await;

    let issues = harness.code_host.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].repo, REPO);
    assert_eq!(issues[0].title, "CI failure in build (run #42)");
    assert!(issues[0].body.contains("Snapshot mismatch"));
    assert!(issues[0].body.contains("Update snapshots"));
    assert_eq!(screen.notice(), Some("Opened issue #1"));
}

#[tokio::test]
async fn test_ci_stale_stream_does_not_leak_into_next_run() {
    let harness = Harness::new();
    harness.assistant.push_reply("OLDRUN OLDRUN OLDRUN");
    harness.assistant.push_reply("NEWRUN NEWRUN");
    let mut channel = Channel::new();
    let mut screen = CiDiagnosisScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::CiDiagnosis),
    );

    screen.apply(ScreenEvent::Runs(vec![failed_run(REPO, 1)]));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Delta { .. }))
        .await;
    assert_eq!(screen.diagnosis(), &Diagnosis::Streaming("OLDRUN ".to_string()));

    // Run 1 is fixed while its diagnosis is still streaming.
    screen.apply(ScreenEvent::Runs(vec![failed_run(REPO, 2)]));
    loop {
        let AppMessage::Screen { event, .. } = channel.next().await else {
            continue;
        };
        let finished = matches!(event, ScreenEvent::Diagnosis { run_id: 2, .. });
        screen.apply(event);
        if let Diagnosis::Streaming(buffer) = screen.diagnosis() {
            assert!(!buffer.contains("OLDRUN"), "stale text in {:?}", buffer);
        }
        if finished {
            break;
        }
    }

    let Diagnosis::Ready(diagnosis) = screen.diagnosis() else {
        panic!("expected a diagnosis, got {:?}", screen.diagnosis());
    };
    assert_eq!(diagnosis.diagnosis, "NEWRUN NEWRUN");
    assert_eq!(screen.current().map(|r| r.run_id), Some(2));
}

#[tokio::test]
async fn test_ci_all_passing() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = CiDiagnosisScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::CiDiagnosis),
    );

    run_refresh(&mut screen).await;

    assert!(screen.current().is_none());
    assert_eq!(screen.diagnosis(), &Diagnosis::None);
    assert_eq!(screen.status(), ScreenStatus::Success);
    assert!(harness.assistant.requests().is_empty());
}

// ============================================================================
// Standup
// ============================================================================

#[tokio::test]
async fn test_standup_generate_caches_today() {
    let harness = Harness::new();
    harness
        .assistant
        .push_reply("Yesterday: shipped retries\nToday: deploy widgets\nBlockers: none");
    let mut channel = Channel::new();
    let mut screen = StandupScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Standup),
    );

    screen.on_button(StandupButton::Generate);
    assert!(matches!(screen.state(), StandupState::Generating(_)));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::StandupGenerated(_)))
        .await;

    assert_eq!(screen.state(), &StandupState::Ready);
    assert_eq!(screen.lines().len(), 3);
    assert_eq!(harness.assistant.request_kinds(), vec!["standup"]);
    let saved = harness.cache.standups();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].date, chrono::Local::now().date_naive());
}

#[tokio::test]
async fn test_standup_scroll_is_clamped() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = StandupScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Standup),
    );
    let content = (1..=20)
        .map(|n| format!("line {}", n))
        .collect::<Vec<_>>()
        .join("\n");
    screen.apply(ScreenEvent::StandupGenerated(Ok(content)));

    let up = swipe(GestureKind::SwipeUp);
    let down = swipe(GestureKind::SwipeDown);

    screen.on_swipe_up(&up);
    assert_eq!(screen.scroll(), 3);
    for _ in 0..10 {
        screen.on_swipe_up(&up);
    }
    assert_eq!(screen.scroll(), 14);

    screen.on_swipe_down(&down);
    assert_eq!(screen.scroll(), 11);
    for _ in 0..10 {
        screen.on_swipe_down(&down);
    }
    assert_eq!(screen.scroll(), 0);
}

#[tokio::test]
async fn test_standup_copy_result_shows_notice() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = StandupScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Standup),
    );
    screen.apply(ScreenEvent::StandupGenerated(Ok("Today: ship".to_string())));
    assert!(screen.notice().is_none());

    screen.apply(ScreenEvent::StandupCopied(Err(
        "Copy failed, clipboard unavailable.".to_string(),
    )));
    assert_eq!(screen.notice(), Some("Copy failed, clipboard unavailable."));

    screen.apply(ScreenEvent::StandupCopied(Ok(())));
    assert_eq!(screen.notice(), Some("Copied to clipboard"));
}

#[tokio::test]
async fn test_standup_auto_generates_once_per_day() {
    let mut config = test_config();
    config.standup.schedule_hour = 0;
    let harness = Harness::build(config, MockCache::new(), MockVoice::unavailable());
    harness.assistant.push_error(timeout_error());
    let mut channel = Channel::new();
    let mut screen = StandupScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Standup),
    );

    assert!(screen.should_auto_generate(chrono::Local::now()));
    screen.apply(ScreenEvent::StandupLoaded(None));
    assert!(matches!(screen.state(), StandupState::Generating(_)));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::StandupGenerated(_)))
        .await;
    assert_eq!(screen.state(), &StandupState::Failed);

    // A later refresh the same day does not try again.
    screen.apply(ScreenEvent::StandupLoaded(None));
    assert_eq!(screen.state(), &StandupState::Failed);
    assert_eq!(harness.assistant.requests().len(), 1);
}

// ============================================================================
// Deploy
// ============================================================================

#[tokio::test]
async fn test_deploy_happy_path_drives_leds_and_melodies() {
    let harness = Harness::new();
    harness
        .assistant
        .push_reply(r#"{"confidence": 92, "risk": "low", "analysis": "Small and well tested."}"#);
    let mut channel = Channel::new();
    let mut screen = DeployScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Deploy),
    );

    screen.on_button(DeployButton::Analyze);
    assert_eq!(screen.state().name(), "analyzing");
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployAssessed(_)))
        .await;
    let DeployState::Ready(assessment) = screen.state() else {
        panic!("expected ready, got {:?}", screen.state());
    };
    assert_eq!(assessment.confidence, 92);
    assert_eq!(harness.peripherals.patterns().last().copied(), Some(LedPattern::BreatheGreen));

    screen.on_button(DeployButton::Confirm);
    assert_eq!(screen.state().name(), "deploying");
    assert!(harness.peripherals.patterns().contains(&LedPattern::BreatheBlue));
    assert_eq!(harness.peripherals.melodies(), vec![Melody::Deploy]);

    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployFinished(_)))
        .await;
    assert_eq!(screen.state(), &DeployState::Success);
    assert_eq!(harness.peripherals.patterns().last().copied(), Some(LedPattern::Celebration));
    assert_eq!(
        harness.peripherals.melodies(),
        vec![Melody::Deploy, Melody::Success]
    );

    let dispatches = harness.code_host.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].repo, REPO);
    assert_eq!(dispatches[0].workflow, "deploy.yml");
    assert_eq!(dispatches[0].git_ref, "main");
    assert_eq!(dispatches[0].inputs, json!({ "environment": "production" }));

    let saved = harness.cache.deploys();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].outcome, DeployOutcome::Success);
    assert_eq!(
        screen.last_deploy().map(|d| d.outcome),
        Some(DeployOutcome::Success)
    );

    screen.on_button(DeployButton::Back);
    assert_eq!(screen.state(), &DeployState::Idle);
    assert_eq!(harness.peripherals.patterns().last().copied(), Some(LedPattern::Off));
}

#[tokio::test]
async fn test_deploy_blocked_below_min_confidence() {
    let harness = Harness::new();
    harness
        .assistant
        .push_reply(r#"{"confidence": 40, "risk": "high", "analysis": "Two failing suites."}"#);
    let mut channel = Channel::new();
    let mut screen = DeployScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Deploy),
    );

    screen.on_button(DeployButton::Analyze);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployAssessed(_)))
        .await;
    assert_eq!(harness.peripherals.patterns().last().copied(), Some(LedPattern::BreatheRed));
    assert_eq!(screen.status(), ScreenStatus::Warning);

    screen.on_button(DeployButton::Confirm);

    assert_eq!(screen.state().name(), "ready");
    assert!(harness.peripherals.melodies().is_empty());
    assert!(harness.code_host.dispatches().is_empty());
}

#[tokio::test]
async fn test_deploy_failure_flashes_red() {
    let harness = Harness::new();
    harness
        .assistant
        .push_reply(r#"{"confidence": 85, "risk": "low", "analysis": "Fine."}"#);
    harness.code_host.set_fail_writes(true);
    let mut channel = Channel::new();
    let mut screen = DeployScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Deploy),
    );

    screen.on_button(DeployButton::Analyze);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployAssessed(_)))
        .await;
    screen.on_button(DeployButton::Confirm);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployFinished(_)))
        .await;

    assert_eq!(screen.state().name(), "failed");
    assert_eq!(screen.status(), ScreenStatus::Error);
    assert_eq!(harness.peripherals.patterns().last().copied(), Some(LedPattern::FlashRed));
    assert_eq!(
        harness.peripherals.melodies(),
        vec![Melody::Deploy, Melody::Error]
    );
    assert_eq!(harness.cache.deploys()[0].outcome, DeployOutcome::Failed);
}

#[tokio::test]
async fn test_deploy_analysis_failure_returns_to_idle() {
    let harness = Harness::new();
    harness.assistant.push_error(timeout_error());
    let mut channel = Channel::new();
    let mut screen = DeployScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Deploy),
    );

    screen.on_button(DeployButton::Analyze);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::DeployAssessed(_)))
        .await;

    assert_eq!(screen.state(), &DeployState::Idle);
}

#[tokio::test]
async fn test_deploy_hardware_button_listener_follows_screen() {
    let harness = Harness::new();
    let mut channel = Channel::new();
    let mut screen = DeployScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::Deploy),
    );

    screen.on_enter();
    assert!(harness.peripherals.has_listener());
    harness.services.peripherals.press_button();
    assert!(matches!(
        channel.next().await,
        AppMessage::ButtonPressed {
            screen: ScreenId::Deploy
        }
    ));

    screen.on_hardware_button();
    assert_eq!(screen.state().name(), "analyzing");

    screen.on_leave();
    assert!(!harness.peripherals.has_listener());
    assert_eq!(screen.state(), &DeployState::Idle);
}

// ============================================================================
// Context chat
// ============================================================================

#[tokio::test]
async fn test_chat_voice_question_is_answered() {
    let harness = Harness::build(
        test_config(),
        MockCache::new(),
        MockVoice::with_transcripts([Some("What's failing?")]),
    );
    harness.assistant.push_reply("Two tests in auth.");
    let mut channel = Channel::new();
    let mut screen = ContextChatScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::ContextChat),
        Instant::now(),
    );
    assert!(screen.voice_available());

    screen.on_button(ChatButton::Mic);
    assert_eq!(screen.state(), &ChatState::Listening);
    assert_eq!(screen.mood(), Mood::Listening);

    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Answer { .. }))
        .await;

    assert_eq!(
        screen.state(),
        &ChatState::Answered {
            question: "What's failing?".to_string(),
            answer: "Two tests in auth.".to_string(),
        }
    );
    assert_eq!(screen.mood(), Mood::Happy);
    assert_eq!(harness.assistant.request_kinds(), vec!["ask"]);
}

#[tokio::test]
async fn test_chat_failed_answer() {
    let harness = Harness::new();
    harness.assistant.push_error(timeout_error());
    let mut channel = Channel::new();
    let mut screen = ContextChatScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::ContextChat),
        Instant::now(),
    );

    screen.on_button(ChatButton::Question(0));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Answer { .. }))
        .await;

    assert_eq!(
        screen.state(),
        &ChatState::Failed {
            question: QUICK_QUESTIONS[0].to_string()
        }
    );
    assert_eq!(screen.status(), ScreenStatus::Warning);

    screen.on_button(ChatButton::Back);
    assert_eq!(screen.state(), &ChatState::Questions);
}

#[tokio::test]
async fn test_chat_retry_reasks_spoken_question() {
    let harness = Harness::build(
        test_config(),
        MockCache::new(),
        MockVoice::with_transcripts([Some("Who touched billing?")]),
    );
    harness.assistant.push_error(timeout_error());
    harness.assistant.push_reply("Mona, yesterday.");
    let mut channel = Channel::new();
    let mut screen = ContextChatScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::ContextChat),
        Instant::now(),
    );

    screen.on_button(ChatButton::Mic);
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Answer { .. }))
        .await;
    assert!(matches!(screen.state(), ChatState::Failed { .. }));

    screen.on_button(ChatButton::Retry);
    assert!(matches!(
        screen.state(),
        ChatState::Asking { question, .. } if question == "Who touched billing?"
    ));
    channel
        .pump(&mut screen, |e| matches!(e, ScreenEvent::Answer { .. }))
        .await;

    assert_eq!(
        screen.state(),
        &ChatState::Answered {
            question: "Who touched billing?".to_string(),
            answer: "Mona, yesterday.".to_string(),
        }
    );
    assert_eq!(harness.assistant.request_kinds(), vec!["ask", "ask"]);
}

#[tokio::test]
async fn test_chat_answer_from_abandoned_question_is_ignored() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = ContextChatScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::ContextChat),
        Instant::now(),
    );

    screen.on_button(ChatButton::Question(0));
    screen.on_button(ChatButton::Back);
    screen.on_button(ChatButton::Question(1));

    // The first question was asked on stream 1.
    screen.apply(ScreenEvent::Delta {
        stream: 1,
        text: "old".to_string(),
    });
    screen.apply(ScreenEvent::Answer {
        stream: 1,
        result: Ok("old answer".to_string()),
    });

    assert_eq!(
        screen.state(),
        &ChatState::Asking {
            question: QUICK_QUESTIONS[1].to_string(),
            streamed: String::new(),
        }
    );
}

#[tokio::test]
async fn test_chat_mic_without_voice_is_ignored() {
    let harness = Harness::new();
    let channel = Channel::new();
    let mut screen = ContextChatScreen::new(
        harness.services.clone(),
        channel.hub.for_screen(ScreenId::ContextChat),
        Instant::now(),
    );

    screen.on_button(ChatButton::Mic);

    assert!(!screen.voice_available());
    assert_eq!(screen.state(), &ChatState::Questions);
}
