//! End-to-end tests driving a full session runtime through its handle, with
//! scripted backends and paused time for deterministic delays.

use intervox_capture::recognizers::{ScriptStep, ScriptedRecognizer};
use intervox_foundation::{test_clock, SessionError, SessionPhase, TestClock};
use intervox_gateway::{
    GatewayCall, GatewayError, ScriptedGateway, ScriptedOutcome, DEFAULT_GREETING,
};
use intervox_playback::synthesizers::{ScriptedSynthesizer, SynthesizerLog};
use intervox_proctor::{EnvSignal, SignalSource};
use intervox_session::runtime::{self, SessionCapabilities, SessionRuntime};
use intervox_session::{SessionEvent, SessionHandle, Settings};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

struct TestSession {
    runtime: SessionRuntime,
    handle: SessionHandle,
    events: broadcast::Receiver<SessionEvent>,
    gateway: Arc<ScriptedGateway>,
    speech: Arc<Mutex<SynthesizerLog>>,
    clock: Arc<TestClock>,
    completions: Arc<AtomicUsize>,
}

fn launch() -> TestSession {
    launch_with(ScriptedRecognizer::silent())
}

fn launch_with(recognizer: ScriptedRecognizer) -> TestSession {
    let gateway = Arc::new(ScriptedGateway::new());
    let synthesizer = ScriptedSynthesizer::new();
    let speech = synthesizer.log_handle();
    let clock = test_clock();
    let completions = Arc::new(AtomicUsize::new(0));
    let completion_count = completions.clone();
    let runtime = runtime::start(
        "sess-test",
        &Settings::default(),
        SessionCapabilities {
            recognizer,
            synthesizer: Box::new(synthesizer),
            gateway: gateway.clone(),
            clock: clock.clone(),
            on_complete: Some(Box::new(move || {
                completion_count.fetch_add(1, Ordering::SeqCst);
            })),
        },
    );
    let handle = runtime.handle();
    let events = handle.subscribe();
    TestSession {
        runtime,
        handle,
        events,
        gateway,
        speech,
        clock,
        completions,
    }
}

async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("no session event before timeout")
        .expect("event channel closed")
}

fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test(start_paused = true)]
async fn start_speaks_greeting_then_first_question() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hello and welcome.",
            "Tell me about yourself.",
        )));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    // The greeting is spoken right away; the question waits out the pause.
    assert_eq!(session.speech.lock().spoken(), vec!["Hello and welcome."]);

    time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(
        session.speech.lock().spoken(),
        vec!["Hello and welcome.", "Tell me about yourself."]
    );

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(snapshot.greeting, "Hello and welcome.");
    assert_eq!(snapshot.question, "Tell me about yourself.");
    assert_eq!(snapshot.question_index, 0);

    session.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn missing_server_greeting_falls_back_to_default() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "",
            "First question",
        )));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    assert_eq!(session.speech.lock().spoken(), vec![DEFAULT_GREETING]);
    assert_eq!(session.handle.snapshot().greeting, DEFAULT_GREETING);
}

#[tokio::test(start_paused = true)]
async fn question_index_counts_each_accepted_answer() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    for text in ["Q2", "Q3", "Q4"] {
        session
            .gateway
            .push_next(ScriptedOutcome::Respond(ScriptedGateway::question(text)));
    }

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    for (index, answer) in ["answer one", "answer two", "answer three"].iter().enumerate() {
        session.handle.submit_answer(answer).await;
        assert_eq!(
            next_event(&mut session.events).await,
            SessionEvent::QuestionAdvanced {
                question_index: index as u32 + 1
            }
        );
    }

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.question_index, 3);
    assert_eq!(snapshot.question, "Q4");
    // Accepted answers leave the buffer empty for the next question.
    assert_eq!(snapshot.answer_text, "");
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);

    let answers: Vec<String> = session
        .gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::Next { answer, .. } => Some(answer),
            _ => None,
        })
        .collect();
    assert_eq!(answers, vec!["answer one", "answer two", "answer three"]);
}

#[tokio::test(start_paused = true)]
async fn blank_answers_are_not_submitted() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));

    // Submitting before the session starts is ignored.
    session.handle.submit_answer("early answer").await;
    time::sleep(Duration::from_millis(10)).await;

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.submit_answer("   ").await;
    time::sleep(Duration::from_millis(10)).await;

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);
    assert!(!snapshot.is_loading());
    assert_eq!(
        session.gateway.calls(),
        vec![GatewayCall::Start {
            session_id: "sess-test".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn completion_sentinel_finishes_the_interview() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Welcome.",
            "Only question",
        )));
    session
        .gateway
        .push_next(ScriptedOutcome::Respond(ScriptedGateway::completion()));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    // Two minutes and ten seconds of interview, rounded to two minutes.
    session.clock.advance(Duration::from_secs(130));
    session.handle.submit_answer("final answer").await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Completed);
    time::sleep(Duration::from_millis(10)).await;

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert_eq!(snapshot.question_index, 0);
    assert_eq!(snapshot.question, "Only question");
    assert!(!snapshot.is_loading());
    assert_eq!(session.completions.load(Ordering::SeqCst), 1);

    let metrics: Vec<_> = session
        .gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::SecurityMetrics(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].session_id, "sess-test");
    assert_eq!(metrics[0].tab_switch_count, 0);
    assert!(!metrics[0].fullscreen_used);
    assert_eq!(metrics[0].interview_duration_minutes, 2);

    // Post-completion submissions are ignored.
    let calls_before = session.gateway.calls().len();
    session.handle.submit_answer("extra").await;
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.gateway.calls().len(), calls_before);
}

#[tokio::test(start_paused = true)]
async fn timeout_keeps_answer_for_identical_resubmission() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    session.gateway.push_next(ScriptedOutcome::Hang);
    session
        .gateway
        .push_next(ScriptedOutcome::Respond(ScriptedGateway::question("Q2")));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.submit_answer("my answer").await;
    time::sleep(Duration::from_millis(10)).await;
    assert!(session.handle.snapshot().is_loading());

    // The hung request loses the race against the local deadline.
    time::sleep(Duration::from_secs(61)).await;
    match next_event(&mut session.events).await {
        SessionEvent::SubmitFailed {
            error: SessionError::TimeoutFailure { elapsed },
        } => assert!(elapsed >= Duration::from_secs(60)),
        other => panic!("expected timeout failure, got {:?}", other),
    }

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(snapshot.answer_text, "my answer");
    assert!(matches!(
        snapshot.last_error,
        Some(SessionError::TimeoutFailure { .. })
    ));

    // The kept answer can be resubmitted unchanged.
    session.handle.submit_answer("my answer").await;
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::QuestionAdvanced { question_index: 1 }
    );

    let answers: Vec<String> = session
        .gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::Next { answer, .. } => Some(answer),
            _ => None,
        })
        .collect();
    assert_eq!(answers, vec!["my answer", "my answer"]);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_surfaces_and_preserves_answer() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    session
        .gateway
        .push_next(ScriptedOutcome::Fail(GatewayError::Status {
            status: 500,
            body: "backend exploded".to_string(),
        }));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.submit_answer("my answer").await;
    match next_event(&mut session.events).await {
        SessionEvent::SubmitFailed {
            error: SessionError::TransportFailure(message),
        } => {
            assert!(message.contains("500"));
            assert!(message.contains("backend exploded"));
        }
        other => panic!("expected transport failure, got {:?}", other),
    }

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(snapshot.answer_text, "my answer");
}

#[tokio::test(start_paused = true)]
async fn failed_start_allows_retry() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Fail(GatewayError::Transport(
            "connection refused".to_string(),
        )));

    session.handle.start().await;
    match next_event(&mut session.events).await {
        SessionEvent::StartFailed {
            error: SessionError::StartFailure(message),
        } => assert!(message.contains("connection refused")),
        other => panic!("expected start failure, got {:?}", other),
    }
    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.last_error.is_some());

    // The session is idle again and a retry goes through.
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);
    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingAnswer);
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test(start_paused = true)]
async fn start_is_ignored_while_already_running() {
    let mut session = launch();
    session.gateway.push_start(ScriptedOutcome::RespondAfter(
        Duration::from_millis(500),
        ScriptedGateway::opening("Hi.", "Q1"),
    ));

    session.handle.start().await;
    time::sleep(Duration::from_millis(10)).await;
    // Second press while the first start is still in flight.
    session.handle.start().await;
    time::sleep(Duration::from_millis(600)).await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    // And another once the session is running.
    session.handle.start().await;
    time::sleep(Duration::from_millis(10)).await;

    let starts = session
        .gateway
        .calls()
        .into_iter()
        .filter(|call| matches!(call, GatewayCall::Start { .. }))
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test(start_paused = true)]
async fn tab_switches_count_only_during_active_session() {
    let mut session = launch();
    let signals = session.runtime.env_signal_sender();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));

    // A departure before the session starts is observed but not counted.
    signals
        .send(EnvSignal::Visibility {
            hidden: true,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    signals
        .send(EnvSignal::Visibility {
            hidden: false,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.handle.snapshot().tab_switch_count, 0);

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    // One real departure, reported by two listeners.
    signals
        .send(EnvSignal::Visibility {
            hidden: true,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    signals
        .send(EnvSignal::Visibility {
            hidden: true,
            source: SignalSource::WebkitPrefixed,
        })
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::TabSwitchWarning { count: 1 }
    );

    signals
        .send(EnvSignal::Visibility {
            hidden: false,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    signals
        .send(EnvSignal::Visibility {
            hidden: true,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::TabSwitchWarning { count: 2 }
    );
    time::sleep(Duration::from_millis(10)).await;

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.tab_switch_count, 2);
    assert!(snapshot.tab_switch_warning);

    // Dismissing clears the warning flag but not the tally.
    session.handle.dismiss_warning().await;
    time::sleep(Duration::from_millis(10)).await;
    let snapshot = session.handle.snapshot();
    assert!(!snapshot.tab_switch_warning);
    assert_eq!(snapshot.tab_switch_count, 2);

    let reports: Vec<u32> = session
        .gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::TabSwitch { count } => Some(count),
            _ => None,
        })
        .collect();
    assert_eq!(reports, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn fullscreen_use_is_sticky_and_reported() {
    let mut session = launch();
    let signals = session.runtime.env_signal_sender();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    session
        .gateway
        .push_next(ScriptedOutcome::Respond(ScriptedGateway::completion()));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    signals
        .send(EnvSignal::Fullscreen {
            active: true,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    signals
        .send(EnvSignal::Fullscreen {
            active: false,
            source: SignalSource::Standard,
        })
        .await
        .unwrap();
    time::sleep(Duration::from_millis(10)).await;
    // Leaving fullscreen again does not clear the flag.
    assert!(session.handle.snapshot().fullscreen_used);

    session.handle.submit_answer("done").await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Completed);
    time::sleep(Duration::from_millis(10)).await;

    let metrics: Vec<_> = session
        .gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::SecurityMetrics(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(metrics.len(), 1);
    assert!(metrics[0].fullscreen_used);
}

#[tokio::test(start_paused = true)]
async fn voice_transcript_replaces_typed_draft() {
    let mut session = launch_with(ScriptedRecognizer::with_script(vec![
        ScriptStep::result_after(Duration::from_millis(100), "spoken instead"),
    ]));
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.replace_voice_text("typed draft").await;
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.handle.snapshot().answer_text, "typed draft");

    session.handle.start_listening().await;
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::ListeningChanged { listening: true }
    );

    time::sleep(Duration::from_millis(150)).await;
    session.handle.stop_listening().await;
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::ListeningChanged { listening: false }
    );

    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.answer_text, "spoken instead");
    assert!(!snapshot.is_listening);
}

#[tokio::test(start_paused = true)]
async fn second_mic_press_appends_instead_of_replacing() {
    let recognizer = ScriptedRecognizer::with_script(vec![ScriptStep::result_after(
        Duration::from_millis(100),
        "and the spoken part",
    )]);
    let starts = recognizer.start_count_handle();
    let mut session = launch_with(recognizer);
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.replace_voice_text("typed part").await;
    session.handle.start_listening().await;
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::ListeningChanged { listening: true }
    );

    // Pressing the mic again while live must not restart the capture.
    session.handle.start_listening().await;
    time::sleep(Duration::from_millis(150)).await;
    session.handle.stop_listening().await;
    assert_eq!(
        next_event(&mut session.events).await,
        SessionEvent::ListeningChanged { listening: false }
    );

    assert_eq!(
        session.handle.snapshot().answer_text,
        "typed part and the spoken part"
    );
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_discards_inflight_turn_and_resets() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi.", "Q1",
        )));
    session.gateway.push_next(ScriptedOutcome::RespondAfter(
        Duration::from_secs(10),
        ScriptedGateway::question("Q2"),
    ));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);

    session.handle.submit_answer("slow answer").await;
    time::sleep(Duration::from_millis(10)).await;
    assert!(session.handle.snapshot().is_loading());

    session.handle.stop().await;
    time::sleep(Duration::from_millis(10)).await;
    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.question, "");
    assert_eq!(snapshot.answer_text, "");
    assert_eq!(snapshot.question_index, 0);

    // The late result lands after the stop and must be discarded.
    time::sleep(Duration::from_secs(11)).await;
    let snapshot = session.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.question, "");
    let drained = drain_events(&mut session.events);
    assert!(!drained
        .iter()
        .any(|event| matches!(event, SessionEvent::QuestionAdvanced { .. })));

    // A fresh start still works after the reset.
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hi again.",
            "Q1 again",
        )));
    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);
    assert_eq!(session.handle.snapshot().question, "Q1 again");
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_question_speech() {
    let mut session = launch();
    session
        .gateway
        .push_start(ScriptedOutcome::Respond(ScriptedGateway::opening(
            "Hello there.",
            "Q1",
        )));

    session.handle.start().await;
    assert_eq!(next_event(&mut session.events).await, SessionEvent::Started);
    assert_eq!(session.speech.lock().spoken(), vec!["Hello there."]);

    session.handle.stop().await;
    // Wait past the greeting pause; the scheduled question must not play.
    time::sleep(Duration::from_secs(4)).await;
    assert_eq!(session.speech.lock().spoken(), vec!["Hello there."]);
    assert_eq!(session.handle.snapshot().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn commands_after_shutdown_are_dropped() {
    let session = launch();
    session.runtime.shutdown().await;
    // The controller is gone; commands are dropped without panicking.
    session.handle.start().await;
    session.handle.submit_answer("too late").await;
}
