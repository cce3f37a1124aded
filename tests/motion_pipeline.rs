//! モーションパイプライン統合テスト
//!
//! エンジン・パイプライン・モックシンクを実スレッド構成で結合し、
//! dwellクリック、キー由来のスワイプ、自動待機と顔検出による復帰を
//! エンドツーエンドで検証する。

use std::thread;
use std::time::Duration;

use facepointer::application::key_binding::KeyClickBinder;
use facepointer::application::pipeline::MotionPipeline;
use facepointer::application::runtime_state::ForcedClickLatch;
use facepointer::application::threads::{Engine, EngineHandle};
use facepointer::domain::config::AppConfig;
use facepointer::domain::ports::NullListener;
use facepointer::domain::types::{monotonic_ms, DispatchAction, EngineState, MotionSample};
use facepointer::infrastructure::mock_sink::{RecordingActionSink, SinkCall};
use facepointer::infrastructure::mock_source::MockFrameSource;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.screen.width = 1000;
    config.screen.height = 800;
    config.pointer.sensitivity = 1.0;
    config.pointer.acceleration = 1.0;
    config.click.dwell_ms = 500;
    config.standby.timeout_ms = 1000;
    config.standby.wake_yield_ms = 10;
    config
}

fn sample(dx: f32, dy: f32, face: bool, t: u64) -> MotionSample {
    MotionSample {
        dx,
        dy,
        face_detected: face,
        timestamp_ms: t,
    }
}

fn wait_for_state(handle: &EngineHandle, expected: EngineState) {
    for _ in 0..200 {
        if handle.state() == expected && !handle.is_waiting() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("engine did not reach {}", expected.as_str());
}

fn running_engine(config: &AppConfig) -> (Engine, EngineHandle) {
    let (source, _controller) = MockFrameSource::new();
    let engine = Engine::init(source, NullListener, config).unwrap();
    let handle = engine.handle();
    handle.start().unwrap();
    wait_for_state(&handle, EngineState::Running);
    (engine, handle)
}

#[test]
fn test_dwell_reclicks_after_another_period() {
    let config = test_config();
    let (_engine, handle) = running_engine(&config);

    let (sink, controller) = RecordingActionSink::new();
    let log = controller.call_log();
    let mut pipeline = MotionPipeline::new(handle, sink, ForcedClickLatch::new(), &config);

    // 2×dwell時間静止 → ちょうど2回クリック
    let base = monotonic_ms();
    for i in 0..=40 {
        pipeline.process_sample(sample(0.0, 0.0, true, base + i * 25));
    }
    let calls = log.lock().unwrap();
    let clicks = calls
        .iter()
        .filter(|c| matches!(c, SinkCall::Click { .. }))
        .count();
    assert_eq!(clicks, 2);
}

#[test]
fn test_key_swipe_end_to_end() {
    let config = test_config();
    let (_engine, handle) = running_engine(&config);

    let (sink, controller) = RecordingActionSink::new();
    let log = controller.call_log();
    let latch = ForcedClickLatch::new();
    let mut binder = KeyClickBinder::new(&config.click, latch.clone());
    let mut pipeline = MotionPipeline::new(handle, sink, latch, &config);

    let base = monotonic_ms();

    // キー長押し → スワイプ起点
    binder.on_key_down(base);
    binder.on_key_up(base + config.click.long_press_ms + 10);
    let outcome = pipeline
        .process_sample(sample(0.0, 0.0, true, base))
        .unwrap();
    assert!(matches!(outcome.action, DispatchAction::GestureArmed(_)));
    let first = outcome.location;

    // ポインタ移動
    for i in 1..=10 {
        pipeline.process_sample(sample(10.0, 0.0, true, base + i * 25));
    }

    // キー長押し → スワイプ終点・確定
    binder.on_key_down(base + 500);
    binder.on_key_up(base + 500 + config.click.long_press_ms + 10);
    let outcome = pipeline
        .process_sample(sample(0.0, 0.0, true, base + 1000))
        .unwrap();
    assert!(matches!(outcome.action, DispatchAction::GestureCommitted(_)));

    // スワイプ1回のみ、クリックは発生しない
    let calls = log.lock().unwrap();
    assert_eq!(calls.len(), 1);
    match calls[0] {
        SinkCall::Swipe { from, to } => {
            assert_eq!(from, first);
            assert_ne!(from, to);
        }
        other => panic!("expected swipe, got {:?}", other),
    }
}

#[test]
fn test_standby_and_wake_cycle() {
    let config = test_config();
    let (_engine, handle) = running_engine(&config);

    let (sink, _controller) = RecordingActionSink::new();
    let mut pipeline =
        MotionPipeline::new(handle.clone(), sink, ForcedClickLatch::new(), &config);

    // 顔検出フレームでカウントダウンを既知の時刻に合わせる
    let base = monotonic_ms();
    pipeline.process_sample(sample(0.0, 0.0, true, base));

    // タイムアウト超過の未検出フレーム → STANDBY要求
    for i in 0..30 {
        pipeline.process_sample(sample(0.0, 0.0, false, base + 1100 + i * 25));
        if handle.state() == EngineState::Standby {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    wait_for_state(&handle, EngineState::Standby);

    // 待機中、顔のないフレームでは何も起きない
    pipeline.process_sample(sample(0.0, 0.0, false, base + 3000));
    assert_eq!(handle.state(), EngineState::Standby);

    // 顔を再検出 → RESUME要求 → RUNNING
    for i in 0..30 {
        pipeline.process_sample(sample(0.0, 0.0, true, base + 3100 + i * 25));
        if handle.state() == EngineState::Running {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    wait_for_state(&handle, EngineState::Running);
}

#[test]
fn test_pointer_frozen_while_paused() {
    let config = test_config();
    let (_engine, handle) = running_engine(&config);

    let (sink, _controller) = RecordingActionSink::new();
    let mut pipeline =
        MotionPipeline::new(handle.clone(), sink, ForcedClickLatch::new(), &config);

    let base = monotonic_ms();
    let outcome = pipeline
        .process_sample(sample(0.0, 0.0, true, base))
        .unwrap();
    let location = outcome.location;

    handle.pause().unwrap();
    wait_for_state(&handle, EngineState::Paused);

    // 一時停止中のフレームは処理されない
    assert!(pipeline
        .process_sample(sample(50.0, 50.0, true, base + 100))
        .is_none());

    handle.resume().unwrap();
    wait_for_state(&handle, EngineState::Running);

    // 再開後もポインタ位置は維持されている
    let outcome = pipeline
        .process_sample(sample(0.0, 0.0, true, base + 200))
        .unwrap();
    assert_eq!(outcome.location, location);
}
