//! モーション→アクション パイプライン
//!
//! キャプチャスレッド上でフレームごとに1回呼ばれ、モーションサンプルを
//! ポインタ移動・dwellクリック・ジェスチャーへ変換する。
//! エンジンへの自動遷移（待機・復帰）の要求もここから発行される。

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::application::dwell::DwellClick;
use crate::application::gesture::GestureRecognizer;
use crate::application::pointer::PointerControl;
use crate::application::runtime_state::ForcedClickLatch;
use crate::application::stats::PipelineStats;
use crate::application::threads::EngineHandle;
use crate::domain::config::AppConfig;
use crate::domain::ports::AccessibilityActionSink;
use crate::domain::types::{
    ClickHint, DispatchAction, EngineState, FrameOutcome, MotionSample,
};

/// フレーム処理パイプライン（キャプチャスレッド専用）
///
/// エンジン状態はEngineSnapshot経由でロックフリーに読み取り、
/// 状態遷移の要求はコマンドチャネルへ送信するだけでブロックしない
/// （例外は待機復帰時の有界スリープのみ）。
pub struct MotionPipeline<A: AccessibilityActionSink> {
    engine: EngineHandle,
    pointer: PointerControl,
    dwell: DwellClick,
    gestures: GestureRecognizer<A>,
    forced_click: ForcedClickLatch,
    stats: PipelineStats,
    wake_yield: Duration,
    click_enabled: bool,
    dwell_enabled: bool,
    /// 休息モード: dwellクリックのみ抑止し、ポインタ移動は維持する
    resting_mode: bool,
    /// 自動遷移の一回限りガード（状態変化・顔検出でリセット）
    standby_requested: bool,
    wake_requested: bool,
    last_state: EngineState,
}

impl<A: AccessibilityActionSink> MotionPipeline<A> {
    pub fn new(
        engine: EngineHandle,
        sink: A,
        forced_click: ForcedClickLatch,
        config: &AppConfig,
    ) -> Self {
        let device = engine.device();
        let pointer = PointerControl::new(
            &config.pointer,
            &config.screen,
            device.rotation_degrees,
            device.flip,
        );
        Self {
            engine,
            pointer,
            dwell: DwellClick::new(&config.click),
            gestures: GestureRecognizer::new(sink),
            forced_click,
            stats: PipelineStats::new(&config.stats),
            wake_yield: config.standby.wake_yield(),
            click_enabled: config.click.click_enabled,
            dwell_enabled: config.click.dwell_enabled,
            resting_mode: false,
            standby_requested: false,
            wake_requested: false,
            last_state: EngineState::Disabled,
        }
    }

    /// ポインタ移動の有効/無効
    #[allow(dead_code)]
    pub fn set_pointer_enabled(&mut self, enabled: bool) {
        self.pointer.set_enabled(enabled);
    }

    /// クリック機能全体の有効/無効
    pub fn set_click_enabled(&mut self, enabled: bool) {
        if self.click_enabled != enabled {
            info!(enabled, "Click dispatch toggled");
        }
        self.click_enabled = enabled;
        if !enabled {
            self.dwell.reset();
        }
    }

    /// dwellクリックの有効/無効（キー由来の強制クリックは影響を受けない）
    #[allow(dead_code)]
    pub fn set_dwell_enabled(&mut self, enabled: bool) {
        self.dwell_enabled = enabled;
        if !enabled {
            self.dwell.reset();
        }
    }

    /// 休息モードの切り替え
    #[allow(dead_code)]
    pub fn set_resting_mode(&mut self, resting: bool) {
        if self.resting_mode != resting {
            info!(resting, "Resting mode toggled");
        }
        self.resting_mode = resting;
        if resting {
            self.dwell.reset();
        }
    }

    /// 1フレーム分のモーションサンプルを処理する
    ///
    /// # Returns
    /// - `Some(FrameOutcome)`: RUNNING中の処理結果（オーバーレイ描画用）
    /// - `None`: このフレームでは何も処理しなかった
    pub fn process_sample(&mut self, sample: MotionSample) -> Option<FrameOutcome> {
        let state = self.engine.state();
        if state != self.last_state {
            // エピソード境界: 自動遷移ガードと静止判定をやり直す
            self.standby_requested = false;
            self.wake_requested = false;
            self.dwell.reset();
            if state == EngineState::Running && self.last_state != EngineState::Paused {
                // 新しいエピソード: ポインタを中央へ戻し、進行中ジェスチャーを破棄
                self.pointer.reset();
                self.gestures.reset();
            }
            self.last_state = state;
        }

        // 未初期化・停止中・非同期操作の完了待ち中はフレームを破棄する
        if matches!(state, EngineState::Disabled | EngineState::Stopped)
            || self.engine.is_waiting()
        {
            return None;
        }

        self.stats.record_frame(sample.face_detected);

        if sample.face_detected {
            self.engine.countdown().restart(sample.timestamp_ms);
            self.standby_requested = false;
        }

        match state {
            EngineState::Standby => {
                if sample.face_detected && !self.wake_requested {
                    self.wake_requested = true;
                    debug!("Face detected in standby: requesting resume");
                    let _ = self.engine.resume();
                    // コマンドスレッドがresumeを処理する猶予（有界）
                    thread::sleep(self.wake_yield);
                }
                None
            }
            EngineState::Paused => None,
            EngineState::Running => Some(self.process_running(sample)),
            _ => None,
        }
    }

    /// RUNNING状態の本処理: ポインタ統合→クリック合成→ディスパッチ
    fn process_running(&mut self, sample: MotionSample) -> FrameOutcome {
        let location = self.pointer.update_motion(sample.dx, sample.dy);
        self.gestures.refresh();

        // クリック信号の合成。キー由来の強制クリックはdwellを迂回し、
        // フレームごとに一度だけ消費される
        let hint = self.forced_click.take();
        let dwell_eligible = self.click_enabled
            && self.dwell_enabled
            && !self.resting_mode
            && self.gestures.is_actionable(location);

        let click = if hint != ClickHint::None && self.click_enabled {
            self.dwell.reset();
            true
        } else if dwell_eligible {
            self.dwell.update(location, sample.timestamp_ms)
        } else {
            self.dwell.reset();
            false
        };

        let action = self.gestures.dispatch(location, click, hint);
        match action {
            DispatchAction::SimpleClick => self.stats.record_click(),
            DispatchAction::GestureCommitted(_) => self.stats.record_gesture(),
            _ => {}
        }

        // 顔未検出タイムアウト → 自動待機（エピソードごとに一度だけ要求）
        if !self.standby_requested
            && self.engine.countdown().has_finished(sample.timestamp_ms)
        {
            self.standby_requested = true;
            debug!("Face detection timed out: requesting standby");
            let _ = self.engine.standby();
        }

        if self.stats.should_report() {
            self.stats.report_and_reset();
        }

        FrameOutcome {
            location,
            action,
            click_progress_percent: if dwell_eligible {
                self.dwell.progress_percent(sample.timestamp_ms)
            } else {
                0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::threads::Engine;
    use crate::domain::ports::NullListener;
    use crate::domain::types::GestureKind;
    use crate::infrastructure::mock_sink::{RecordingActionSink, SinkCall};
    use crate::infrastructure::mock_source::MockFrameSource;

    fn sample(dx: f32, dy: f32, face: bool, t: u64) -> MotionSample {
        MotionSample {
            dx,
            dy,
            face_detected: face,
            timestamp_ms: t,
        }
    }

    fn running_engine(config: &AppConfig) -> (Engine, EngineHandle) {
        let (source, _controller) = MockFrameSource::new();
        let engine = Engine::init(source, NullListener, config).unwrap();
        let handle = engine.handle();
        handle.start().unwrap();
        for _ in 0..100 {
            if handle.state() == EngineState::Running && !handle.is_waiting() {
                return (engine, handle);
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("engine did not reach RUNNING");
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.screen.width = 1000;
        config.screen.height = 800;
        config.pointer.sensitivity = 1.0;
        config.pointer.acceleration = 1.0;
        config.click.dwell_ms = 1000;
        config.standby.timeout_ms = 5000;
        config.standby.wake_yield_ms = 1;
        config
    }

    #[test]
    fn test_frames_dropped_when_stopped() {
        let config = test_config();
        let (source, _controller) = MockFrameSource::new();
        let _engine = Engine::init(source, NullListener, &config).unwrap();
        let handle = _engine.handle();

        let (sink, _controller) = RecordingActionSink::new();
        let mut pipeline =
            MotionPipeline::new(handle, sink, ForcedClickLatch::new(), &config);

        // Stoppedのままフレームを流しても何も起きない
        assert!(pipeline.process_sample(sample(10.0, 0.0, true, 0)).is_none());
    }

    #[test]
    fn test_dwell_click_fires_in_running() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, controller) = RecordingActionSink::new();
        let log = controller.call_log();
        let mut pipeline =
            MotionPipeline::new(handle, sink, ForcedClickLatch::new(), &config);

        // 静止したままdwell時間を経過させる
        let mut clicked = 0;
        for t in (0..=1200).step_by(50) {
            if let Some(outcome) = pipeline.process_sample(sample(0.0, 0.0, true, t)) {
                if outcome.action == DispatchAction::SimpleClick {
                    clicked += 1;
                }
            }
        }
        assert_eq!(clicked, 1);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_forced_click_bypasses_dwell() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, controller) = RecordingActionSink::new();
        let log = controller.call_log();
        let latch = ForcedClickLatch::new();
        let mut pipeline = MotionPipeline::new(handle, sink, latch.clone(), &config);

        pipeline.process_sample(sample(0.0, 0.0, true, 0));
        latch.post_click();
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 50)).unwrap();
        assert_eq!(outcome.action, DispatchAction::SimpleClick);

        // 消費済み: 次のフレームでは発火しない
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 100)).unwrap();
        assert_eq!(outcome.action, DispatchAction::Unset);

        let calls = log.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            calls[0],
            SinkCall::Click {
                via_hardware_key: true,
                ..
            }
        ));
    }

    #[test]
    fn test_resting_mode_suppresses_dwell_only() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, controller) = RecordingActionSink::new();
        let log = controller.call_log();
        let latch = ForcedClickLatch::new();
        let mut pipeline = MotionPipeline::new(handle, sink, latch.clone(), &config);
        pipeline.set_resting_mode(true);

        // dwellは発火しない
        for t in (0..=2000).step_by(50) {
            let outcome = pipeline.process_sample(sample(0.0, 0.0, true, t)).unwrap();
            assert_ne!(outcome.action, DispatchAction::SimpleClick);
        }
        // ポインタ移動は生きている
        let before = pipeline.process_sample(sample(0.0, 0.0, true, 2050)).unwrap();
        let after = pipeline.process_sample(sample(5.0, 0.0, true, 2100)).unwrap();
        assert_ne!(before.location, after.location);

        // キー由来の強制クリックは通る
        latch.post_click();
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 2150)).unwrap();
        assert_eq!(outcome.action, DispatchAction::SimpleClick);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dwell_requires_actionable_target() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, controller) = RecordingActionSink::new();
        controller.set_actionable(false);
        let log = controller.call_log();
        let mut pipeline =
            MotionPipeline::new(handle, sink, ForcedClickLatch::new(), &config);

        for t in (0..=2000).step_by(50) {
            let outcome = pipeline.process_sample(sample(0.0, 0.0, true, t)).unwrap();
            assert_ne!(outcome.action, DispatchAction::SimpleClick);
            assert_eq!(outcome.click_progress_percent, 0);
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_progress_percent_reported() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, _controller) = RecordingActionSink::new();
        let mut pipeline =
            MotionPipeline::new(handle, sink, ForcedClickLatch::new(), &config);

        pipeline.process_sample(sample(0.0, 0.0, true, 0));
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 500)).unwrap();
        assert_eq!(outcome.click_progress_percent, 50);
    }

    #[test]
    fn test_zoom_commit_end_to_end() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, controller) = RecordingActionSink::new();
        let log = controller.call_log();
        let latch = ForcedClickLatch::new();
        let mut pipeline = MotionPipeline::new(handle, sink, latch.clone(), &config);

        // 初回フレームのエピソード初期化でシンクのフラグが消えるため、
        // アームは最初のフレームの後に行う
        pipeline.process_sample(sample(0.0, 0.0, true, 0));
        controller.arm_zoom_in();

        // キー由来クリックで1点目のアンカーを取得
        latch.post_click();
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 50)).unwrap();
        assert_eq!(outcome.action, DispatchAction::GestureArmed(GestureKind::ZoomIn));

        // 2点目へ移動してから確定
        for i in 1..=5 {
            pipeline.process_sample(sample(-10.0, 0.0, true, 50 + i * 50));
        }
        latch.post_click();
        let outcome = pipeline.process_sample(sample(0.0, 0.0, true, 400)).unwrap();
        assert_eq!(
            outcome.action,
            DispatchAction::GestureCommitted(GestureKind::ZoomIn)
        );

        // ズーム1回のみ、クリックは発生しない
        let calls = log.lock().unwrap();
        assert_eq!(calls.len(), 1);
        match calls[0] {
            SinkCall::Zoom { p1, p2, zoom_in } => {
                assert!(zoom_in);
                assert_ne!(p1, p2);
            }
            other => panic!("expected zoom, got {:?}", other),
        }
    }

    #[test]
    fn test_standby_requested_once_on_timeout() {
        let config = test_config();
        let (_engine, handle) = running_engine(&config);

        let (sink, _controller) = RecordingActionSink::new();
        let mut pipeline =
            MotionPipeline::new(handle.clone(), sink, ForcedClickLatch::new(), &config);

        let base = crate::domain::types::monotonic_ms();
        pipeline.process_sample(sample(0.0, 0.0, true, base));
        handle.countdown().restart(base);

        // タイムアウトを超えた未検出フレームでSTANDBYが要求される
        for i in 0..20 {
            pipeline.process_sample(sample(0.0, 0.0, false, base + 6000 + i * 50));
        }
        for _ in 0..100 {
            if handle.state() == EngineState::Standby {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("engine did not reach STANDBY");
    }
}
