mod application;
mod domain;
mod infrastructure;
mod logging;

use std::thread;
use std::time::Duration;

use anyhow::Context;

use crate::application::key_binding::KeyClickBinder;
use crate::application::pipeline::MotionPipeline;
use crate::application::runtime_state::ForcedClickLatch;
use crate::application::threads::Engine;
use crate::domain::config::AppConfig;
use crate::domain::error::CameraError;
use crate::domain::ports::EngineListener;
use crate::domain::types::{monotonic_ms, EngineState, MotionSample, Notice};
use crate::infrastructure::mock_sink::RecordingActionSink;
use crate::infrastructure::mock_source::MockFrameSource;
use crate::logging::init_logging;

fn main() {
    // ログシステムの初期化（標準出力）
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）
    let _guard = init_logging(false, None);

    tracing::info!("facepointer starting...");

    match run() {
        Ok(_) => {
            tracing::info!("facepointer terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// エンジンイベントをログへ流すリスナー
struct LoggingListener;

impl EngineListener for LoggingListener {
    fn on_state_changed(&self, state: EngineState) {
        tracing::info!(state = state.as_str(), "[listener] state changed");
    }

    fn on_notice(&self, notice: Notice) {
        tracing::info!(notice = ?notice, "[listener] notice");
    }

    fn on_camera_error(&self, error: &CameraError) {
        tracing::error!(error = %error, "[listener] camera error");
    }
}

/// アプリケーションのメイン処理
///
/// モックカメラ・モックアクションシンクを配線し、合成フレームで
/// パイプライン全体（dwellクリック→スワイプ→自動待機→復帰）を
/// デモ実行する。
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            if !std::path::Path::new("config.toml").exists()
                && AppConfig::write_default("config.toml").is_ok()
            {
                tracing::info!("Wrote default config.toml");
            }
            AppConfig::default()
        }
    };

    let mut config = config;
    // デモを短時間で終えるため、自動待機タイムアウトを短縮する
    config.standby.timeout_ms = config.standby.timeout_ms.min(2000);

    config.validate().context("invalid configuration")?;
    tracing::info!(
        "Configuration: screen={}x{}, dwell={}ms, standby_timeout={}ms",
        config.screen.width,
        config.screen.height,
        config.click.dwell_ms,
        config.standby.timeout_ms
    );

    // モックデバイスの配線
    let (source, _camera) = MockFrameSource::new();
    let (sink, sink_controller) = RecordingActionSink::new();
    let action_log = sink_controller.call_log();

    let mut engine =
        Engine::init(source, LoggingListener, &config).context("engine init failed")?;
    let handle = engine.handle();

    let forced_click = ForcedClickLatch::new();
    let mut key_binder = KeyClickBinder::new(&config.click, forced_click.clone());
    let mut pipeline = MotionPipeline::new(handle.clone(), sink, forced_click, &config);

    // キャプチャ開始
    handle.start().context("start request failed")?;
    wait_for_state(&handle, EngineState::Running)?;
    tracing::info!("Engine running, feeding synthetic frames");

    let frame = Duration::from_millis(33);

    // 1) ポインタを右下へ動かす
    for _ in 0..30 {
        feed(&mut pipeline, 3.0, 2.0, true);
        thread::sleep(frame);
    }

    // 2) 静止してdwellクリックを発火させる
    let dwell_frames = (config.click.dwell_ms / 33 + 10) as usize;
    for _ in 0..dwell_frames {
        feed(&mut pipeline, 0.0, 0.0, true);
        thread::sleep(frame);
    }
    tracing::info!(actions = action_log.lock().unwrap().len(), "After dwell hold");

    // 3) キー長押し2回でスワイプ（起点→移動→終点）
    key_binder.on_key_down(monotonic_ms());
    thread::sleep(Duration::from_millis(config.click.long_press_ms + 50));
    key_binder.on_key_up(monotonic_ms());
    feed(&mut pipeline, 0.0, 0.0, true);
    for _ in 0..20 {
        feed(&mut pipeline, -4.0, 0.0, true);
        thread::sleep(frame);
    }
    key_binder.on_key_down(monotonic_ms());
    thread::sleep(Duration::from_millis(config.click.long_press_ms + 50));
    key_binder.on_key_up(monotonic_ms());
    feed(&mut pipeline, 0.0, 0.0, true);
    tracing::info!(actions = action_log.lock().unwrap().len(), "After swipe gesture");

    // 4) ユーザー操作による一時停止と再開
    handle.pause().context("pause request failed")?;
    wait_for_state(&handle, EngineState::Paused)?;
    tracing::info!("Engine paused");
    handle.resume().context("resume request failed")?;
    wait_for_state(&handle, EngineState::Running)?;

    // 5) 画面OFF→ONで状態の保存・復元
    handle
        .on_screen_state_change(false)
        .context("screen-off notification failed")?;
    wait_for_state(&handle, EngineState::Stopped)?;
    tracing::info!("Screen off: capture stopped");
    handle
        .on_screen_state_change(true)
        .context("screen-on notification failed")?;
    wait_for_state(&handle, EngineState::Running)?;
    tracing::info!("Screen on: capture restored");

    // 6) 顔を見失い、自動待機へ遷移させる
    //    （静止位置でのdwell再発火を避けるためクリックを無効化）
    pipeline.set_click_enabled(false);
    let standby_frames = (config.standby.timeout_ms / 33 + 20) as usize;
    for _ in 0..standby_frames {
        feed(&mut pipeline, 0.0, 0.0, false);
        thread::sleep(frame);
        if handle.state() == EngineState::Standby {
            break;
        }
    }
    wait_for_state(&handle, EngineState::Standby)?;
    tracing::info!("Engine in standby (face lost)");

    // 7) 顔を再検出して復帰
    for _ in 0..10 {
        feed(&mut pipeline, 0.0, 0.0, true);
        thread::sleep(frame);
        if handle.state() == EngineState::Running {
            break;
        }
    }
    wait_for_state(&handle, EngineState::Running)?;
    tracing::info!("Engine resumed (face detected)");

    // 終了処理
    handle.stop().context("stop request failed")?;
    wait_for_state(&handle, EngineState::Stopped)?;
    engine.cleanup();

    let actions = action_log.lock().unwrap();
    tracing::info!(total_actions = actions.len(), "Demo finished");
    for action in actions.iter() {
        tracing::info!(action = ?action, "Dispatched");
    }

    Ok(())
}

fn feed<A: crate::domain::ports::AccessibilityActionSink>(
    pipeline: &mut MotionPipeline<A>,
    dx: f32,
    dy: f32,
    face: bool,
) {
    pipeline.process_sample(MotionSample {
        dx,
        dy,
        face_detected: face,
        timestamp_ms: monotonic_ms(),
    });
}

/// 目標状態へ到達するまで有界でポーリングする
fn wait_for_state(
    handle: &crate::application::threads::EngineHandle,
    expected: EngineState,
) -> anyhow::Result<()> {
    for _ in 0..200 {
        if handle.state() == expected && !handle.is_waiting() {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(10));
    }
    anyhow::bail!("engine did not reach {}", expected.as_str())
}
