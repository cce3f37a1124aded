//! コマンドスレッドの配線
//!
//! EngineCoreを専用スレッドに載せ、外部へはチャネル送信だけの
//! ノンブロッキングなハンドルを公開する。FrameSourceのコールバックも
//! 同じチャネルへ多重化されるため、状態遷移は常に直列化される。

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Sender};
use tracing::{info, warn};

use crate::application::countdown::FaceDetectionCountdown;
use crate::application::engine::{Command, EngineCore};
use crate::application::runtime_state::EngineSnapshot;
use crate::domain::config::AppConfig;
use crate::domain::error::{CameraError, EngineError, EngineResult};
use crate::domain::ports::{EngineListener, FrameSource, SourceEventSink};
use crate::domain::types::{DeviceInfo, EngineState, Request};

/// cleanup()がコマンドスレッドの応答を待つ上限
const CLEANUP_ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// FrameSourceコールバックをコマンドチャネルへ転送するシンク
///
/// 呼び出し元のスレッドでは状態遷移を行わず、送信のみを行う。
struct ChannelEventSink {
    sender: Sender<Command>,
}

impl SourceEventSink for ChannelEventSink {
    fn started(&self) {
        let _ = self.sender.send(Command::SourceStarted);
    }

    fn stopped(&self) {
        let _ = self.sender.send(Command::SourceStopped);
    }

    fn error(&self, error: CameraError) {
        let _ = self.sender.send(Command::SourceError(error));
    }
}

/// エンジンへの共有ハンドル
///
/// すべてのメソッドはノンブロッキング（チャネル送信または
/// アトミック読み取りのみ）。キャプチャスレッド・入力スレッド・
/// UIスレッドのどこからでも使用できる。
#[derive(Clone)]
pub struct EngineHandle {
    sender: Sender<Command>,
    snapshot: EngineSnapshot,
    countdown: FaceDetectionCountdown,
    device: DeviceInfo,
}

impl EngineHandle {
    fn post(&self, request: Request) -> EngineResult<()> {
        self.sender
            .send(Command::Request(request))
            .map_err(|_| EngineError::ChannelClosed)
    }

    pub fn start(&self) -> EngineResult<()> {
        self.post(Request::Start)
    }

    pub fn stop(&self) -> EngineResult<()> {
        self.post(Request::Stop)
    }

    pub fn pause(&self) -> EngineResult<()> {
        self.post(Request::Pause)
    }

    pub fn resume(&self) -> EngineResult<()> {
        self.post(Request::Resume)
    }

    pub fn standby(&self) -> EngineResult<()> {
        self.post(Request::Standby)
    }

    /// 画面ON/OFF通知（最新の値のみが意味を持つ）
    pub fn on_screen_state_change(&self, screen_on: bool) -> EngineResult<()> {
        self.post(Request::ScreenStateChange { screen_on })
    }

    /// 現在のエンジン状態（ロックフリー読み取り）
    pub fn state(&self) -> EngineState {
        self.snapshot.state()
    }

    /// 非同期操作の完了待ち中か
    pub fn is_waiting(&self) -> bool {
        self.snapshot.is_waiting()
    }

    /// 顔未検出カウントダウンへの共有ハンドル
    pub fn countdown(&self) -> &FaceDetectionCountdown {
        &self.countdown
    }

    /// open()で取得したデバイス情報（回転・反転を含む）
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }
}

/// エンジン本体（コマンドスレッドの所有者）
///
/// Dropでcleanup()が呼ばれるが、明示的に呼ぶことを推奨する。
pub struct Engine {
    handle: EngineHandle,
    join: Option<JoinHandle<()>>,
}

impl Engine {
    /// エンジンを初期化する
    ///
    /// FrameSourceを取得し（失敗時はErrを返しDisabledのまま）、
    /// Stopped状態でコマンドスレッドを起動する。一度きりの操作。
    pub fn init<S, L>(mut source: S, listener: L, config: &AppConfig) -> EngineResult<Self>
    where
        S: FrameSource + 'static,
        L: EngineListener + 'static,
    {
        config.validate()?;

        let (sender, receiver) = unbounded::<Command>();
        let snapshot = EngineSnapshot::new();
        let countdown = FaceDetectionCountdown::new(
            config.standby.timeout_ms,
            crate::domain::types::monotonic_ms(),
        );

        // デバイス取得。失敗はここで伝播し、スレッドは起動しない
        let device = source.open(Box::new(ChannelEventSink {
            sender: sender.clone(),
        }))?;
        info!(
            device = %device.name,
            width = device.frame_width,
            height = device.frame_height,
            rotation = device.rotation_degrees,
            "Camera device opened"
        );

        let mut core = EngineCore::new(
            source,
            listener,
            snapshot.clone(),
            countdown.clone(),
            &config.recovery,
            sender.clone(),
        );

        // spawn失敗時はクロージャごとcoreが破棄され、
        // EngineCoreのDropが取得済みデバイスを解放する
        let join = thread::Builder::new()
            .name("engine-command".to_string())
            .spawn(move || {
                info!("Command thread started");
                while let Ok(command) = receiver.recv() {
                    if !core.handle(command) {
                        break;
                    }
                }
                info!("Command thread terminated");
            })
            .map_err(|e| EngineError::Configuration(format!("Failed to spawn thread: {}", e)))?;

        Ok(Self {
            handle: EngineHandle {
                sender,
                snapshot,
                countdown,
                device,
            },
            join: Some(join),
        })
    }

    /// 共有ハンドルを複製する
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// エンジンを終了する（どの状態からでも安全、冪等）
    ///
    /// Cleanupコマンドを送り、有界時間で応答を待ってから
    /// コマンドスレッドをjoinする。
    pub fn cleanup(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };

        let (ack_tx, ack_rx) = bounded(1);
        if self.handle.sender.send(Command::Cleanup(ack_tx)).is_ok() {
            if ack_rx.recv_timeout(CLEANUP_ACK_TIMEOUT).is_err() {
                warn!("Cleanup ack timed out");
            }
        }
        if join.join().is_err() {
            warn!("Command thread panicked");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cleanup();
    }
}
