//! エンジン状態機械
//!
//! ライフサイクルリクエストとカメラコールバックを直列化して処理する。
//! EngineCoreは同期的な純粋状態機械であり、スレッドやチャネルを
//! 持たない（テスト容易性のため）。コマンドスレッドへの配線は
//! threads.rsが行う。

use std::collections::VecDeque;
use std::mem::discriminant;
use std::thread;

use crossbeam_channel::Sender;
use tracing::{debug, error, info, warn};

use crate::application::countdown::FaceDetectionCountdown;
use crate::application::recovery::RecoveryState;
use crate::application::runtime_state::EngineSnapshot;
use crate::domain::config::RecoveryConfig;
use crate::domain::error::CameraError;
use crate::domain::ports::{EngineListener, FrameSource};
use crate::domain::types::{monotonic_ms, EngineState, Notice, Request};

/// コマンドスレッドが処理するメッセージ
///
/// ライフサイクルリクエストとFrameSourceの非同期コールバックを
/// 単一のチャネルへ多重化する。
pub enum Command {
    /// ライフサイクルリクエスト（保留キューで重複排除される）
    Request(Request),
    /// キャプチャ開始が完了した
    SourceStarted,
    /// キャプチャ停止が完了した
    SourceStopped,
    /// デバイスエラーが発生した
    SourceError(CameraError),
    /// 終了要求。処理後にackへ応答してループを抜ける
    Cleanup(Sender<()>),
}

/// 状態機械の本体（コマンドスレッド専用）
///
/// # 不変条件
/// - WaitState中は保留キューを消化しない（in-flight操作は常に1つ以下）
/// - 保留キューはバリアント単位で重複排除される（長さ≦6）
/// - 状態遷移はここでのみ発生し、結果はEngineSnapshotへ公開される
pub struct EngineCore<S: FrameSource, L: EngineListener> {
    source: S,
    listener: L,
    snapshot: EngineSnapshot,
    countdown: FaceDetectionCountdown,
    recovery: RecoveryState,
    /// 再試行タイマースレッドがリクエストを送り返すための送信口
    self_sender: Sender<Command>,
    state: EngineState,
    wait_state: bool,
    pending: VecDeque<Request>,
    /// 画面OFF時に保存した状態（画面ONで復元する）
    saved_state: Option<EngineState>,
    /// デバイス解放済みフラグ（Dropでの二重解放を防ぐ）
    shut_down: bool,
}

impl<S: FrameSource, L: EngineListener> EngineCore<S, L> {
    /// 状態機械を生成する（デバイス取得済みの前提でStopped開始）
    pub fn new(
        source: S,
        listener: L,
        snapshot: EngineSnapshot,
        countdown: FaceDetectionCountdown,
        recovery_config: &RecoveryConfig,
        self_sender: Sender<Command>,
    ) -> Self {
        snapshot.publish_state(EngineState::Stopped);
        Self {
            source,
            listener,
            snapshot,
            countdown,
            recovery: RecoveryState::new(recovery_config),
            self_sender,
            state: EngineState::Stopped,
            wait_state: false,
            pending: VecDeque::new(),
            saved_state: None,
            shut_down: false,
        }
    }

    /// 1コマンドを処理する
    ///
    /// # Returns
    /// 処理継続ならtrue、Cleanup処理後はfalse（ループ終了）
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Request(request) => {
                self.enqueue(request);
                self.drain();
                true
            }
            Command::SourceStarted => {
                self.on_source_started();
                true
            }
            Command::SourceStopped => {
                self.on_source_stopped();
                true
            }
            Command::SourceError(err) => {
                self.on_source_error(err);
                true
            }
            Command::Cleanup(ack) => {
                self.do_cleanup();
                let _ = ack.send(());
                false
            }
        }
    }

    #[allow(dead_code)] // スレッド配線を介さない直接テストで使用
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 保留キューへ追加する（同一バリアントの旧リクエストは破棄）
    fn enqueue(&mut self, request: Request) {
        let before = self.pending.len();
        self.pending
            .retain(|r| discriminant(r) != discriminant(&request));
        if self.pending.len() < before {
            debug!(request = request.name(), "Stale request replaced in queue");
        }
        self.pending.push_back(request);
    }

    /// 保留キューを消化する。WaitState中は停止する
    fn drain(&mut self) {
        while !self.wait_state {
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            self.process(request);
        }
    }

    /// 遷移表に従って1リクエストを適用する
    fn process(&mut self, request: Request) {
        debug!(
            request = request.name(),
            state = self.state.as_str(),
            "Processing request"
        );

        if self.state == EngineState::Disabled {
            warn!(request = request.name(), "Request ignored: engine disabled");
            return;
        }

        match request {
            Request::Start => match self.state {
                EngineState::Stopped => self.do_start(),
                // 一時停止/待機中のstartはresumeとして扱う
                EngineState::Paused | EngineState::Standby => self.do_resume(),
                _ => debug!("Start ignored: already running"),
            },
            Request::Stop => match self.state {
                EngineState::Running | EngineState::Paused | EngineState::Standby => {
                    self.do_stop()
                }
                _ => debug!("Stop ignored: already stopped"),
            },
            Request::Pause => match self.state {
                EngineState::Running | EngineState::Standby => self.do_pause(),
                _ => debug!("Pause ignored in current state"),
            },
            Request::Resume => match self.state {
                EngineState::Paused | EngineState::Standby => self.do_resume(),
                _ => debug!("Resume ignored in current state"),
            },
            Request::Standby => match self.state {
                EngineState::Running | EngineState::Paused => self.do_standby(),
                _ => debug!("Standby ignored in current state"),
            },
            Request::ScreenStateChange { screen_on } => self.process_screen_change(screen_on),
        }
    }

    /// 画面ON/OFFに伴う状態の保存・復元
    ///
    /// OFF: 現在状態を保存し、Standby以外ならカメラを止める。
    /// ON: 保存状態がRunning/Standbyなら再開、Pausedなら再開して即一時停止。
    fn process_screen_change(&mut self, screen_on: bool) {
        if !screen_on {
            if self.state == EngineState::Stopped {
                return;
            }
            info!(state = self.state.as_str(), "Screen off: saving engine state");
            self.saved_state = Some(self.state);
            if self.state != EngineState::Standby {
                self.enqueue(Request::Stop);
            }
            return;
        }

        match self.saved_state.take() {
            Some(EngineState::Running) | Some(EngineState::Standby) => {
                info!("Screen on: restoring capture");
                self.enqueue(Request::Start);
            }
            Some(EngineState::Paused) => {
                info!("Screen on: restoring paused capture");
                self.enqueue(Request::Start);
                self.enqueue(Request::Pause);
            }
            _ => {}
        }
    }

    fn do_start(&mut self) {
        info!("Requesting camera start");
        self.set_wait(true);
        if let Err(err) = self.source.start_capture() {
            self.on_source_error(err);
        }
    }

    fn do_stop(&mut self) {
        info!("Requesting camera stop");
        self.set_wait(true);
        if let Err(err) = self.source.stop_capture() {
            self.on_source_error(err);
        }
    }

    fn do_pause(&mut self) {
        self.set_state(EngineState::Paused);
    }

    fn do_resume(&mut self) {
        self.set_state(EngineState::Running);
        // 再開直後に未検出タイムアウトが即発火しないようにリセット
        self.countdown.restart(monotonic_ms());
    }

    fn do_standby(&mut self) {
        self.set_state(EngineState::Standby);
        self.listener.on_notice(Notice::PointerStopped);
    }

    /// キャプチャ開始完了コールバック
    fn on_source_started(&mut self) {
        self.set_wait(false);
        if self.state == EngineState::Stopped {
            self.set_state(EngineState::Running);
            self.countdown.restart(monotonic_ms());
            self.recovery.record_success();
        } else {
            debug!(state = self.state.as_str(), "Spurious started callback");
        }
        self.drain();
    }

    /// キャプチャ停止完了コールバック
    fn on_source_stopped(&mut self) {
        self.set_wait(false);
        self.set_state(EngineState::Stopped);
        self.drain();
    }

    /// デバイスエラー。エラーポリシーに従って停止・再試行・通知を行う
    fn on_source_error(&mut self, err: CameraError) {
        error!(error = %err, state = self.state.as_str(), "Camera error reported");
        self.set_wait(false);

        // まず安全な状態へ戻す。デバイスはエラー中のため停止完了は待たない
        if self.state != EngineState::Stopped {
            let _ = self.source.stop_capture();
        }
        self.set_state(EngineState::Stopped);

        if err.problem.is_fatal() {
            // 再有効化はユーザー操作が必要。静かに再試行しない
            self.listener.on_camera_error(&err);
            self.listener.on_notice(Notice::CameraRecoveryNeeded);
        } else if self.recovery.can_retry() {
            let backoff = self.recovery.record_attempt();
            let sender = self.self_sender.clone();
            let timer = thread::Builder::new()
                .name("camera-retry".to_string())
                .spawn(move || {
                    thread::sleep(backoff);
                    let _ = sender.send(Command::Request(Request::Start));
                });
            if timer.is_err() {
                error!("Failed to spawn retry timer");
                self.listener.on_camera_error(&err);
            }
        } else {
            error!("Camera restart attempts exhausted");
            self.listener.on_camera_error(&err);
        }

        self.drain();
    }

    /// 終了処理。キューを破棄し、デバイスを強制解放してDisabledへ
    fn do_cleanup(&mut self) {
        info!("Engine cleanup");
        self.pending.clear();
        self.set_wait(false);
        self.source.shutdown();
        self.shut_down = true;
        self.set_state(EngineState::Disabled);
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state == state {
            return;
        }
        info!(from = self.state.as_str(), to = state.as_str(), "Engine state changed");
        self.state = state;
        self.snapshot.publish_state(state);
        self.listener.on_state_changed(state);
    }

    fn set_wait(&mut self, waiting: bool) {
        self.wait_state = waiting;
        self.snapshot.set_waiting(waiting);
    }
}

impl<S: FrameSource, L: EngineListener> Drop for EngineCore<S, L> {
    /// Cleanupを経ずに破棄された場合（コマンドスレッドの起動失敗や
    /// チャネル切断によるループ終了）でもデバイスを解放する
    fn drop(&mut self) {
        if !self.shut_down {
            warn!("Engine core dropped without cleanup: releasing device");
            self.source.shutdown();
        }
    }
}
