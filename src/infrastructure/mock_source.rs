//! フレームソースのモック実装
//!
//! 実カメラの非同期完了動作を模倣する。auto_complete有効時は
//! start/stop要求に対して即座に完了通知を返し、無効時は
//! コントローラ経由で任意のタイミングで完了・エラーを注入できる。

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::error::CameraError;
use crate::domain::ports::{FrameSource, SourceEventSink};
use crate::domain::types::{CameraFlip, DeviceInfo};

struct Inner {
    sink: Option<Box<dyn SourceEventSink>>,
    device: DeviceInfo,
    auto_complete: bool,
    start_calls: u32,
    stop_calls: u32,
    shutdown_calls: u32,
    fail_open: Option<CameraError>,
    /// 次のstart要求で（非同期エラーとして）返すエラー
    fail_next_start: Option<CameraError>,
}

/// テスト・デモ用のモックカメラ
pub struct MockFrameSource {
    inner: Arc<Mutex<Inner>>,
}

/// モックカメラを外部から操作するハンドル
///
/// エンジンにFrameSourceの所有権を渡した後も、
/// このハンドルで完了通知やエラーを注入できる。
#[derive(Clone)]
pub struct MockSourceController {
    inner: Arc<Mutex<Inner>>,
}

impl MockFrameSource {
    /// 即時完了モードのモックカメラを生成する
    pub fn new() -> (Self, MockSourceController) {
        Self::with_auto_complete(true)
    }

    /// 完了モードを指定してモックカメラを生成する
    ///
    /// auto_complete=falseの場合、完了通知はコントローラの
    /// complete_start()/complete_stop()で明示的に送る。
    pub fn with_auto_complete(auto_complete: bool) -> (Self, MockSourceController) {
        let inner = Arc::new(Mutex::new(Inner {
            sink: None,
            device: DeviceInfo {
                name: "mock-camera".to_string(),
                frame_width: 640,
                frame_height: 480,
                rotation_degrees: 0,
                flip: CameraFlip::Horizontal,
            },
            auto_complete,
            start_calls: 0,
            stop_calls: 0,
            shutdown_calls: 0,
            fail_open: None,
            fail_next_start: None,
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            MockSourceController { inner },
        )
    }
}

impl FrameSource for MockFrameSource {
    fn open(&mut self, events: Box<dyn SourceEventSink>) -> Result<DeviceInfo, CameraError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.fail_open.take() {
            warn!(error = %err, "Mock camera open failed");
            return Err(err);
        }
        inner.sink = Some(events);
        debug!(device = %inner.device.name, "Mock camera opened");
        Ok(inner.device.clone())
    }

    fn start_capture(&mut self) -> Result<(), CameraError> {
        let mut inner = self.inner.lock().unwrap();
        inner.start_calls += 1;
        if let Some(err) = inner.fail_next_start.take() {
            if let Some(sink) = &inner.sink {
                sink.error(err);
            }
            return Ok(());
        }
        if inner.auto_complete {
            if let Some(sink) = &inner.sink {
                sink.started();
            }
        }
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), CameraError> {
        let mut inner = self.inner.lock().unwrap();
        inner.stop_calls += 1;
        if inner.auto_complete {
            if let Some(sink) = &inner.sink {
                sink.stopped();
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.shutdown_calls += 1;
        inner.sink = None;
        debug!("Mock camera shut down");
    }
}

// テスト側から操作するためのAPI（デモバイナリでは一部未使用）
#[allow(dead_code)]
impl MockSourceController {
    /// 保留中のstart要求を完了させる（auto_complete=false用）
    pub fn complete_start(&self) {
        let inner = self.inner.lock().unwrap();
        if let Some(sink) = &inner.sink {
            sink.started();
        }
    }

    /// 保留中のstop要求を完了させる
    pub fn complete_stop(&self) {
        let inner = self.inner.lock().unwrap();
        if let Some(sink) = &inner.sink {
            sink.stopped();
        }
    }

    /// 実行中エラーを注入する
    pub fn emit_error(&self, error: CameraError) {
        let inner = self.inner.lock().unwrap();
        if let Some(sink) = &inner.sink {
            sink.error(error);
        }
    }

    /// open()を失敗させる（openより前に設定する）
    pub fn fail_open(&self, error: CameraError) {
        self.inner.lock().unwrap().fail_open = Some(error);
    }

    /// 次のstart要求を非同期エラーで応答させる
    pub fn fail_next_start(&self, error: CameraError) {
        self.inner.lock().unwrap().fail_next_start = Some(error);
    }

    /// デバイス情報を差し替える（openより前に設定する）
    pub fn set_device(&self, device: DeviceInfo) {
        self.inner.lock().unwrap().device = device;
    }

    pub fn start_count(&self) -> u32 {
        self.inner.lock().unwrap().start_calls
    }

    pub fn stop_count(&self) -> u32 {
        self.inner.lock().unwrap().stop_calls
    }

    pub fn shutdown_count(&self) -> u32 {
        self.inner.lock().unwrap().shutdown_calls
    }
}
