//! アクションシンクのモック実装
//!
//! 実行されたアクションを記録するだけのシンク。
//! デモバイナリとテストの両方で使用する。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::domain::ports::AccessibilityActionSink;
use crate::domain::types::{GestureFlags, PointF};

/// 記録されたアクション呼び出し
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkCall {
    Click {
        point: PointF,
        via_hardware_key: bool,
    },
    Swipe {
        from: PointF,
        to: PointF,
    },
    Zoom {
        p1: PointF,
        p2: PointF,
        zoom_in: bool,
    },
}

struct Shared {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    // アーミングフラグ（gesture_flags()の読み取りで消費される）
    swipe_armed: AtomicBool,
    zoom_in_armed: AtomicBool,
    zoom_out_armed: AtomicBool,
    actionable: AtomicBool,
    prepared: AtomicBool,
}

/// アクションを記録するモックシンク
pub struct RecordingActionSink {
    shared: Arc<Shared>,
}

/// モックシンクを外部から操作するハンドル
///
/// シンクの所有権をGestureRecognizer/MotionPipelineへ渡した後も、
/// このハンドルでアーミングフラグの操作と呼び出しログの観察ができる。
#[derive(Clone)]
pub struct RecordingSinkController {
    shared: Arc<Shared>,
}

impl RecordingActionSink {
    pub fn new() -> (Self, RecordingSinkController) {
        let shared = Arc::new(Shared {
            calls: Arc::new(Mutex::new(Vec::new())),
            swipe_armed: AtomicBool::new(false),
            zoom_in_armed: AtomicBool::new(false),
            zoom_out_armed: AtomicBool::new(false),
            actionable: AtomicBool::new(true),
            prepared: AtomicBool::new(false),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            RecordingSinkController { shared },
        )
    }
}

// アーミング等の操作APIはテスト側から使用する
#[allow(dead_code)]
impl RecordingSinkController {
    /// 呼び出しログへの共有ハンドル
    pub fn call_log(&self) -> Arc<Mutex<Vec<SinkCall>>> {
        Arc::clone(&self.shared.calls)
    }

    /// 記録された呼び出しのスナップショット
    pub fn calls(&self) -> Vec<SinkCall> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// 次のクリックをスワイプ起点として扱うようアームする
    pub fn arm_swipe(&self) {
        self.shared.swipe_armed.store(true, Ordering::Relaxed);
    }

    pub fn arm_zoom_in(&self) {
        self.shared.zoom_in_armed.store(true, Ordering::Relaxed);
    }

    pub fn arm_zoom_out(&self) {
        self.shared.zoom_out_armed.store(true, Ordering::Relaxed);
    }

    /// is_actionable()の返り値を設定する
    pub fn set_actionable(&self, actionable: bool) {
        self.shared.actionable.store(actionable, Ordering::Relaxed);
    }

    /// has_prepared_action()の返り値を設定する
    pub fn set_prepared(&self, prepared: bool) {
        self.shared.prepared.store(prepared, Ordering::Relaxed);
    }
}

impl AccessibilityActionSink for RecordingActionSink {
    fn is_actionable(&self, _point: PointF) -> bool {
        self.shared.actionable.load(Ordering::Relaxed)
    }

    fn perform_click(&mut self, point: PointF, via_hardware_key: bool) {
        info!(x = point.x, y = point.y, via_hardware_key, "Click performed");
        self.shared.calls.lock().unwrap().push(SinkCall::Click {
            point,
            via_hardware_key,
        });
    }

    fn perform_swipe(&mut self, from: PointF, to: PointF) {
        info!(
            from_x = from.x,
            from_y = from.y,
            to_x = to.x,
            to_y = to.y,
            "Swipe performed"
        );
        self.shared
            .calls
            .lock()
            .unwrap()
            .push(SinkCall::Swipe { from, to });
    }

    fn perform_zoom(&mut self, p1: PointF, p2: PointF, zoom_in: bool) {
        info!(zoom_in, "Zoom performed");
        self.shared
            .calls
            .lock()
            .unwrap()
            .push(SinkCall::Zoom { p1, p2, zoom_in });
    }

    fn gesture_flags(&mut self) -> GestureFlags {
        // 読み取りで消費（アームボタンは一回限り）
        GestureFlags {
            swipe: self.shared.swipe_armed.swap(false, Ordering::Relaxed),
            zoom_in: self.shared.zoom_in_armed.swap(false, Ordering::Relaxed),
            zoom_out: self.shared.zoom_out_armed.swap(false, Ordering::Relaxed),
        }
    }

    fn has_prepared_action(&self) -> bool {
        self.shared.prepared.load(Ordering::Relaxed)
    }

    fn refresh(&mut self) {}

    fn reset(&mut self) {
        self.shared.swipe_armed.store(false, Ordering::Relaxed);
        self.shared.zoom_in_armed.store(false, Ordering::Relaxed);
        self.shared.zoom_out_armed.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_consumed_on_read() {
        let (mut sink, controller) = RecordingActionSink::new();
        controller.arm_swipe();

        let flags = sink.gesture_flags();
        assert!(flags.swipe);
        // 2回目の読み取りでは消費済み
        let flags = sink.gesture_flags();
        assert!(!flags.swipe);
    }

    #[test]
    fn test_controller_arms_after_handoff() {
        // シンクの所有権を渡した後もコントローラでアームできる
        let (mut sink, controller) = RecordingActionSink::new();
        let mut moved = move || sink.gesture_flags();

        controller.arm_zoom_in();
        let flags = moved();
        assert!(flags.zoom_in);
    }

    #[test]
    fn test_calls_recorded() {
        let (mut sink, controller) = RecordingActionSink::new();

        sink.perform_click(PointF::new(1.0, 2.0), true);
        sink.perform_swipe(PointF::new(0.0, 0.0), PointF::new(5.0, 5.0));

        let calls = controller.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], SinkCall::Click { via_hardware_key: true, .. }));
    }
}
