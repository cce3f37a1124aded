//! スレッド間共有状態
//!
//! コマンドスレッドが書き、キャプチャスレッドが毎フレーム読む
//! ロックフリーの状態スナップショット。Mutexを使わないのは
//! フレーム処理のホットパスでブロックしないため。

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::domain::types::EngineState;

/// エンジン状態のロックフリースナップショット
///
/// 書き込みはコマンドスレッドのみ。読み取りはどのスレッドからでも可。
/// 遷移表そのものはEngineCoreが持ち、ここは公開された結果のみを保持する。
#[derive(Clone)]
pub struct EngineSnapshot {
    state: Arc<AtomicU8>,
    /// WaitState: 非同期操作（開始/停止）の完了待ちフラグ
    waiting: Arc<AtomicBool>,
}

impl EngineSnapshot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(EngineState::Disabled.to_u8())),
            waiting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 現在のエンジン状態を取得
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// 状態を公開する（コマンドスレッド専用）
    pub(crate) fn publish_state(&self, state: EngineState) {
        self.state.store(state.to_u8(), Ordering::Relaxed);
    }

    /// 非同期操作の完了待ち中か
    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Relaxed)
    }

    pub(crate) fn set_waiting(&self, waiting: bool) {
        self.waiting.store(waiting, Ordering::Relaxed);
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// キー由来の強制クリック信号
///
/// 入力スレッド（キーイベント）が書き、キャプチャスレッドが
/// フレーム処理時にtake()で消費する。格納は最新の1件のみ
/// （フレーム間に複数回押されても1クリック）。
#[derive(Clone)]
pub struct ForcedClickLatch {
    // 0=なし, 1=クリック, 2=スワイプヒント
    slot: Arc<AtomicU8>,
}

const LATCH_NONE: u8 = 0;
const LATCH_CLICK: u8 = 1;
const LATCH_SWIPE: u8 = 2;

impl ForcedClickLatch {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(AtomicU8::new(LATCH_NONE)),
        }
    }

    /// 通常クリック信号を登録する（キー短押し）
    pub fn post_click(&self) {
        self.slot.store(LATCH_CLICK, Ordering::Relaxed);
    }

    /// スワイプヒント付きクリック信号を登録する（キー長押し）
    pub fn post_swipe(&self) {
        self.slot.store(LATCH_SWIPE, Ordering::Relaxed);
    }

    /// 信号を取り出して消費する
    pub fn take(&self) -> crate::domain::types::ClickHint {
        use crate::domain::types::ClickHint;
        match self.slot.swap(LATCH_NONE, Ordering::Relaxed) {
            LATCH_CLICK => ClickHint::HardwareClick,
            LATCH_SWIPE => ClickHint::SwipeGesture,
            _ => ClickHint::None,
        }
    }
}

impl Default for ForcedClickLatch {
    fn default() -> Self {
        Self::new()
    }
}
