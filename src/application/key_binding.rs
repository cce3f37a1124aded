//! ハードウェアキーのクリックバインド
//!
//! 外部の物理スイッチ（キーイベント）をクリック信号へ変換する。
//! 短押しは通常クリック、長押しはスワイプの起点/終点指定として
//! ForcedClickLatchへ登録され、次のフレーム処理で消費される。

use tracing::debug;

use crate::application::runtime_state::ForcedClickLatch;
use crate::domain::config::ClickConfig;

/// キー押下時間でクリック種別を判定するバインダ
///
/// 入力イベントスレッドから呼ばれる。時刻はmonotonic_ms()の軸。
pub struct KeyClickBinder {
    long_press_ms: u64,
    latch: ForcedClickLatch,
    pressed_at_ms: Option<u64>,
}

impl KeyClickBinder {
    pub fn new(config: &ClickConfig, latch: ForcedClickLatch) -> Self {
        Self {
            long_press_ms: config.long_press_ms,
            latch,
            pressed_at_ms: None,
        }
    }

    /// キー押下イベント
    ///
    /// 既に押下中の場合は無視する（キーリピート対策）。
    pub fn on_key_down(&mut self, now_ms: u64) {
        if self.pressed_at_ms.is_none() {
            self.pressed_at_ms = Some(now_ms);
        }
    }

    /// キー解放イベント。押下時間に応じた信号をラッチへ登録する
    pub fn on_key_up(&mut self, now_ms: u64) {
        let Some(pressed_at) = self.pressed_at_ms.take() else {
            return;
        };
        let held_ms = now_ms.saturating_sub(pressed_at);
        if held_ms < self.long_press_ms {
            debug!(held_ms, "Key short press: click");
            self.latch.post_click();
        } else {
            debug!(held_ms, "Key long press: swipe point");
            self.latch.post_swipe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ClickHint;

    fn make_binder() -> (KeyClickBinder, ForcedClickLatch) {
        let latch = ForcedClickLatch::new();
        let binder = KeyClickBinder::new(
            &ClickConfig {
                long_press_ms: 600,
                ..ClickConfig::default()
            },
            latch.clone(),
        );
        (binder, latch)
    }

    #[test]
    fn test_short_press_posts_click() {
        let (mut binder, latch) = make_binder();
        binder.on_key_down(1000);
        binder.on_key_up(1300);
        assert_eq!(latch.take(), ClickHint::HardwareClick);
    }

    #[test]
    fn test_long_press_posts_swipe() {
        let (mut binder, latch) = make_binder();
        binder.on_key_down(1000);
        binder.on_key_up(1700);
        assert_eq!(latch.take(), ClickHint::SwipeGesture);
    }

    #[test]
    fn test_key_repeat_ignored() {
        let (mut binder, latch) = make_binder();
        binder.on_key_down(1000);
        // キーリピートによる重複down: 最初の押下時刻が維持される
        binder.on_key_down(1500);
        binder.on_key_up(1700);
        assert_eq!(latch.take(), ClickHint::SwipeGesture);
    }

    #[test]
    fn test_up_without_down_ignored() {
        let (mut binder, latch) = make_binder();
        binder.on_key_up(1000);
        assert_eq!(latch.take(), ClickHint::None);
    }
}
