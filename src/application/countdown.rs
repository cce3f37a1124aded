//! 顔検出カウントダウン
//!
//! 顔未検出が一定時間続いたことを検出するタイマー。
//! キャプチャスレッドが顔検出フレームごとにrestart()し、
//! 期限切れでパイプラインがSTANDBY遷移を要求する。
//! 複数スレッドから参照されるためAtomicで保持する。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// 顔未検出タイムアウトのカウントダウン
///
/// 期限はmonotonic_ms()の時間軸上の絶対値として保持する。
#[derive(Clone)]
pub struct FaceDetectionCountdown {
    /// 期限（monotonic ms）
    deadline_ms: Arc<AtomicU64>,
    /// 無効化フラグ（無効時は期限切れしない）
    disabled: Arc<AtomicBool>,
    timeout_ms: u64,
}

impl FaceDetectionCountdown {
    /// カウントダウンを生成する（生成時点からカウント開始）
    pub fn new(timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            deadline_ms: Arc::new(AtomicU64::new(now_ms.saturating_add(timeout_ms))),
            disabled: Arc::new(AtomicBool::new(false)),
            timeout_ms,
        }
    }

    /// カウントダウンを再起動する（顔検出フレームごとに呼ばれる）
    pub fn restart(&self, now_ms: u64) {
        self.deadline_ms
            .store(now_ms.saturating_add(self.timeout_ms), Ordering::Relaxed);
    }

    /// 期限切れか（無効時は常にfalse）
    pub fn has_finished(&self, now_ms: u64) -> bool {
        if self.disabled.load(Ordering::Relaxed) {
            return false;
        }
        now_ms >= self.deadline_ms.load(Ordering::Relaxed)
    }

    /// カウントダウンを無効化する（自動待機をオフにする設定用）
    #[allow(dead_code)]
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
    }

    /// カウントダウンを有効化する（期限は保持したまま判定のみ再開する）
    #[allow(dead_code)]
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// 経過割合（0〜100、フィードバック表示用）
    #[allow(dead_code)]
    pub fn elapsed_percent(&self, now_ms: u64) -> u8 {
        if self.timeout_ms == 0 {
            return 100;
        }
        let deadline = self.deadline_ms.load(Ordering::Relaxed);
        let remaining = deadline.saturating_sub(now_ms);
        let elapsed = self.timeout_ms.saturating_sub(remaining);
        ((elapsed * 100) / self.timeout_ms).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finishes_after_timeout() {
        let countdown = FaceDetectionCountdown::new(1000, 0);
        assert!(!countdown.has_finished(999));
        assert!(countdown.has_finished(1000));
        assert!(countdown.has_finished(5000));
    }

    #[test]
    fn test_restart_extends_deadline() {
        let countdown = FaceDetectionCountdown::new(1000, 0);
        countdown.restart(900);
        assert!(!countdown.has_finished(1500));
        assert!(countdown.has_finished(1900));
    }

    #[test]
    fn test_disabled_never_finishes() {
        let countdown = FaceDetectionCountdown::new(1000, 0);
        countdown.disable();
        assert!(countdown.is_disabled());
        assert!(!countdown.has_finished(10_000));

        // 再有効化: 期限は保持されているため即座に期限切れと判定される
        countdown.enable();
        assert!(!countdown.is_disabled());
        assert!(countdown.has_finished(10_000));

        // restartで期限を引き直せる
        countdown.restart(10_000);
        assert!(!countdown.has_finished(10_500));
        assert!(countdown.has_finished(11_000));
    }

    #[test]
    fn test_elapsed_percent() {
        let countdown = FaceDetectionCountdown::new(1000, 0);
        assert_eq!(countdown.elapsed_percent(0), 0);
        assert_eq!(countdown.elapsed_percent(500), 50);
        assert_eq!(countdown.elapsed_percent(1000), 100);
        assert_eq!(countdown.elapsed_percent(9999), 100);
    }
}
