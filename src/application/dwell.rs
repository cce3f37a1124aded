//! Dwellクリック判定
//!
//! ポインタが許容半径内に一定時間留まったらクリックを発火する。
//! 発火後はその位置で再アンカーするため、留まり続ければ
//! dwell時間ごとに1回ずつクリックが繰り返される。

use crate::domain::config::ClickConfig;
use crate::domain::types::PointF;

/// dwellクリックの判定器
///
/// キャプチャスレッド専用。時刻は呼び出し側から渡される
/// （MotionSample.timestamp_msと同一の時間軸）。
pub struct DwellClick {
    dwell_ms: u64,
    tolerance_radius_px: f32,
    /// 静止判定のアンカー（位置と静止開始時刻）
    anchor: Option<(PointF, u64)>,
}

impl DwellClick {
    pub fn new(config: &ClickConfig) -> Self {
        Self {
            dwell_ms: config.dwell_ms,
            tolerance_radius_px: config.tolerance_radius_px,
            anchor: None,
        }
    }

    /// ポインタ位置を与えてクリック発火を判定する
    ///
    /// # Returns
    /// このフレームでクリックが発火したらtrue
    pub fn update(&mut self, point: PointF, now_ms: u64) -> bool {
        match self.anchor {
            None => {
                self.anchor = Some((point, now_ms));
                false
            }
            Some((anchor, since_ms)) => {
                if point.distance_to(anchor) > self.tolerance_radius_px {
                    // 許容半径を出たら静止判定をやり直す
                    self.anchor = Some((point, now_ms));
                    return false;
                }
                if now_ms.saturating_sub(since_ms) >= self.dwell_ms {
                    // 発火。現在位置で再アンカーし、次の静止を待つ
                    self.anchor = Some((point, now_ms));
                    return true;
                }
                false
            }
        }
    }

    /// 静止判定をリセットする（クリック無効化・状態遷移時）
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    /// 現在の静止進捗（0〜100、オーバーレイのリング表示用）
    pub fn progress_percent(&self, now_ms: u64) -> u8 {
        if self.dwell_ms == 0 {
            return 0;
        }
        match self.anchor {
            None => 0,
            Some((_, since_ms)) => {
                let elapsed = now_ms.saturating_sub(since_ms);
                ((elapsed * 100) / self.dwell_ms).min(100) as u8
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dwell() -> DwellClick {
        DwellClick::new(&ClickConfig {
            dwell_ms: 1000,
            tolerance_radius_px: 15.0,
            click_enabled: true,
            dwell_enabled: true,
            long_press_ms: 600,
        })
    }

    #[test]
    fn test_fires_after_dwell_time() {
        let mut dwell = make_dwell();
        let p = PointF::new(100.0, 100.0);

        assert!(!dwell.update(p, 0));
        assert!(!dwell.update(p, 500));
        assert!(!dwell.update(p, 999));
        assert!(dwell.update(p, 1000));
    }

    #[test]
    fn test_exactly_two_clicks_at_double_dwell() {
        // 2×dwell時間留まったらちょうど2回発火する
        let mut dwell = make_dwell();
        let p = PointF::new(100.0, 100.0);

        let mut clicks = 0;
        for t in (0..=2000).step_by(50) {
            if dwell.update(p, t) {
                clicks += 1;
            }
        }
        assert_eq!(clicks, 2);
    }

    #[test]
    fn test_movement_resets_anchor() {
        let mut dwell = make_dwell();

        assert!(!dwell.update(PointF::new(100.0, 100.0), 0));
        // 許容半径内の揺れ: アンカーは維持される
        assert!(!dwell.update(PointF::new(105.0, 100.0), 500));
        // 許容半径を超える移動: やり直し
        assert!(!dwell.update(PointF::new(200.0, 200.0), 900));
        assert!(!dwell.update(PointF::new(200.0, 200.0), 1500));
        assert!(dwell.update(PointF::new(200.0, 200.0), 1900));
    }

    #[test]
    fn test_progress_percent_clamped() {
        let mut dwell = make_dwell();
        let p = PointF::new(0.0, 0.0);

        assert_eq!(dwell.progress_percent(0), 0);
        dwell.update(p, 0);
        assert_eq!(dwell.progress_percent(500), 50);
        assert_eq!(dwell.progress_percent(990), 99);
        // 発火前に100を超えることはない
        assert_eq!(dwell.progress_percent(5000), 100);
    }

    #[test]
    fn test_reset_clears_anchor() {
        let mut dwell = make_dwell();
        let p = PointF::new(0.0, 0.0);

        dwell.update(p, 0);
        dwell.reset();
        assert_eq!(dwell.progress_percent(900), 0);
        // リセット後は再び満了までの時間が必要
        assert!(!dwell.update(p, 1000));
        assert!(!dwell.update(p, 1999));
        assert!(dwell.update(p, 2000));
    }
}
