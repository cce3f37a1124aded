//! パイプライン統計
//!
//! フレームレートとアクション実行数の収集・定期出力。
//! キャプチャスレッド上でフレームごとに更新される。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::info;

use crate::domain::config::StatsConfig;

/// FPS計測の移動窓サイズ
const FPS_WINDOW: usize = 60;

/// フレーム処理の統計コレクタ
pub struct PipelineStats {
    report_interval: Duration,
    last_report: Instant,
    frame_times: VecDeque<Instant>,
    frames: u64,
    face_frames: u64,
    clicks: u64,
    gestures: u64,
}

impl PipelineStats {
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            report_interval: config.report_interval(),
            last_report: Instant::now(),
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
            frames: 0,
            face_frames: 0,
            clicks: 0,
            gestures: 0,
        }
    }

    /// 1フレーム分の記録
    pub fn record_frame(&mut self, face_detected: bool) {
        self.frames += 1;
        if face_detected {
            self.face_frames += 1;
        }
        if self.frame_times.len() >= FPS_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(Instant::now());
    }

    pub fn record_click(&mut self) {
        self.clicks += 1;
    }

    pub fn record_gesture(&mut self) {
        self.gestures += 1;
    }

    /// 直近の移動窓から計算したFPS
    pub fn current_fps(&self) -> f64 {
        if self.frame_times.len() < 2 {
            return 0.0;
        }
        let span = self
            .frame_times
            .back()
            .unwrap()
            .duration_since(*self.frame_times.front().unwrap());
        if span.is_zero() {
            return 0.0;
        }
        (self.frame_times.len() - 1) as f64 / span.as_secs_f64()
    }

    /// 出力間隔が経過したか
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計を出力してカウンタをリセットする
    pub fn report_and_reset(&mut self) {
        #[cfg(debug_assertions)]
        info!(
            frames = self.frames,
            face_frames = self.face_frames,
            clicks = self.clicks,
            gestures = self.gestures,
            fps = format!("{:.1}", self.current_fps()),
            "Pipeline stats"
        );

        #[cfg(not(debug_assertions))]
        info!(
            frames = self.frames,
            clicks = self.clicks,
            gestures = self.gestures,
            fps = format!("{:.1}", self.current_fps()),
            "Pipeline stats"
        );

        self.frames = 0;
        self.face_frames = 0;
        self.clicks = 0;
        self.gestures = 0;
        self.last_report = Instant::now();
    }
}
