//! カメラ再試行ポリシー
//!
//! 実行中の一時的エラーに対する有界の自動再起動を管理する。
//! init()時のエラーは対象外（即座に呼び出し元へ伝播する）。

use std::time::Duration;

use tracing::{info, warn};

use crate::domain::config::RecoveryConfig;

/// 再試行の回数と待機時間を追跡する
///
/// コマンドスレッド専用。成功で回数・バックオフともにリセットされる。
pub struct RecoveryState {
    config: RecoveryConfig,
    attempts: u32,
    next_backoff: Duration,
}

impl RecoveryState {
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            config: config.clone(),
            attempts: 0,
            next_backoff: config.initial_backoff(),
        }
    }

    /// まだ再試行が許されるか
    pub fn can_retry(&self) -> bool {
        self.attempts < self.config.max_start_retries
    }

    /// 再試行を記録し、次の試行までの待機時間を返す
    ///
    /// バックオフは試行ごとに倍増し、max_backoffで頭打ちになる。
    pub fn record_attempt(&mut self) -> Duration {
        self.attempts += 1;
        let backoff = self.next_backoff;
        self.next_backoff = (self.next_backoff * 2).min(self.config.max_backoff());
        warn!(
            attempt = self.attempts,
            max = self.config.max_start_retries,
            backoff_ms = backoff.as_millis() as u64,
            "Camera restart scheduled"
        );
        backoff
    }

    /// キャプチャ開始成功を記録する（カウンタをリセット）
    pub fn record_success(&mut self) {
        if self.attempts > 0 {
            info!(attempts = self.attempts, "Camera recovered after retries");
        }
        self.attempts = 0;
        self.next_backoff = self.config.initial_backoff();
    }

    #[allow(dead_code)]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
