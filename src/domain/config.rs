//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。
//! すべての設定は構築時に不変オブジェクトとして各コンポーネントへ渡される。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{EngineError, EngineResult};

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// 画面設定
    pub screen: ScreenConfig,
    /// ポインタ制御設定
    pub pointer: PointerConfig,
    /// クリック（dwell/キー）設定
    pub click: ClickConfig,
    /// 自動待機設定
    pub standby: StandbyConfig,
    /// カメラ再試行設定
    pub recovery: RecoveryConfig,
    /// 統計出力設定
    #[serde(default)]
    pub stats: StatsConfig,
}

/// 画面設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScreenConfig {
    /// 画面幅（ピクセル）
    pub width: u32,
    /// 画面高さ（ピクセル）
    pub height: u32,
}

impl ScreenConfig {
    pub const DEFAULT_WIDTH: u32 = 1920;
    pub const DEFAULT_HEIGHT: u32 = 1080;
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

/// ポインタ制御設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PointerConfig {
    /// 感度（モーションベクトルへの倍率、X/Y軸共通）
    ///
    /// デフォルト: 8.0
    pub sensitivity: f32,

    /// 加速倍率（1フレームの移動量がacceleration_threshold_pxを超えた場合に適用）
    ///
    /// 1.0で加速なし。デフォルト: 2.0
    pub acceleration: f32,

    /// 加速が効き始める移動量（ピクセル/フレーム、感度適用前）
    ///
    /// デフォルト: 40.0
    pub acceleration_threshold_px: f32,

    /// デッドゾーン（これ未満の移動量は無視、ピクセル）
    ///
    /// 頭の微細な揺れによるポインタのドリフトを抑える。
    /// デフォルト: 0.0
    pub motion_threshold_px: f32,
}

impl PointerConfig {
    pub const DEFAULT_SENSITIVITY: f32 = 8.0;
    pub const DEFAULT_ACCELERATION: f32 = 2.0;
    pub const DEFAULT_ACCELERATION_THRESHOLD_PX: f32 = 40.0;
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            sensitivity: Self::DEFAULT_SENSITIVITY,
            acceleration: Self::DEFAULT_ACCELERATION,
            acceleration_threshold_px: Self::DEFAULT_ACCELERATION_THRESHOLD_PX,
            motion_threshold_px: 0.0,
        }
    }
}

/// クリック設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClickConfig {
    /// dwellクリックの静止時間（ミリ秒）
    ///
    /// ポインタがこの時間、許容半径内に留まるとクリックが発火する。
    /// デフォルト: 1000ms
    pub dwell_ms: u64,

    /// dwellの許容半径（ピクセル）
    ///
    /// アンカーからこの距離を超えて動くと進捗が0%に戻る。
    /// デフォルト: 15.0
    pub tolerance_radius_px: f32,

    /// クリック機能全体の有効/無効
    pub click_enabled: bool,

    /// dwellクリックの有効/無効（無効でもキー由来の強制クリックは通る）
    pub dwell_enabled: bool,

    /// ハードウェアキーの長押し判定時間（ミリ秒）
    ///
    /// これ以上の押下はスワイプ起点/終点の指定として扱われる。
    /// デフォルト: 600ms
    pub long_press_ms: u64,
}

impl ClickConfig {
    pub const DEFAULT_DWELL_MS: u64 = 1000;
    pub const DEFAULT_TOLERANCE_RADIUS_PX: f32 = 15.0;
    pub const DEFAULT_LONG_PRESS_MS: u64 = 600;
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            dwell_ms: Self::DEFAULT_DWELL_MS,
            tolerance_radius_px: Self::DEFAULT_TOLERANCE_RADIUS_PX,
            click_enabled: true,
            dwell_enabled: true,
            long_press_ms: Self::DEFAULT_LONG_PRESS_MS,
        }
    }
}

/// 自動待機設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StandbyConfig {
    /// 顔未検出がこの時間続いたらSTANDBYへ遷移（ミリ秒）
    ///
    /// デフォルト: 15000ms
    pub timeout_ms: u64,

    /// STANDBYからの復帰時にキャプチャスレッドが譲る時間（ミリ秒）
    ///
    /// resume()がコマンドスレッドで処理されるのを待つための有界スリープ。
    /// デフォルト: 100ms
    pub wake_yield_ms: u64,
}

impl StandbyConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
    pub const DEFAULT_WAKE_YIELD_MS: u64 = 100;
}

impl Default for StandbyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            wake_yield_ms: Self::DEFAULT_WAKE_YIELD_MS,
        }
    }
}

impl StandbyConfig {
    pub fn wake_yield(&self) -> Duration {
        Duration::from_millis(self.wake_yield_ms)
    }
}

/// カメラ再試行設定
///
/// 実行中の一時的エラー（使用中など）に対する有界の自動再起動。
/// CameraDisabledは再試行の対象外（ユーザーによる再有効化が必要）。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecoveryConfig {
    /// 最大再試行回数
    ///
    /// デフォルト: 3回
    pub max_start_retries: u32,

    /// 再試行時の初期待機時間（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub initial_backoff_ms: u64,

    /// 再試行時の最大待機時間（ミリ秒、指数バックオフの上限）
    ///
    /// デフォルト: 5000ms
    pub max_backoff_ms: u64,
}

impl RecoveryConfig {
    pub const DEFAULT_MAX_START_RETRIES: u32 = 3;
    pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
    pub const DEFAULT_MAX_BACKOFF_MS: u64 = 5000;
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_start_retries: Self::DEFAULT_MAX_START_RETRIES,
            initial_backoff_ms: Self::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: Self::DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RecoveryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// 統計出力設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatsConfig {
    /// 統計情報の出力間隔（秒）
    pub report_interval_sec: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_sec: 10,
        }
    }
}

impl StatsConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_sec)
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Configuration(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| EngineError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> EngineResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| EngineError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> EngineResult<()> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(EngineError::Configuration(
                "Screen width and height must be greater than 0".to_string(),
            ));
        }

        if self.pointer.sensitivity <= 0.0 {
            return Err(EngineError::Configuration(
                "Pointer sensitivity must be positive".to_string(),
            ));
        }
        if self.pointer.acceleration < 1.0 {
            return Err(EngineError::Configuration(
                "Pointer acceleration must be >= 1.0".to_string(),
            ));
        }
        if self.pointer.motion_threshold_px < 0.0 {
            return Err(EngineError::Configuration(
                "Motion threshold must be non-negative".to_string(),
            ));
        }

        if self.click.dwell_ms == 0 {
            return Err(EngineError::Configuration(
                "Dwell time must be greater than 0".to_string(),
            ));
        }
        if self.click.tolerance_radius_px <= 0.0 {
            return Err(EngineError::Configuration(
                "Tolerance radius must be positive".to_string(),
            ));
        }

        if self.standby.timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "Standby timeout must be greater than 0".to_string(),
            ));
        }

        if self.recovery.initial_backoff_ms > self.recovery.max_backoff_ms {
            return Err(EngineError::Configuration(
                "Initial backoff must not exceed max backoff".to_string(),
            ));
        }

        // 0だと毎フレーム統計出力が発火してしまう
        if self.stats.report_interval_sec == 0 {
            return Err(EngineError::Configuration(
                "Stats report interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
