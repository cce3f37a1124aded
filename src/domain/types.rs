/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// エンジン状態・モーションサンプル・ジェスチャー種別など、
/// すべての処理で共有される型をここに集約する。

use std::sync::OnceLock;
use std::time::Instant;

/// エンジンのライフサイクル状態
///
/// 遷移はEngineCoreの遷移表（コマンドスレッド上）でのみ行われる。
/// キャプチャスレッドはEngineSnapshot経由で読み取るのみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// 未初期化またはcleanup済み（永続状態）
    Disabled,
    /// 初期化済み、カメラ停止中
    Stopped,
    /// フレーム処理中
    Running,
    /// ユーザー操作による一時停止（カメラは回り続ける）
    Paused,
    /// 顔未検出が続いたことによる自動待機
    Standby,
}

impl EngineState {
    /// ログ出力用の状態名
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "DISABLED",
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Standby => "STANDBY",
        }
    }

    /// AtomicU8格納用の変換
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Stopped => 1,
            Self::Running => 2,
            Self::Paused => 3,
            Self::Standby => 4,
        }
    }

    /// AtomicU8からの復元
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Stopped,
            2 => Self::Running,
            3 => Self::Paused,
            4 => Self::Standby,
            _ => Self::Disabled,
        }
    }
}

/// ライフサイクルリクエスト
///
/// 名前付きRunnable継承の代わりにタグ付きenumで表現する。
/// キューの重複排除はバリアント（discriminant）単位で行われるため、
/// 保留キューの長さはバリアント数（6）を超えない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Start,
    Stop,
    Pause,
    Resume,
    Standby,
    /// 画面ON/OFF通知。最新の値のみが意味を持つ（latest-wins）
    ScreenStateChange { screen_on: bool },
}

impl Request {
    /// ログ出力用のリクエスト名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Standby => "standby",
            Self::ScreenStateChange { .. } => "onScreenStateChange",
        }
    }
}

/// 2次元座標（画面座標系、ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 2点間のユークリッド距離
    pub fn distance_to(&self, other: PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 1フレーム分のモーションサンプル
///
/// FaceTracker（外部）が生成し、MotionPipelineが消費する。
/// フレームごとに生成され、保持されない。
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    /// 顔の移動量X（カメラ座標系、ミラー補正前）
    pub dx: f32,
    /// 顔の移動量Y
    pub dy: f32,
    /// このフレームで顔が検出されたか
    pub face_detected: bool,
    /// サンプル時刻（monotonic_ms()と同一の時間軸）
    pub timestamp_ms: u64,
}

/// カメラの物理的な反転
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFlip {
    #[default]
    None,
    /// 前面カメラの鏡像（dx反転が必要）
    Horizontal,
    #[allow(dead_code)] // 実デバイスのDeviceInfoが報告し得る値
    Vertical,
}

/// FrameSourceが報告するデバイス情報
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub frame_width: u32,
    pub frame_height: u32,
    /// センサーの物理回転（0/90/180/270度）
    pub rotation_degrees: u32,
    pub flip: CameraFlip,
}

/// 2点ジェスチャーの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Swipe,
    ZoomIn,
    ZoomOut,
}

/// アクションシンクが要求しているジェスチャーアーミングフラグ
///
/// 複数同時に立っている場合の優先順位は
/// zoom-in > zoom-out > swipe（GestureRecognizerが解決する）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureFlags {
    pub swipe: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
}

/// フレームごとのディスパッチ結果
///
/// 旧実装のint定数（COMPLEX_ACTION_*）に代わる型付き表現。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    /// アクションなし
    Unset,
    /// シンクに準備済みアクションがある（視覚フィードバック用）
    Prepared,
    /// 単純クリックを実行した
    SimpleClick,
    /// 2点ジェスチャーの1点目を取得した（またはアーム済み継続中）
    GestureArmed(GestureKind),
    /// 2点ジェスチャーを確定・実行した
    GestureCommitted(GestureKind),
}

/// クリック信号の由来ヒント
///
/// ハードウェアキー由来の強制クリックはdwellを迂回する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickHint {
    #[default]
    None,
    /// キー短押し: 通常クリックとして実行
    HardwareClick,
    /// キー長押し: スワイプの起点/終点として扱う
    SwipeGesture,
}

/// MotionPipelineが1フレームごとに返す処理結果
///
/// 外部のオーバーレイ層がポインタとdwell進捗を描画するための情報。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub location: PointF,
    pub action: DispatchAction,
    /// dwellクリックの進捗（0〜100）
    pub click_progress_percent: u8,
}

/// リスナーへ通知するユーザー向けイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// 自動待機に入った（「ポインタ停止」表示）
    PointerStopped,
    /// カメラが無効化された。ユーザーによる再有効化が必要
    CameraRecoveryNeeded,
}

/// プロセス起動からの経過ミリ秒（単調増加クロック）
///
/// MotionSample.timestamp_msとFaceDetectionCountdownの期限は
/// すべてこのクロックの値で表現される。
pub fn monotonic_ms() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u64
}
