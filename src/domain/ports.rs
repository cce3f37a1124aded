/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部コラボレータに依存するための抽象trait。
/// カメラデバイス・アクセシビリティ操作・UI通知はすべてスコープ外であり、
/// Infrastructure層（本リポジトリではモック実装）がこれらを実装する。

use crate::domain::{
    error::CameraError,
    types::{DeviceInfo, EngineState, GestureFlags, Notice, PointF},
};

/// FrameSourceの非同期完了通知先
///
/// start_capture()/stop_capture()は即座に戻り、実際の完了は
/// このシンク経由で（任意のスレッドから）通知される。
/// エンジン側の実装はイベントをコマンドスレッドへ転送するだけで、
/// 呼び出しコンテキストで状態遷移を行ってはならない。
pub trait SourceEventSink: Send + Sync {
    /// キャプチャ開始が完了した
    fn started(&self);
    /// キャプチャ停止が完了した
    fn stopped(&self);
    /// デバイスエラーが発生した（開始/停止中・実行中のいずれでも）
    fn error(&self, error: CameraError);
}

/// キャプチャポート: カメラデバイスのライフサイクルを抽象化
///
/// フレーム配信そのものはこのtraitの責務外。FaceTracker（外部）が
/// フレームからMotionSampleを生成し、MotionPipelineへ渡す。
pub trait FrameSource: Send {
    /// デバイスを取得する（一度だけ呼ばれる）
    ///
    /// # Arguments
    /// - `events`: 非同期完了通知の送り先
    ///
    /// # Returns
    /// - `Ok(DeviceInfo)`: 取得成功。向き・反転情報を含む
    /// - `Err(CameraError)`: デバイス取得失敗（init()が永続的に失敗する）
    fn open(&mut self, events: Box<dyn SourceEventSink>) -> Result<DeviceInfo, CameraError>;

    /// キャプチャ開始を要求する（非同期、完了はstarted()で通知）
    fn start_capture(&mut self) -> Result<(), CameraError>;

    /// キャプチャ停止を要求する（非同期、完了はstopped()で通知）
    fn stop_capture(&mut self) -> Result<(), CameraError>;

    /// デバイスを強制解放する（cleanup専用、同期・有界時間）
    fn shutdown(&mut self);
}

/// アクションポート: アクセシビリティ操作を抽象化
///
/// クリック/スワイプ/ズームの実行と、対象UI要素の問い合わせ。
/// GestureRecognizerからキャプチャスレッド上で呼ばれる。
pub trait AccessibilityActionSink: Send {
    /// 指定座標で何らかのアクションが実行可能か
    fn is_actionable(&self, point: PointF) -> bool;

    /// クリックを実行する
    ///
    /// # Arguments
    /// - `via_hardware_key`: dwellを迂回したハードウェアキー由来のクリックか
    fn perform_click(&mut self, point: PointF, via_hardware_key: bool);

    /// 2点間スワイプを実行する
    fn perform_swipe(&mut self, from: PointF, to: PointF);

    /// 2点をピンチアンカーとしてズームを実行する
    fn perform_zoom(&mut self, p1: PointF, p2: PointF, zoom_in: bool);

    /// 要求中のジェスチャーアーミングフラグを取得する
    ///
    /// フラグは読み取りで消費される（UIのアームボタンは一回限り）。
    fn gesture_flags(&mut self) -> GestureFlags;

    /// シンク側に準備済みアクションがあるか（フィードバック表示用）
    fn has_prepared_action(&self) -> bool;

    /// 内部キャッシュの更新（フレームごとに呼ばれる）
    fn refresh(&mut self);

    /// 内部状態のリセット
    fn reset(&mut self);
}

/// エンジンイベントの受け手
///
/// 旧設計のブロードキャストインテントに代わる型付き通知。
/// コマンドスレッドから呼ばれるため、実装はブロックしてはならない。
pub trait EngineListener: Send {
    /// 状態遷移が確定した
    fn on_state_changed(&self, _state: EngineState) {}

    /// ユーザー向け通知（待機開始など）
    fn on_notice(&self, _notice: Notice) {}

    /// 致命的エラー。リスナーは回復UI（再有効化の促し等）を表示する
    fn on_camera_error(&self, _error: &CameraError) {}
}

/// 何もしないリスナー（テスト・デモ用）
#[allow(dead_code)]
pub struct NullListener;

impl EngineListener for NullListener {}
