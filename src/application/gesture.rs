//! ジェスチャー認識
//!
//! クリック信号とアクションシンクのアーミングフラグから、
//! 単純クリック/2点スワイプ/2点ズームのいずれを実行するかを決定する。
//! 2点ジェスチャーは「1クリック目=起点、2クリック目=終点」の
//! プロトコルで進行する。

use tracing::{debug, info};

use crate::domain::ports::AccessibilityActionSink;
use crate::domain::types::{ClickHint, DispatchAction, GestureKind, PointF};

/// ジェスチャー進行状態
#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    /// ジェスチャー進行中でない
    Idle,
    /// 1点目を取得済み、2点目のクリックを待っている
    Awaiting { kind: GestureKind, first: PointF },
}

/// クリック信号をアクションへ解決するディスパッチャ
///
/// キャプチャスレッド専用。シンクの所有権を持ち、
/// アクション実行はすべてここを経由する。
pub struct GestureRecognizer<A: AccessibilityActionSink> {
    sink: A,
    state: GestureState,
}

impl<A: AccessibilityActionSink> GestureRecognizer<A> {
    pub fn new(sink: A) -> Self {
        Self {
            sink,
            state: GestureState::Idle,
        }
    }

    /// 指定座標でアクションが実行可能か（dwellのゲートに使う）
    ///
    /// 2点ジェスチャー進行中は2点目がUI要素上になくても
    /// 確定できる必要があるため、常にtrueを返す。
    pub fn is_actionable(&self, point: PointF) -> bool {
        if matches!(self.state, GestureState::Awaiting { .. }) {
            return true;
        }
        self.sink.is_actionable(point)
    }

    /// フレームごとのシンク内部キャッシュ更新
    pub fn refresh(&mut self) {
        self.sink.refresh();
    }

    /// 進行中のジェスチャーを破棄し、シンクをリセットする
    pub fn reset(&mut self) {
        if self.state != GestureState::Idle {
            debug!("Gesture in progress discarded");
        }
        self.state = GestureState::Idle;
        self.sink.reset();
    }

    /// 1フレーム分のディスパッチ判定
    ///
    /// # Arguments
    /// - `point`: 現在のポインタ位置
    /// - `click`: このフレームでクリック信号が発火したか（dwellまたはキー）
    /// - `hint`: クリック信号の由来（キー由来ならdwell迂回の扱い）
    pub fn dispatch(&mut self, point: PointF, click: bool, hint: ClickHint) -> DispatchAction {
        if !click {
            // クリックなし: 進行中ジェスチャーと準備済みアクションの表示のみ
            return match self.state {
                GestureState::Awaiting { kind, .. } => DispatchAction::GestureArmed(kind),
                GestureState::Idle if self.sink.has_prepared_action() => DispatchAction::Prepared,
                GestureState::Idle => DispatchAction::Unset,
            };
        }

        match self.state {
            GestureState::Awaiting { kind, first } => {
                // 2点目: ジェスチャー確定
                self.state = GestureState::Idle;
                match kind {
                    GestureKind::Swipe => self.sink.perform_swipe(first, point),
                    GestureKind::ZoomIn => self.sink.perform_zoom(first, point, true),
                    GestureKind::ZoomOut => self.sink.perform_zoom(first, point, false),
                }
                info!(kind = ?kind, "Gesture committed");
                DispatchAction::GestureCommitted(kind)
            }
            GestureState::Idle => {
                if let Some(kind) = self.armed_kind(hint) {
                    // 1点目: 起点を記録して2点目を待つ
                    self.state = GestureState::Awaiting { kind, first: point };
                    debug!(kind = ?kind, x = point.x, y = point.y, "Gesture armed");
                    DispatchAction::GestureArmed(kind)
                } else {
                    let via_hardware_key = hint == ClickHint::HardwareClick;
                    self.sink.perform_click(point, via_hardware_key);
                    DispatchAction::SimpleClick
                }
            }
        }
    }

    /// アーミングフラグとキーヒントからジェスチャー種別を解決する
    ///
    /// 優先順位: zoom-in > zoom-out > swipe。
    /// フラグはシンク側で読み取り消費される。
    fn armed_kind(&mut self, hint: ClickHint) -> Option<GestureKind> {
        let flags = self.sink.gesture_flags();
        if flags.zoom_in {
            Some(GestureKind::ZoomIn)
        } else if flags.zoom_out {
            Some(GestureKind::ZoomOut)
        } else if flags.swipe || hint == ClickHint::SwipeGesture {
            Some(GestureKind::Swipe)
        } else {
            None
        }
    }
}
