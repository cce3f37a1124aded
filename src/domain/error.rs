/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供する。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - 回復可能性を型で表現（CameraInUse=一時的 vs CameraDisabled=致命的）
/// - init()時のエラーは再試行せず呼び出し元へ伝播する

use thiserror::Error;

/// カメラエラーの分類
///
/// FrameSourceから報告される問題の種別。エラーポリシー（§リカバリ）は
/// この分類に基づいて再試行可否を判断する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // 実デバイス実装が報告し得る分類を網羅している
pub enum CameraProblem {
    /// OS/ユーザーによりカメラが無効化されている（再試行しない）
    CameraDisabled,
    /// 実行中にカメラが切断された
    CameraDisconnected,
    /// 他のアプリがカメラを使用中（一時的、再試行可）
    CameraInUse,
    /// その他のカメラエラー
    CameraError,
    /// 同時使用可能なカメラ数の上限に達した
    MaxCamerasInUse,
    /// 利用可能なカメラが存在しない
    NoCamerasAvailable,
}

impl CameraProblem {
    /// 自動再試行が許されないエラーか
    ///
    /// CameraDisabledは明示的な拒否であり、ユーザーによる
    /// 再有効化が必要。静かに再試行してはならない。
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CameraDisabled)
    }
}

/// FrameSourceが報告するエラー
#[derive(Error, Debug, Clone)]
#[error("camera error [{problem:?}]: {message}")]
pub struct CameraError {
    pub problem: CameraProblem,
    pub message: String,
}

impl CameraError {
    #[allow(dead_code)]
    pub fn new(problem: CameraProblem, message: impl Into<String>) -> Self {
        Self {
            problem,
            message: message.into(),
        }
    }
}

/// エンジンの統一エラー型
#[derive(Error, Debug)]
pub enum EngineError {
    /// カメラ関連のエラー（init時はここに集約される）
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// コマンドスレッドが終了済み
    #[error("Engine command channel closed")]
    ChannelClosed,
}

/// エンジンの統一Result型
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(CameraProblem::CameraDisabled.is_fatal());
        assert!(!CameraProblem::CameraInUse.is_fatal());
        assert!(!CameraProblem::CameraDisconnected.is_fatal());
    }

    #[test]
    fn test_camera_error_display() {
        let err = CameraError::new(CameraProblem::CameraInUse, "busy");
        let text = format!("{}", err);
        assert!(text.contains("CameraInUse"));
        assert!(text.contains("busy"));
    }
}
