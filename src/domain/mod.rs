//! Domain層
//!
//! ビジネスロジックの中核となる型・エラー・Port定義。
//! 外部クレートへの依存は最小限（serde/thiserror/schemars）に抑える。

pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use config::AppConfig;
pub use error::{CameraError, CameraProblem, EngineError, EngineResult};
pub use ports::{AccessibilityActionSink, EngineListener, FrameSource, NullListener, SourceEventSink};
pub use types::{
    CameraFlip, ClickHint, DeviceInfo, DispatchAction, EngineState, FrameOutcome, GestureFlags,
    GestureKind, MotionSample, Notice, PointF, Request,
};
