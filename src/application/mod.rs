//! Application層
//!
//! エンジン状態機械とモーション処理パイプライン。
//! Domain層のPortにのみ依存し、具体的なデバイスを知らない。

pub mod countdown;
pub mod dwell;
pub mod engine;
pub mod gesture;
pub mod key_binding;
pub mod pipeline;
pub mod pointer;
pub mod recovery;
pub mod runtime_state;
pub mod stats;
pub mod threads;

pub use countdown::FaceDetectionCountdown;
pub use dwell::DwellClick;
pub use gesture::GestureRecognizer;
pub use key_binding::KeyClickBinder;
pub use pipeline::MotionPipeline;
pub use pointer::PointerControl;
pub use runtime_state::{EngineSnapshot, ForcedClickLatch};
pub use threads::{Engine, EngineHandle};
