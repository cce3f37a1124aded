//! Infrastructure層
//!
//! Domain層のPortに対する具体実装。実デバイス（カメラ・
//! アクセシビリティAPI）はスコープ外のため、記録・注入が可能な
//! モック実装を提供する。テストとデモバイナリが使用する。

pub mod mock_sink;
pub mod mock_source;

pub use mock_sink::{RecordingActionSink, RecordingSinkController, SinkCall};
pub use mock_source::{MockFrameSource, MockSourceController};
