//! facepointer - カメラベースの支援マウスエンジン
//!
//! 顔の動きのモーションサンプルをポインタ移動とクリック/ジェスチャーへ
//! 変換し、キャプチャデバイスのライフサイクルを安全に管理する。
//! 実デバイス（カメラ・アクセシビリティAPI）はPort traitの背後にあり、
//! 本クレートはモック実装のみを同梱する。

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod logging;
