//! ログ・トレーシング基盤
//!
//! tracingを使用した統一的なログ出力。
//!
//! # 設計意図
//! フレーム処理のHot Pathにログ出力を置かない前提で、状態遷移・
//! エラー・統計などの低頻度イベントを構造化ログとして記録する。
//! 支援デバイスとして常用されるため、リリースビルドでもファイルへの
//! ログ出力を残す（エラー診断に必要）。

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログレベル（環境変数RUST_LOGで上書き可能）
#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: &str = "facepointer=debug";
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: &str = "facepointer=info";

/// ログシステムを初期化
///
/// # Arguments
/// - `json_format`: JSON形式で出力するか
/// - `log_dir`: ログファイル出力先（None = 標準出力）
///
/// # Returns
/// ファイル出力時は`Some(WorkerGuard)`。プログラム終了まで保持必須
/// （Drop時にログスレッドが終了しバッファがフラッシュされる）。
pub fn init_logging(
    json_format: bool,
    log_dir: Option<PathBuf>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    match log_dir {
        Some(dir) => {
            // ファイル出力（非同期）
            if std::fs::create_dir_all(&dir).is_err() {
                return None;
            }

            let file_appender = tracing_appender::rolling::daily(dir, "facepointer.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = tracing_subscriber::registry().with(env_filter);

            let result = if json_format {
                subscriber
                    .with(fmt::layer().json().with_writer(non_blocking))
                    .try_init()
            } else {
                subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_names(true)
                            .with_ansi(false) // ファイル出力時はANSIエスケープ無効
                            .with_writer(non_blocking),
                    )
                    .try_init()
            };

            if result.is_err() {
                return None;
            }

            info!(
                "Logging initialized (async file): format={}",
                if json_format { "json" } else { "text" }
            );
            Some(guard)
        }
        None => {
            // 標準出力（デバッグ用）
            let subscriber = tracing_subscriber::registry().with(env_filter);

            let result = if json_format {
                subscriber.with(fmt::layer().json()).try_init()
            } else {
                subscriber
                    .with(fmt::layer().with_target(true).with_thread_names(true))
                    .try_init()
            };

            if result.is_err() {
                return None;
            }

            info!("Logging initialized (stdout)");
            None
        }
    }
}
