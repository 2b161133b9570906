//! サーバー設定
//!
//! コマンドライン引数と環境変数の両方から読み込みます（引数が優先）。

use std::net::SocketAddr;

use clap::Args;

use crate::builder::DEFAULT_PREVIEW_ROWS;
use crate::quality::DEFAULT_TYPE_THRESHOLD;

/// アップロードサイズ上限のデフォルト値（MB）
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Webサーバーの設定
#[derive(Debug, Clone, PartialEq, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "XLSXJSONL_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Maximum upload size in megabytes
    #[arg(long, env = "XLSXJSONL_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Number of raw rows shown on the result page
    #[arg(long, env = "XLSXJSONL_PREVIEW_ROWS", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Share of non-missing values that must parse for a column type to be inferred
    #[arg(long, env = "XLSXJSONL_TYPE_THRESHOLD", default_value_t = DEFAULT_TYPE_THRESHOLD)]
    pub type_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            type_threshold: DEFAULT_TYPE_THRESHOLD,
        }
    }
}

impl ServerConfig {
    /// アップロードサイズ上限（バイト）
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
