//! Web Module
//!
//! アップロードフォームとJSONL変換APIを提供するaxumサーバー。
//! 各リクエストは独立して変換され、共有されるのは不変の`Converter`設定のみです。

mod config;
mod errors;
mod handlers;
mod templates;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::builder::{Converter, ConverterBuilder};
use crate::error::XlsxToJsonlError;

pub use config::ServerConfig;
pub use errors::AppError;

/// multipartの境界やヘッダー分として、アップロード上限に加算するバイト数
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// リクエスト間で共有するアプリケーション状態
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) converter: Arc<Converter>,
    pub(crate) max_upload_bytes: usize,
}

/// サーバー設定からアプリケーション状態を構築
///
/// # 戻り値
///
/// * `Err(XlsxToJsonlError::Config)` - プレビュー行数やアップロード上限が0の場合、
///   または型推定のしきい値が範囲外の場合
pub fn build_app_state(config: &ServerConfig) -> Result<AppState, XlsxToJsonlError> {
    let max_upload_bytes = config.max_upload_bytes();
    let converter = ConverterBuilder::new()
        .with_preview_rows(config.preview_rows)
        .with_max_input_size(max_upload_bytes as u64)
        .with_type_threshold(config.type_threshold)
        .build()?;

    Ok(AppState {
        converter: Arc::new(converter),
        max_upload_bytes,
    })
}

/// すべてのルートを持つルーターを生成
pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/upload", post(handlers::upload_page))
        .route("/api/convert", post(handlers::convert_api))
        .route("/api/preview", post(handlers::preview_api))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

/// 指定されたリスナーでサーバーを実行
pub async fn run(listener: TcpListener, app_state: AppState) -> anyhow::Result<()> {
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// 設定に従ってアドレスをバインドし、サーバーを実行
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    debug!(?config, "Server configuration loaded");

    let app_state = build_app_state(&config)?;
    let listener = TcpListener::bind(config.bind).await?;
    run(listener, app_state).await
}
