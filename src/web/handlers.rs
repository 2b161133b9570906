use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::Multipart;
use serde::Serialize;
use tracing::info;

use super::errors::{AppError, HtmlError};
use super::templates::{IndexTemplate, ResultTemplate};
use super::AppState;
use crate::builder::{ConversionOutput, Inspection};
use crate::output::{jsonl_file_name, JSONL_CONTENT_TYPE};

/// アップロードされたファイル
struct Upload {
    file_name: String,
    data: Vec<u8>,
}

/// `/api/preview`のレスポンス
#[derive(Debug, Serialize)]
pub(crate) struct PreviewResponse {
    file_name: String,
    #[serde(flatten)]
    inspection: Inspection,
}

/// multipartボディから`file`フィールドを取り出す
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?.to_vec();
        info!("Received upload '{}' ({} bytes)", file_name, data.len());

        if file_name.is_empty() && data.is_empty() {
            return Err(AppError::BadRequest("No file was selected".to_string()));
        }
        return Ok(Upload { file_name, data });
    }

    Err(AppError::BadRequest(
        "Missing multipart field 'file'".to_string(),
    ))
}

/// ブロッキングタスク上で変換を実行
async fn run_conversion(state: &AppState, upload: Upload) -> Result<ConversionOutput, AppError> {
    let converter = state.converter.clone();
    let output = tokio::task::spawn_blocking(move || {
        converter.convert_bytes(&upload.file_name, upload.data)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Conversion task failed: {}", e)))??;

    Ok(output)
}

/// ブロッキングタスク上でシートを読み込む（JSONLへのシリアライズは行わない）
async fn run_inspection(state: &AppState, upload: Upload) -> Result<Inspection, AppError> {
    let converter = state.converter.clone();
    let inspection = tokio::task::spawn_blocking(move || {
        converter.inspect_bytes(&upload.file_name, upload.data)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Inspection task failed: {}", e)))??;

    Ok(inspection)
}

/// `GET /` アップロードフォーム
pub(crate) async fn index() -> Result<Html<String>, HtmlError> {
    let html = IndexTemplate::new().render().map_err(AppError::from)?;
    Ok(Html(html))
}

/// `GET /health`
pub(crate) async fn health_check() -> &'static str {
    "OK"
}

/// `POST /upload` 変換結果のHTMLページ
pub(crate) async fn upload_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, HtmlError> {
    let upload = read_upload(multipart).await?;
    let output = run_conversion(&state, upload).await?;
    let html = ResultTemplate::new(&output)
        .render()
        .map_err(AppError::from)?;
    Ok(Html(html))
}

/// `POST /api/convert` JSONL本体を添付ファイルとして返す
pub(crate) async fn convert_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    let output = run_conversion(&state, upload).await?;

    let headers = [
        (header::CONTENT_TYPE, JSONL_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.file_name),
        ),
    ];
    Ok((headers, output.jsonl).into_response())
}

/// `POST /api/preview` プレビュー、列名の対応表、データ品質レポートをJSONで返す
///
/// 行をJSONLへ変換しないため、変換に失敗するシートでも内容を確認できます。
pub(crate) async fn preview_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let file_name = jsonl_file_name(&upload.file_name);
    let inspection = run_inspection(&state, upload).await?;

    Ok(Json(PreviewResponse {
        file_name,
        inspection,
    }))
}
