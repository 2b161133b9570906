use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::MultipartError;
use serde_json::json;
use tracing::error;

use super::templates::ErrorTemplate;
use crate::error::XlsxToJsonlError;

/// Webサーバーのエラー型
///
/// 変換エラーをHTTPステータスコードへ対応付けます。
/// APIルートでは`{"error": "..."}`形式のJSON、フォームではHTMLのエラーページとして返します。
#[derive(Debug)]
pub enum AppError {
    /// 変換処理のエラー
    Conversion(XlsxToJsonlError),
    /// multipartボディの読み込みエラー
    Multipart(MultipartError),
    /// `file`フィールドがないなど、リクエストの不備
    BadRequest(String),
    /// その他の内部エラー
    Internal(anyhow::Error),
}

impl From<XlsxToJsonlError> for AppError {
    fn from(err: XlsxToJsonlError) -> Self {
        AppError::Conversion(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl AppError {
    /// ステータスコードとクライアント向けメッセージ
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Conversion(err) => {
                let status = match err {
                    XlsxToJsonlError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    XlsxToJsonlError::Parse(_)
                    | XlsxToJsonlError::ParseMessage(_)
                    | XlsxToJsonlError::Zip(_)
                    | XlsxToJsonlError::Encoding { .. }
                    | XlsxToJsonlError::DuplicateColumn { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    XlsxToJsonlError::SecurityViolation(_) => StatusCode::PAYLOAD_TOO_LARGE,
                    XlsxToJsonlError::Io(_) | XlsxToJsonlError::Config(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            AppError::Multipart(err) => (err.status(), err.body_text()),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.".to_string(),
            ),
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(err) => error!("Internal server error: {:?}", err),
            other => error!("Request failed: {:?}", other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status_code, error_message) = self.status_and_message();

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}

/// HTMLのエラーページとして返すエラー（アップロードフォーム用）
#[derive(Debug)]
pub(crate) struct HtmlError(pub(crate) AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl From<MultipartError> for HtmlError {
    fn from(err: MultipartError) -> Self {
        HtmlError(AppError::Multipart(err))
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        self.0.log();
        let (status_code, error_message) = self.0.status_and_message();

        match ErrorTemplate::new(status_code.as_u16(), &error_message).render() {
            Ok(html) => (status_code, Html(html)).into_response(),
            Err(err) => {
                error!("Failed to render error page: {}", err);
                (status_code, error_message).into_response()
            }
        }
    }
}
