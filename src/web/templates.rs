//! HTMLテンプレート
//!
//! テンプレート本体はクレート直下の`templates/`にあります。
//! 値のHTMLエスケープはaskamaが行います。

use askama::Template;

use crate::builder::ConversionOutput;
use crate::parser::SpreadsheetFormat;
use crate::quality::{ColumnType, QuarantinedRow};

/// 結果ページに表示する隔離行の最大数
const MAX_QUARANTINE_ROWS: usize = 50;

/// `GET /` アップロードフォーム
#[derive(Template)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    accept: String,
}

impl IndexTemplate {
    pub(crate) fn new() -> Self {
        Self {
            accept: SpreadsheetFormat::accept_attribute(),
        }
    }
}

/// 列名の対応表の1行
pub(crate) struct ColumnRow<'a> {
    number: usize,
    original: &'a str,
    sanitized: &'a str,
    inferred_type: ColumnType,
}

/// `POST /upload` 変換結果ページ
///
/// プレビュー、列名と推定型の対応表、隔離行、ダウンロード用フォームを含みます。
/// ダウンロードは同じファイルを`/api/convert`へ送信して行います。
#[derive(Template)]
#[template(path = "result.html")]
pub(crate) struct ResultTemplate<'a> {
    output: &'a ConversionOutput,
    columns: Vec<ColumnRow<'a>>,
    threshold_percent: String,
    quarantined: &'a [QuarantinedRow],
    quarantine_total: usize,
    accept: String,
}

impl<'a> ResultTemplate<'a> {
    pub(crate) fn new(output: &'a ConversionOutput) -> Self {
        let columns = output
            .summary
            .columns
            .iter()
            .map(|column| ColumnRow {
                number: column.index + 1,
                original: &column.original,
                sanitized: &column.sanitized,
                inferred_type: output
                    .quality
                    .column_type(column.index)
                    .unwrap_or(ColumnType::Empty),
            })
            .collect();

        let quarantined = output.quality.quarantined();
        let shown = quarantined.len().min(MAX_QUARANTINE_ROWS);

        Self {
            output,
            columns,
            threshold_percent: format!("{:.0}", output.quality.threshold() * 100.0),
            quarantined: &quarantined[..shown],
            quarantine_total: quarantined.len(),
            accept: SpreadsheetFormat::accept_attribute(),
        }
    }
}

/// エラーページ
#[derive(Template)]
#[template(path = "error.html")]
pub(crate) struct ErrorTemplate<'a> {
    status: u16,
    message: &'a str,
    accept: String,
}

impl<'a> ErrorTemplate<'a> {
    pub(crate) fn new(status: u16, message: &'a str) -> Self {
        Self {
            status,
            message,
            accept: SpreadsheetFormat::accept_attribute(),
        }
    }
}
