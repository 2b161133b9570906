//! Workbook Parser
//!
//! calamineのワークブックをラップし、選択したシートを[`Table`]へ変換します。

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Sheets, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::api::SheetSelector;
use crate::error::XlsxToJsonlError;
use crate::parser::SpreadsheetFormat;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Table};

/// ワークブックパーサー
///
/// 入力全体をメモリ上に保持したcalamineのワークブックです。
pub(crate) struct WorkbookParser {
    workbook: Sheets<Cursor<Vec<u8>>>,
    format: SpreadsheetFormat,
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// 形式を判定し、XLSXの場合はcalamineで展開する前にZIPアーカイブを検査します。
    ///
    /// # 引数
    ///
    /// * `file_name` - 元のファイル名（拡張子の判定に使用、不明な場合は`None`）
    /// * `data` - ファイルの内容
    /// * `security` - セキュリティ設定
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - 読み込みに成功した場合
    /// * `Err(XlsxToJsonlError::UnsupportedFormat)` - XLSX/XLS以外の形式の場合
    /// * `Err(XlsxToJsonlError::SecurityViolation)` - セキュリティ制限に違反した場合
    /// * `Err(XlsxToJsonlError::Parse)` - ワークブックとして解析できない場合
    pub fn open(
        file_name: Option<&str>,
        data: Vec<u8>,
        security: &SecurityConfig,
    ) -> Result<Self, XlsxToJsonlError> {
        security.check_input_size(data.len() as u64)?;

        let format = SpreadsheetFormat::detect(file_name, &data)?;
        debug!("Detected {} input ({} bytes)", format, data.len());

        let workbook = match format {
            SpreadsheetFormat::Xlsx => {
                security.inspect_archive(Cursor::new(data.as_slice()))?;
                let workbook: Xlsx<_> =
                    open_workbook_from_rs(Cursor::new(data)).map_err(calamine::Error::Xlsx)?;
                Sheets::Xlsx(workbook)
            }
            SpreadsheetFormat::Xls => {
                let workbook: Xls<_> =
                    open_workbook_from_rs(Cursor::new(data)).map_err(calamine::Error::Xls)?;
                Sheets::Xls(workbook)
            }
        };

        Ok(Self { workbook, format })
    }

    /// 判定されたファイル形式
    pub fn format(&self) -> SpreadsheetFormat {
        self.format
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシート名を決定
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 選択されたシート名
    /// * `Err(XlsxToJsonlError::ParseMessage)` - ワークブックにシートが存在しない場合
    /// * `Err(XlsxToJsonlError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, XlsxToJsonlError> {
        let names = self.sheet_names();
        if names.is_empty() {
            return Err(XlsxToJsonlError::ParseMessage(
                "Workbook contains no sheets".to_string(),
            ));
        }

        match selector {
            SheetSelector::First => Ok(names[0].clone()),
            SheetSelector::Index(index) => names.get(*index).cloned().ok_or_else(|| {
                XlsxToJsonlError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    names.len()
                ))
            }),
            SheetSelector::Name(name) => {
                if names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(XlsxToJsonlError::Config(format!("Sheet '{}' not found", name)))
                }
            }
        }
    }

    /// シートを読み込み、テーブルへ変換
    ///
    /// 使用範囲の先頭行をヘッダー、残りをデータ行とします。
    /// すべてのセルが空の行は読み飛ばします。
    ///
    /// # 引数
    ///
    /// * `sheet_name` - 読み込むシート名
    /// * `date_pattern` - 日付型のヘッダーセルを文字列化する際のchronoフォーマット
    pub fn read_table(
        &mut self,
        sheet_name: &str,
        date_pattern: &str,
    ) -> Result<Table, XlsxToJsonlError> {
        let range = self.workbook.worksheet_range(sheet_name)?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            debug!("Sheet '{}' is empty", sheet_name);
            return Ok(Table::default());
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| convert_cell(cell).to_display_string(date_pattern))
            .collect();

        let mut data_rows = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
            if cells.iter().all(CellValue::is_empty) {
                skipped += 1;
                continue;
            }
            data_rows.push(cells);
        }

        debug!(
            "Sheet '{}': {} columns, {} data rows ({} blank rows skipped)",
            sheet_name,
            headers.len(),
            data_rows.len(),
            skipped
        );

        Table::new(headers, data_rows)
    }
}

/// calamineのセル値を[`CellValue`]へ変換
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                CellValue::Number(dt.as_f64())
            } else {
                match dt.as_datetime() {
                    Some(datetime) => CellValue::DateTime(datetime),
                    None => CellValue::Number(dt.as_f64()),
                }
            }
        }
        Data::DateTimeIso(s) => match parse_iso_datetime(s) {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::String(s.clone()),
        },
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

/// ISO 8601形式の日時文字列（日付のみも可）を解析
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
