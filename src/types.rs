//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::XlsxToJsonlError;

/// 小数部なしの整数として出力できる絶対値の上限（2^53）
///
/// これを超える値はf64で正確に表現できないため、浮動小数点数として出力します。
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// セルの値を表す列挙型
///
/// スプレッドシートのセルは同じ列でも行ごとに異なる型を持ち得るため、
/// 暗黙の型変換に頼らず、タグ付きの値として保持します。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列（空文字列 `""` を含む）
    String(String),

    /// 論理値
    Bool(bool),

    /// 日時
    DateTime(NaiveDateTime),

    /// エラー値（例: `#DIV/0!`）
    Error(String),

    /// 空セル（値なし）
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空文字列のセルは空セルではありません。
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 値を表示用の文字列に変換（ヘッダー名、プレビュー用）
    ///
    /// 整数値の数値は小数部なし、論理値は`TRUE`/`FALSE`、日時は`date_pattern`で整形します。
    pub fn to_display_string(&self, date_pattern: &str) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => dt.format(date_pattern).to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// 数値を文字列に変換（整数値は小数部なし）
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 解析済みのテーブル
///
/// 先頭行をヘッダー、残りの行をデータとして保持します。
/// すべての行はヘッダーと同じ列数を持ちます（構築時に不足分を`Empty`で補完）。
/// 構築後は変更できません。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// 新しいテーブルを生成
    ///
    /// # 戻り値
    ///
    /// * `Ok(Table)` - 生成に成功した場合
    /// * `Err(XlsxToJsonlError::Config)` - ヘッダーより多くのセルを持つ行が存在する場合
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, XlsxToJsonlError> {
        let width = headers.len();
        let mut normalized = Vec::with_capacity(rows.len());

        for (row_idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(XlsxToJsonlError::Config(format!(
                    "Row {} has {} cells but the header has {} columns",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            row.resize(width, CellValue::Empty);
            normalized.push(row);
        }

        Ok(Self {
            headers,
            rows: normalized,
        })
    }

    /// 列名（生の値）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// データ行
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// 列数
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// データ行数（ヘッダー行を含まない）
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 元の列名とサニタイズ後の列名の対応
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    /// 列インデックス（0始まり）
    pub index: usize,
    /// 元の列名
    pub original: String,
    /// サニタイズ後の列名
    pub sanitized: String,
}
