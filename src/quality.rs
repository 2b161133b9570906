//! Data Quality Module
//!
//! テーブルの各列について、値の型を推定し、推定された型として解釈できない値を
//! 含む行を隔離リストとして報告するモジュール。
//!
//! このレポートは診断用で、JSONLの出力内容は変更しません。

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::error::XlsxToJsonlError;
use crate::preview::write_markdown_table;
use crate::types::{CellValue, Table};

/// 型推定のしきい値のデフォルト値
pub const DEFAULT_TYPE_THRESHOLD: f64 = 0.90;

/// 欠損値として扱う値（前後の空白を除き、小文字化して比較）
pub const JUNK_VALUES: [&str; 11] = [
    "na",
    "n/a",
    "#na",
    "null",
    "none",
    "pending",
    "unknown",
    "undefined",
    "--",
    "...",
    "",
];

const TRUE_VALUES: [&str; 7] = ["true", "1", "yes", "y", "t", "active", "on"];
const FALSE_VALUES: [&str; 7] = ["false", "0", "no", "n", "f", "inactive", "off"];

/// この文字数以上の文字列は日付として解釈しない
const MAX_DATE_TEXT_LEN: usize = 30;

const DATETIME_PATTERNS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_PATTERNS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// 推定された列の型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// 欠損値のみ
    Empty,
    /// 真偽値（`yes`/`no`、`1`/`0`などを含む）
    Boolean,
    /// 整数
    Integer,
    /// 浮動小数点数
    Float,
    /// 日時
    DateTime,
    /// 文字列
    String,
}

impl ColumnType {
    /// 型名（`INTEGER`など）
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Empty => "EMPTY",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::DateTime => "DATETIME",
            ColumnType::String => "STRING",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 列ごとの推定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    /// 列インデックス（0始まり）
    pub index: usize,
    /// 元の列名
    pub name: String,
    /// 推定された型
    pub inferred_type: ColumnType,
    /// 欠損値を除いた値の数
    pub non_missing: usize,
    /// 欠損値として扱った値の数（空セルを除く）
    pub junk: usize,
    /// 推定された型として解釈できなかった値の数
    pub failed: usize,
}

/// 隔離された値
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantineIssue {
    /// 元の列名
    pub column: String,
    /// 元の値（表示用文字列）
    pub value: String,
    /// 推定された型
    pub expected: ColumnType,
}

/// 解釈できない値を1つ以上含む行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantinedRow {
    /// データ行インデックス（0始まり、ヘッダー行を含まない）
    pub row: usize,
    /// 列順の問題一覧
    pub issues: Vec<QuarantineIssue>,
}

impl QuarantinedRow {
    /// 問題の要約
    ///
    /// 例: `Column 'Amount': Value 'abc' (Failed to parse as INTEGER)`
    pub fn reason(&self) -> String {
        self.issues
            .iter()
            .map(|issue| {
                format!(
                    "Column '{}': Value '{}' (Failed to parse as {})",
                    issue.column, issue.value, issue.expected
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// データ品質レポート
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    threshold: f64,
    columns: Vec<ColumnProfile>,
    quarantined: Vec<QuarantinedRow>,
}

impl QualityReport {
    /// テーブルを解析してレポートを生成
    ///
    /// 各列について、欠損値（空セルと[`JUNK_VALUES`]）を除いた値のうち
    /// `threshold`以上の割合が解釈できる型を、真偽値・数値・日時の順に採用します。
    /// どれにも当てはまらない列は`STRING`になります。
    ///
    /// # 引数
    ///
    /// * `table` - 解析対象のテーブル
    /// * `threshold` - 型を採用するために必要な解釈成功率（0より大きく1以下）
    /// * `date_pattern` - 日付セルを表示用文字列にする際のchronoフォーマット
    pub fn analyze(table: &Table, threshold: f64, date_pattern: &str) -> Self {
        let mut columns = Vec::with_capacity(table.column_count());
        let mut quarantined: BTreeMap<usize, Vec<QuarantineIssue>> = BTreeMap::new();

        for (index, name) in table.headers().iter().enumerate() {
            let values: Vec<(usize, &CellValue, String)> = table
                .rows()
                .iter()
                .enumerate()
                .filter_map(|(row_idx, row)| {
                    let cell = &row[index];
                    if cell.is_empty() {
                        return None;
                    }
                    Some((row_idx, cell, cell.to_display_string(date_pattern)))
                })
                .collect();

            let present: Vec<&(usize, &CellValue, String)> =
                values.iter().filter(|(_, _, text)| !is_junk(text)).collect();
            let junk = values.len() - present.len();

            let inferred_type = infer_type(
                present.iter().map(|(_, cell, text)| (*cell, text.as_str())),
                threshold,
            );

            let mut failed = 0;
            for (row_idx, cell, text) in &present {
                if !parses_as(inferred_type, cell, text) {
                    failed += 1;
                    quarantined.entry(*row_idx).or_default().push(QuarantineIssue {
                        column: name.clone(),
                        value: text.clone(),
                        expected: inferred_type,
                    });
                }
            }

            debug!(
                "Column '{}' inferred as {} ({} values, {} junk, {} failed)",
                name,
                inferred_type,
                present.len(),
                junk,
                failed
            );

            columns.push(ColumnProfile {
                index,
                name: name.clone(),
                inferred_type,
                non_missing: present.len(),
                junk,
                failed,
            });
        }

        Self {
            threshold,
            columns,
            quarantined: quarantined
                .into_iter()
                .map(|(row, issues)| QuarantinedRow { row, issues })
                .collect(),
        }
    }

    /// 使用したしきい値
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 列ごとの推定結果（列順）
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    /// 隔離された行（行順）
    pub fn quarantined(&self) -> &[QuarantinedRow] {
        &self.quarantined
    }

    /// 指定した列の推定型
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).map(|column| column.inferred_type)
    }

    /// 型の推定結果をMarkdownテーブルとして出力
    pub fn render_markdown<W: Write>(&self, writer: &mut W) -> Result<(), XlsxToJsonlError> {
        let headers = ["Column", "Type", "Values", "Junk", "Failed"].map(String::from);
        let rows: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|column| {
                vec![
                    column.name.clone(),
                    column.inferred_type.to_string(),
                    column.non_missing.to_string(),
                    column.junk.to_string(),
                    column.failed.to_string(),
                ]
            })
            .collect();

        write_markdown_table(writer, &headers, &rows)
    }
}

/// 欠損値として扱う値か
pub fn is_junk(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    JUNK_VALUES.contains(&normalized.as_str())
}

fn infer_type<'a, I>(values: I, threshold: f64) -> ColumnType
where
    I: Iterator<Item = (&'a CellValue, &'a str)> + Clone,
{
    let total = values.clone().count();
    if total == 0 {
        return ColumnType::Empty;
    }

    if values.clone().all(|(_, text)| parse_bool(text).is_some()) {
        return ColumnType::Boolean;
    }

    let numbers: Vec<f64> = values
        .clone()
        .filter_map(|(cell, text)| parse_number(cell, text))
        .collect();
    if ratio(numbers.len(), total) >= threshold {
        return if numbers.iter().all(|n| n.fract() == 0.0) {
            ColumnType::Integer
        } else {
            ColumnType::Float
        };
    }

    let dates = values
        .filter(|(cell, text)| parse_datetime(cell, text).is_some())
        .count();
    if ratio(dates, total) >= threshold {
        return ColumnType::DateTime;
    }

    ColumnType::String
}

fn ratio(parsed: usize, total: usize) -> f64 {
    parsed as f64 / total as f64
}

/// 推定型として解釈できる値か
fn parses_as(column_type: ColumnType, cell: &CellValue, text: &str) -> bool {
    match column_type {
        ColumnType::Empty | ColumnType::String => true,
        ColumnType::Boolean => parse_bool(text).is_some(),
        ColumnType::Integer | ColumnType::Float => parse_number(cell, text).is_some(),
        ColumnType::DateTime => parse_datetime(cell, text).is_some(),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let normalized = text.trim().to_lowercase();
    if TRUE_VALUES.contains(&normalized.as_str()) {
        Some(true)
    } else if FALSE_VALUES.contains(&normalized.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// 数値として解釈
///
/// 文字列は通貨記号（`$`、`€`）・桁区切り・空白を除き、
/// 会計形式の`(100.50)`は`-100.50`として扱います。
fn parse_number(cell: &CellValue, text: &str) -> Option<f64> {
    match cell {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::String(_) => {
            let cleaned: String = text
                .chars()
                .filter(|ch| !matches!(ch, '$' | '€' | ',') && !ch.is_whitespace())
                .collect();
            let signed = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
                Some(inner) => format!("-{}", inner),
                None => cleaned,
            };
            signed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// 日時として解釈
fn parse_datetime(cell: &CellValue, text: &str) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(_) => {
            let text = text.trim();
            if text.chars().count() >= MAX_DATE_TEXT_LEN {
                return None;
            }
            DATETIME_PATTERNS
                .iter()
                .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
                .or_else(|| {
                    DATE_PATTERNS
                        .iter()
                        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}
