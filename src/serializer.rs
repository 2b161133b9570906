//! Row Serializer Module
//!
//! テーブルの各行を、サニタイズ済み列名をキーとするJSONオブジェクトへ変換し、
//! 1行1レコードのJSONL形式で出力するモジュール。

use std::io::{self, Write};

use serde::ser::{SerializeMap, Serializer as _};
use serde_json::ser::{CompactFormatter, Formatter};
use serde_json::{Number, Value};
use tracing::warn;

use crate::api::{JsonStyle, NonFinitePolicy};
use crate::builder::ConversionConfig;
use crate::error::XlsxToJsonlError;
use crate::types::{CellValue, Table, MAX_SAFE_INTEGER};

/// `": "` と `", "` で区切るJSONフォーマッター
///
/// 出力例: `{"id": 1, "amount": 9.5}`
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

/// セル値をJSON値に変換する
///
/// # 変換規則
///
/// | セル値 | JSON |
/// | --- | --- |
/// | `Empty` | `null` |
/// | `Number` | 数値（±2^53以内の整数値は小数部なし） |
/// | `String` | 文字列（空文字列は `""` のまま） |
/// | `Bool` | 真偽値 |
/// | `DateTime` | 文字列（`DateFormat`に従う） |
/// | `Error` | エラーコードの文字列（例: `"#DIV/0!"`） |
///
/// # 戻り値
///
/// * `Ok(Value)` - 変換に成功した場合
/// * `Err(String)` - 非有限数値でNonFinitePolicy::Errorの場合（エラーメッセージ）
fn cell_to_json(cell: &CellValue, config: &ConversionConfig) -> Result<Value, String> {
    let value = match cell {
        CellValue::Empty => Value::Null,
        CellValue::Number(n) => {
            if !n.is_finite() {
                return match config.non_finite_policy {
                    NonFinitePolicy::Error => Err(format!("non-finite number {}", n)),
                    NonFinitePolicy::Null => Ok(Value::Null),
                };
            }
            if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                Value::Number(Number::from(*n as i64))
            } else {
                // 有限値のためNoneにはならない
                Number::from_f64(*n)
                    .map(Value::Number)
                    .ok_or_else(|| format!("non-finite number {}", n))?
            }
        }
        CellValue::String(s) => Value::String(s.clone()),
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::DateTime(dt) => {
            Value::String(dt.format(config.date_format.pattern()).to_string())
        }
        CellValue::Error(code) => Value::String(code.clone()),
    };
    Ok(value)
}

/// 行シリアライザー
///
/// テーブルとサニタイズ済み列名を受け取り、各行を1行のJSON文字列に変換します。
/// 同じテーブルから何度でも同一の結果を再生成できます（副作用なし）。
///
/// # 使用例
///
/// ```rust
/// use xlsxjsonl::{CellValue, ConverterBuilder, RowSerializer, Table};
///
/// # fn main() -> Result<(), xlsxjsonl::XlsxToJsonlError> {
/// let table = Table::new(
///     vec!["ID".to_string(), "Amount".to_string()],
///     vec![vec![CellValue::Number(1.0), CellValue::Number(9.5)]],
/// )?;
/// let names = vec!["id".to_string(), "amount".to_string()];
/// let converter = ConverterBuilder::new().build()?;
///
/// let serializer = RowSerializer::new(&table, &names, converter.config())?;
/// let lines: Vec<String> = serializer.lines().collect::<Result<_, _>>()?;
/// assert_eq!(lines, vec![r#"{"id": 1, "amount": 9.5}"#]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RowSerializer<'a> {
    table: &'a Table,
    names: &'a [String],
    config: &'a ConversionConfig,
}

impl<'a> RowSerializer<'a> {
    /// 新しいシリアライザーを生成
    ///
    /// # 戻り値
    ///
    /// * `Err(XlsxToJsonlError::Config)` - 列名の数がテーブルの列数と一致しない場合
    /// * `Err(XlsxToJsonlError::DuplicateColumn)` - 列名が重複している場合
    pub fn new(
        table: &'a Table,
        names: &'a [String],
        config: &'a ConversionConfig,
    ) -> Result<Self, XlsxToJsonlError> {
        if names.len() != table.column_count() {
            return Err(XlsxToJsonlError::Config(format!(
                "Column name count ({}) does not match table column count ({})",
                names.len(),
                table.column_count()
            )));
        }

        for (second, name) in names.iter().enumerate() {
            if let Some(first) = names[..second].iter().position(|other| other == name) {
                return Err(XlsxToJsonlError::DuplicateColumn {
                    name: name.clone(),
                    first,
                    second,
                });
            }
        }

        Ok(Self {
            table,
            names,
            config,
        })
    }

    /// 各行のJSON文字列を順に返すイテレーターを生成
    ///
    /// 呼び出すたびに先頭から新しいイテレーターを返します。
    pub fn lines(&self) -> JsonlLines<'a> {
        JsonlLines {
            serializer: *self,
            next_row: 0,
        }
    }

    /// すべての行をJSONLとして書き込む（各行の末尾に`\n`）
    ///
    /// # 戻り値
    ///
    /// * `Ok(usize)` - 書き込んだ行数
    /// * `Err(XlsxToJsonlError)` - エンコードまたはI/Oエラー
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, XlsxToJsonlError> {
        let mut count = 0;
        for line in self.lines() {
            let line = line?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            count += 1;
        }
        Ok(count)
    }

    /// 1行をJSON文字列に変換
    fn encode_row(&self, row_idx: usize) -> Result<String, XlsxToJsonlError> {
        let cells = &self.table.rows()[row_idx];

        let mut values = Vec::with_capacity(cells.len());
        for (name, cell) in self.names.iter().zip(cells) {
            let value = match cell_to_json(cell, self.config) {
                Ok(value) => value,
                Err(message) => {
                    return Err(XlsxToJsonlError::Encoding {
                        row: row_idx,
                        column: name.clone(),
                        message,
                    })
                }
            };
            if value.is_null() && matches!(cell, CellValue::Number(_)) {
                warn!(
                    "Row {}, column '{}': non-finite number replaced with null",
                    row_idx, name
                );
            }
            values.push(value);
        }

        let mut buffer = Vec::new();
        let written = match self.config.json_style {
            JsonStyle::Spaced => {
                let mut ser = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
                self.write_record(&mut ser, &values)
            }
            JsonStyle::Compact => {
                let mut ser = serde_json::Serializer::with_formatter(&mut buffer, CompactFormatter);
                self.write_record(&mut ser, &values)
            }
        };
        written.map_err(|e| XlsxToJsonlError::Encoding {
            row: row_idx,
            column: String::new(),
            message: e.to_string(),
        })?;

        String::from_utf8(buffer)
            .map_err(|e| XlsxToJsonlError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// 列順を保持したままJSONオブジェクトを書き出す
    fn write_record<W: Write, F: Formatter>(
        &self,
        ser: &mut serde_json::Serializer<W, F>,
        values: &[Value],
    ) -> Result<(), serde_json::Error> {
        let mut map = ser.serialize_map(Some(values.len()))?;
        for (name, value) in self.names.iter().zip(values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// JSONLの各行を遅延生成するイテレーター
///
/// 出力行数は常にテーブルのデータ行数と一致します。
#[derive(Debug, Clone)]
pub struct JsonlLines<'a> {
    serializer: RowSerializer<'a>,
    next_row: usize,
}

impl Iterator for JsonlLines<'_> {
    type Item = Result<String, XlsxToJsonlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.serializer.table.row_count() {
            return None;
        }
        let row_idx = self.next_row;
        self.next_row += 1;
        Some(self.serializer.encode_row(row_idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.serializer.table.row_count() - self.next_row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for JsonlLines<'_> {}
