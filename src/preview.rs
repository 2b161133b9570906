//! Preview Module
//!
//! 変換前のテーブル先頭行を、人が確認するための表形式で提供するモジュール。
//! プレビューはJSONL出力には含まれません。

use std::io::Write;

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::error::XlsxToJsonlError;
use crate::types::Table;

/// テーブル先頭N行のプレビュー
///
/// 列名はサニタイズ前の元の値、セルは表示用の文字列です。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Preview {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    total_rows: usize,
}

impl Preview {
    /// テーブルからプレビューを生成
    ///
    /// # 引数
    ///
    /// * `table` - 元のテーブル
    /// * `limit` - プレビューに含める最大行数
    /// * `date_pattern` - 日付セルのchronoフォーマット
    pub(crate) fn from_table(table: &Table, limit: usize, date_pattern: &str) -> Self {
        let rows = table
            .rows()
            .iter()
            .take(limit)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_display_string(date_pattern))
                    .collect()
            })
            .collect();

        Self {
            headers: table.headers().to_vec(),
            rows,
            total_rows: table.row_count(),
        }
    }

    /// 元の列名
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// プレビュー行（表示用文字列）
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// テーブル全体のデータ行数
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// プレビューに含まれない行があるか
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total_rows
    }

    /// Markdownテーブルとして出力
    ///
    /// 列幅は表示幅（全角文字は2）で揃え、最小幅は3文字です。
    /// 列が存在しない場合は何も出力しません。
    pub fn render_markdown<W: Write>(&self, writer: &mut W) -> Result<(), XlsxToJsonlError> {
        write_markdown_table(writer, &self.headers, &self.rows)
    }

    /// Markdownテーブルを文字列として取得
    pub fn to_markdown(&self) -> Result<String, XlsxToJsonlError> {
        let mut buffer = Vec::new();
        self.render_markdown(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            XlsxToJsonlError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Markdownテーブルを出力
///
/// 列幅は表示幅で揃え、最小幅は3文字です。列がない場合は何も出力しません。
pub(crate) fn write_markdown_table<W: Write>(
    writer: &mut W,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<(), XlsxToJsonlError> {
    if headers.is_empty() {
        return Ok(());
    }

    let header_cells: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
        .collect();

    let mut widths = vec![3; header_cells.len()];
    for row in std::iter::once(&header_cells).chain(body.iter()) {
        for (col_idx, cell) in row.iter().enumerate() {
            widths[col_idx] = widths[col_idx].max(cell.width());
        }
    }

    write_markdown_row(writer, &header_cells, &widths)?;
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    writeln!(writer, "|{}|", separator.join("|"))?;
    for row in &body {
        write_markdown_row(writer, row, &widths)?;
    }

    writer.flush()?;
    Ok(())
}

/// Markdownの1行を出力（セルは左揃え）
fn write_markdown_row<W: Write>(
    writer: &mut W,
    cells: &[String],
    widths: &[usize],
) -> Result<(), XlsxToJsonlError> {
    write!(writer, "|")?;
    for (cell, &width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(cell.width());
        write!(writer, " {}{} |", cell, " ".repeat(padding))?;
    }
    writeln!(writer)?;
    Ok(())
}

/// セル内容をMarkdownテーブル用にエスケープ
fn escape_cell(content: &str) -> String {
    content
        .trim()
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn sample_table() -> Table {
        Table::new(
            vec!["ID".to_string(), "Customer Name".to_string()],
            vec![
                vec![CellValue::Number(1.0), CellValue::from("山田")],
                vec![CellValue::Number(2.0), CellValue::from("Lee")],
                vec![CellValue::Number(3.0), CellValue::Empty],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_table_limits_rows() {
        let preview = Preview::from_table(&sample_table(), 2, "%Y-%m-%d");
        assert_eq!(preview.headers(), ["ID", "Customer Name"]);
        assert_eq!(preview.rows().len(), 2);
        assert_eq!(preview.rows()[0], vec!["1", "山田"]);
        assert_eq!(preview.total_rows(), 3);
        assert!(preview.is_truncated());
    }

    #[test]
    fn test_from_table_shorter_than_limit() {
        let preview = Preview::from_table(&sample_table(), 10, "%Y-%m-%d");
        assert_eq!(preview.rows().len(), 3);
        assert_eq!(preview.rows()[2], vec!["3", ""]);
        assert!(!preview.is_truncated());
    }

    #[test]
    fn test_render_markdown() {
        let preview = Preview::from_table(&sample_table(), 2, "%Y-%m-%d");
        let markdown = preview.to_markdown().unwrap();
        let lines: Vec<&str> = markdown.lines().collect();

        assert_eq!(lines[0], "| ID  | Customer Name |");
        assert_eq!(lines[1], "|-----|---------------|");
        // 全角文字は表示幅2として揃える
        assert_eq!(lines[2], "| 1   | 山田          |");
        assert_eq!(lines[3], "| 2   | Lee           |");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_render_markdown_escapes_pipes() {
        let table = Table::new(
            vec!["a|b".to_string()],
            vec![vec![CellValue::from("line1\nline2")]],
        )
        .unwrap();
        let markdown = Preview::from_table(&table, 5, "%Y").to_markdown().unwrap();

        assert!(markdown.starts_with("| a\\|b |"));
        assert!(markdown.contains("line1 line2"));
    }

    #[test]
    fn test_render_markdown_empty() {
        let preview = Preview::from_table(&Table::default(), 5, "%Y");
        assert_eq!(preview.to_markdown().unwrap(), "");
    }

    #[test]
    fn test_serialize() {
        let preview = Preview::from_table(&sample_table(), 1, "%Y");
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["headers"][1], "Customer Name");
        assert_eq!(json["rows"][0][0], "1");
        assert_eq!(json["total_rows"], 3);
    }
}
