//! Parser Module
//!
//! calamineを使用したスプレッドシート解析の実装。
//! ファイル形式の判定と、先頭行をヘッダーとするテーブルの抽出を提供します。

mod format;
mod workbook;

pub use format::SpreadsheetFormat;
pub(crate) use workbook::WorkbookParser;
