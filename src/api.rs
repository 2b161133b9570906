//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// シート選択方式
///
/// 変換対象のシートを選択する方法を指定します。
/// JSONLは1つのテーブルを表すため、常に1シートのみを変換します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// 最初のシート（デフォルト）
    #[default]
    First,

    /// インデックス指定（0始まり）
    ///
    /// 例: `SheetSelector::Index(1)` は2番目のシートを選択
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Sales".to_string())`
    Name(String),
}

/// サニタイズ後の列名が衝突した場合の処理方針
///
/// 例えば `"Revenue (USD)"` と `"Revenue USD"` はどちらも `"revenue_usd"` になります。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollisionPolicy {
    /// 連番の接尾辞を付与する（デフォルト）
    ///
    /// 最初に現れた列は名前をそのまま保持し、2つ目以降には `_2`、`_3` … を付与します。
    /// 付与する接尾辞は、ヘッダー行のどの列名とも重複しない最小の番号です。
    ///
    /// ```text
    /// ["Revenue (USD)", "Revenue USD", "revenue_usd_2"]
    ///   -> ["revenue_usd", "revenue_usd_3", "revenue_usd_2"]
    /// ```
    #[default]
    Suffix,

    /// `XlsxToJsonlError::DuplicateColumn` を返して変換を中止する
    Error,
}

/// 非有限数値（NaN、Infinity）の処理方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum NonFinitePolicy {
    /// `XlsxToJsonlError::Encoding` を返してファイル全体の変換を中止する（デフォルト）
    #[default]
    Error,

    /// JSONの `null` に置換して変換を継続する
    Null,
}

/// JSONL各行の区切り文字スタイル
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum JsonStyle {
    /// `": "` と `", "` で区切る（デフォルト）
    ///
    /// 例: `{"id": 1, "amount": 9.5}`
    #[default]
    Spaced,

    /// 空白なし
    ///
    /// 例: `{"id":1,"amount":9.5}`
    Compact,
}

/// 日付の出力形式
///
/// 日付セルをJSON文字列に変換する際の形式を指定します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// ISO 8601形式（ミリ秒付き）
    ///
    /// 例: `2025-11-20T00:00:00.000`
    #[default]
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxjsonl::{ConverterBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), xlsxjsonl::XlsxToJsonlError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y-%m-%d".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

impl DateFormat {
    /// chronoのフォーマット文字列を取得
    pub(crate) fn pattern(&self) -> &str {
        match self {
            DateFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3f",
            DateFormat::Custom(format_str) => format_str,
        }
    }
}
