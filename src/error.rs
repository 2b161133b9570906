//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxjsonlクレート全体で使用するエラー型
///
/// スプレッドシートの読み込み、ヘッダーのサニタイズ、JSONLへの変換処理中に
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー
/// - `UnsupportedFormat`: 拡張子または内容がXLSX/XLSとして認識できない
/// - `Parse` / `ParseMessage`: スプレッドシートをテーブルとして解析できない
/// - `Config`: 設定の検証に失敗したエラー
/// - `DuplicateColumn`: サニタイズ後の列名が衝突した（`CollisionPolicy::Error`の場合）
/// - `Encoding`: セル値をJSONとして表現できない（NaN、Infinityなど）
/// - `SecurityViolation`: 入力サイズやZIP構造のセキュリティ制限に違反した
///
/// ヘッダー行のみでデータ行が0件のファイルはエラーではありません（0行のJSONLを出力します）。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxjsonl::XlsxToJsonlError;
/// use std::fs::File;
///
/// fn open_upload(path: &str) -> Result<File, XlsxToJsonlError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxToJsonlError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// サポートされていないファイル形式
    ///
    /// 拡張子が`xlsx`/`xls`以外の場合、またはファイルの先頭バイトが
    /// 拡張子と一致しない場合に発生します。部分的な出力は生成されません。
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// スプレッドシートの解析中に発生したエラー（calamine由来）
    ///
    /// 破損したファイル、サポートされていない内部構造などが原因となります。
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// calamine以外で検出された解析エラー（シートが存在しないワークブックなど）
    #[error("Failed to parse spreadsheet: {0}")]
    ParseMessage(String),

    /// ZIPアーカイブの解析エラー
    ///
    /// XLSXファイル（ZIPアーカイブ）の事前検査中に発生したエラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時の検証失敗、存在しないシートの指定、
    /// 列数と列名数の不一致などで発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use xlsxjsonl::{ConverterBuilder, XlsxToJsonlError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_preview_rows(0)  // 無効なプレビュー行数
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxToJsonlError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// サニタイズ後の列名の衝突
    ///
    /// `CollisionPolicy::Error`が指定されている場合に、2つの列が同じ名前に
    /// サニタイズされたときに発生します。`first`と`second`は0始まりの列インデックスです。
    #[error("Duplicate column name '{name}' after sanitization (columns {first} and {second})")]
    DuplicateColumn {
        /// 衝突したサニタイズ済み列名
        name: String,
        /// 最初に現れた列のインデックス
        first: usize,
        /// 衝突した列のインデックス
        second: usize,
    },

    /// セル値をJSONとして表現できないエラー
    ///
    /// NaNやInfinityなどの非有限数値が含まれる場合に発生します。
    /// `NonFinitePolicy::Null`を指定すると、エラーの代わりに`null`へ置換されます。
    /// `row`は0始まりのデータ行インデックス（ヘッダー行を含まない）です。
    #[error("Cannot encode row {row}, column '{column}' as JSON: {message}")]
    Encoding {
        /// データ行インデックス（0始まり）
        row: usize,
        /// サニタイズ済み列名
        column: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
