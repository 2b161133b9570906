//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::io::{Read, Write};

use chrono::format::{Item, StrftimeItems};
use serde::Serialize;
use tracing::{debug, info};

use crate::api::{CollisionPolicy, DateFormat, JsonStyle, NonFinitePolicy, SheetSelector};
use crate::error::XlsxToJsonlError;
use crate::output::jsonl_file_name;
use crate::parser::WorkbookParser;
use crate::preview::Preview;
use crate::quality::{QualityReport, DEFAULT_TYPE_THRESHOLD};
use crate::sanitize::HeaderSanitizer;
use crate::security::SecurityConfig;
use crate::serializer::RowSerializer;
use crate::types::{ColumnMapping, Table};

/// プレビュー行数のデフォルト値
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// 入力ファイルサイズ上限のデフォルト値（2GB）
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 2_147_483_648;

/// 変換処理の設定
///
/// 通常は[`ConverterBuilder`]を通じて構築します。
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 列名衝突時の処理方針
    pub collision_policy: CollisionPolicy,

    /// 非有限数値の処理方針
    pub non_finite_policy: NonFinitePolicy,

    /// JSONL各行の区切りスタイル
    pub json_style: JsonStyle,

    /// 日付形式
    pub date_format: DateFormat,

    /// プレビューに含める行数
    pub preview_rows: usize,

    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_size: u64,

    /// データ品質レポートで列の型を採用するしきい値
    pub type_threshold: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::First,
            collision_policy: CollisionPolicy::Suffix,
            non_finite_policy: NonFinitePolicy::Error,
            json_style: JsonStyle::Spaced,
            date_format: DateFormat::Iso8601,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            type_threshold: DEFAULT_TYPE_THRESHOLD,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use xlsxjsonl::{CollisionPolicy, ConverterBuilder, SheetSelector};
///
/// # fn main() -> Result<(), xlsxjsonl::XlsxToJsonlError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("Orders".to_string()))
///     .with_collision_policy(CollisionPolicy::Error)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: 最初のシート
    /// - 列名衝突: 連番の接尾辞を付与
    /// - 非有限数値: エラー
    /// - 区切りスタイル: `": "` / `", "`
    /// - 日付形式: ISO 8601（ミリ秒付き）
    /// - プレビュー行数: 5
    /// - 入力ファイルサイズ上限: 2GB
    /// - 型推定のしきい値: 0.90
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// 変換対象のシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxjsonl::{ConverterBuilder, SheetSelector};
    ///
    /// // 2番目のシート
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Index(1));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// サニタイズ後の列名が衝突した場合の処理方針を指定する
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    /// 非有限数値（NaN、Infinity）の処理方針を指定する
    pub fn with_non_finite_policy(mut self, policy: NonFinitePolicy) -> Self {
        self.config.non_finite_policy = policy;
        self
    }

    /// JSONL各行の区切りスタイルを指定する
    pub fn with_json_style(mut self, style: JsonStyle) -> Self {
        self.config.json_style = style;
        self
    }

    /// 日付の出力形式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxjsonl::{ConverterBuilder, DateFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%Y/%m/%d".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// プレビューに含める行数を指定する（1以上）
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.config.preview_rows = rows;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.max_input_size = bytes;
        self
    }

    /// データ品質レポートの型推定しきい値を指定する（0より大きく1以下）
    ///
    /// 欠損値を除いた値のうち、この割合以上を解釈できた型が列の型になります。
    /// JSONLの出力内容には影響しません。
    pub fn with_type_threshold(mut self, threshold: f64) -> Self {
        self.config.type_threshold = threshold;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)`: 設定が有効な場合
    /// * `Err(XlsxToJsonlError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * プレビュー行数が0
    /// * 入力ファイルサイズ上限が0
    /// * カスタム日付形式が空、または不正な書式指定子を含む
    /// * 型推定のしきい値が0以下、1より大きい、または有限でない
    pub fn build(self) -> Result<Converter, XlsxToJsonlError> {
        if self.config.preview_rows == 0 {
            return Err(XlsxToJsonlError::Config(
                "Preview rows must be greater than 0".to_string(),
            ));
        }

        if self.config.max_input_size == 0 {
            return Err(XlsxToJsonlError::Config(
                "Maximum input size must be greater than 0".to_string(),
            ));
        }

        let threshold = self.config.type_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(XlsxToJsonlError::Config(format!(
                "Type threshold must be in (0, 1], got {}",
                threshold
            )));
        }

        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            let has_error = StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error));
            if format_str.is_empty() || has_error {
                return Err(XlsxToJsonlError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        Ok(Converter::new(self.config))
    }
}

/// 変換結果の概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// 変換したシート名
    pub sheet_name: String,
    /// 出力した行数（データ行数と一致）
    pub row_count: usize,
    /// 列名の対応表
    pub columns: Vec<ColumnMapping>,
}

/// 変換せずに読み込んだシートの概要（プレビュー用）
///
/// JSONLのシリアライズを行わないため、非有限数値を含むシートでも生成できます。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    /// 読み込んだシート名
    pub sheet_name: String,
    /// データ行数
    pub row_count: usize,
    /// 列名の対応表
    pub columns: Vec<ColumnMapping>,
    /// 先頭N行のプレビュー
    pub preview: Preview,
    /// データ品質レポート
    pub quality: QualityReport,
}

/// メモリ上での変換結果（Webアップロード用）
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    /// ダウンロード用のファイル名（`<stem>.jsonl`）
    pub file_name: String,
    /// JSONL文書
    pub jsonl: String,
    /// 変換の概要
    pub summary: ConversionSummary,
    /// 変換前のプレビュー
    pub preview: Preview,
    /// データ品質レポート（出力内容には影響しない）
    pub quality: QualityReport,
}

/// 選択されたシートの読み込み結果
struct LoadedSheet {
    sheet_name: String,
    table: Table,
}

/// 変換処理のファサード
///
/// スプレッドシートをJSONL形式に変換するためのメインエントリーポイントです。
/// 変換は同期的にメモリ上で行われ、状態を共有しないため、
/// 同じインスタンスを複数のスレッドから利用できます。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use xlsxjsonl::ConverterBuilder;
///
/// # fn main() -> Result<(), xlsxjsonl::XlsxToJsonlError> {
/// let converter = ConverterBuilder::new().build()?;
/// let input = File::open("orders.xlsx")?;
/// let output = File::create("orders.jsonl")?;
/// let summary = converter.convert(Some("orders.xlsx"), input, output)?;
/// println!("{} rows", summary.row_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConversionConfig,
    sanitizer: HeaderSanitizer,
    security: SecurityConfig,
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        let security = SecurityConfig {
            max_input_file_size: config.max_input_size,
            ..SecurityConfig::default()
        };
        Self {
            sanitizer: HeaderSanitizer::new(config.collision_policy),
            security,
            config,
        }
    }

    /// 変換設定
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// スプレッドシートを読み込み、選択されたシートをテーブルとして返す
    ///
    /// # 引数
    ///
    /// * `file_name` - 元のファイル名（拡張子による形式判定に使用、不明な場合は`None`）
    /// * `input` - スプレッドシートを読み込むためのリーダー
    pub fn load_table<R: Read>(
        &self,
        file_name: Option<&str>,
        input: R,
    ) -> Result<Table, XlsxToJsonlError> {
        Ok(self.load(file_name, read_limited(input, self.config.max_input_size)?)?.table)
    }

    /// テーブルのヘッダーから列名の対応表を生成
    ///
    /// # 戻り値
    ///
    /// * `Err(XlsxToJsonlError::DuplicateColumn)` - `CollisionPolicy::Error`で衝突が検出された場合
    pub fn column_mappings(&self, table: &Table) -> Result<Vec<ColumnMapping>, XlsxToJsonlError> {
        let sanitized = self.sanitizer.sanitize_headers(table.headers())?;
        Ok(table
            .headers()
            .iter()
            .zip(sanitized)
            .enumerate()
            .map(|(index, (original, sanitized))| ColumnMapping {
                index,
                original: original.clone(),
                sanitized,
            })
            .collect())
    }

    /// スプレッドシートをJSONL形式に変換
    ///
    /// 文書全体をメモリ上で生成してから出力するため、
    /// エラーが発生した場合は`output`に何も書き込まれません。
    ///
    /// # 引数
    ///
    /// * `file_name` - 元のファイル名（不明な場合は`None`）
    /// * `input` - スプレッドシートを読み込むためのリーダー
    /// * `output` - JSONL出力先のライター
    ///
    /// # 処理フロー
    ///
    /// 1. 入力の読み込みとセキュリティ検査
    /// 2. 形式判定とシート選択
    /// 3. ヘッダーのサニタイズ
    /// 4. 各行のJSON化
    /// 5. 出力とフラッシュ
    pub fn convert<R: Read, W: Write>(
        &self,
        file_name: Option<&str>,
        input: R,
        mut output: W,
    ) -> Result<ConversionSummary, XlsxToJsonlError> {
        let data = read_limited(input, self.config.max_input_size)?;
        let loaded = self.load(file_name, data)?;
        let (jsonl, summary) = self.render(&loaded)?;

        output.write_all(jsonl.as_bytes())?;
        output.flush()?;

        Ok(summary)
    }

    /// スプレッドシートをJSONL形式の文字列に変換
    pub fn convert_to_string<R: Read>(
        &self,
        file_name: Option<&str>,
        input: R,
    ) -> Result<String, XlsxToJsonlError> {
        let data = read_limited(input, self.config.max_input_size)?;
        let loaded = self.load(file_name, data)?;
        Ok(self.render(&loaded)?.0)
    }

    /// アップロードされたバイト列を変換し、JSONL・列対応表・プレビュー・品質レポートをまとめて返す
    ///
    /// # 引数
    ///
    /// * `file_name` - アップロード時のファイル名
    /// * `data` - ファイルの内容
    pub fn convert_bytes(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<ConversionOutput, XlsxToJsonlError> {
        let loaded = self.load(Some(file_name), data)?;
        let (jsonl, summary) = self.render(&loaded)?;

        Ok(ConversionOutput {
            file_name: jsonl_file_name(file_name),
            jsonl,
            summary,
            preview: self.preview_of(&loaded.table),
            quality: self.quality_report(&loaded.table),
        })
    }

    /// アップロードされたバイト列を読み込み、JSONLに変換せずに概要を返す
    ///
    /// 列名の対応表・プレビュー・データ品質レポートを含みます。
    /// 行のシリアライズを行わないため、非有限数値を含むシートでも成功します。
    pub fn inspect_bytes(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Inspection, XlsxToJsonlError> {
        let loaded = self.load(Some(file_name), data)?;
        let columns = self.column_mappings(&loaded.table)?;

        Ok(Inspection {
            row_count: loaded.table.row_count(),
            columns,
            preview: self.preview_of(&loaded.table),
            quality: self.quality_report(&loaded.table),
            sheet_name: loaded.sheet_name,
        })
    }

    /// テーブルのデータ品質レポートを生成
    ///
    /// 型推定のしきい値は`type_threshold`を使用します。
    pub fn quality_report(&self, table: &Table) -> QualityReport {
        QualityReport::analyze(
            table,
            self.config.type_threshold,
            self.config.date_format.pattern(),
        )
    }

    /// 先頭N行のプレビューを生成（N = `preview_rows`）
    pub fn preview<R: Read>(
        &self,
        file_name: Option<&str>,
        input: R,
    ) -> Result<Preview, XlsxToJsonlError> {
        let table = self.load_table(file_name, input)?;
        Ok(self.preview_of(&table))
    }

    fn preview_of(&self, table: &Table) -> Preview {
        Preview::from_table(
            table,
            self.config.preview_rows,
            self.config.date_format.pattern(),
        )
    }

    /// 形式判定・シート選択・テーブル化
    fn load(&self, file_name: Option<&str>, data: Vec<u8>) -> Result<LoadedSheet, XlsxToJsonlError> {
        let mut parser = WorkbookParser::open(file_name, data, &self.security)?;
        let sheet_name = parser.select_sheet(&self.config.sheet_selector)?;
        debug!("Selected sheet '{}' from {} workbook", sheet_name, parser.format());

        let table = parser.read_table(&sheet_name, self.config.date_format.pattern())?;
        Ok(LoadedSheet { sheet_name, table })
    }

    /// テーブル全体をJSONL文書に変換
    fn render(&self, loaded: &LoadedSheet) -> Result<(String, ConversionSummary), XlsxToJsonlError> {
        let columns = self.column_mappings(&loaded.table)?;
        let names: Vec<String> = columns.iter().map(|c| c.sanitized.clone()).collect();

        let serializer = RowSerializer::new(&loaded.table, &names, &self.config)?;
        let mut buffer = Vec::new();
        let row_count = serializer.write_to(&mut buffer)?;

        let jsonl = String::from_utf8(buffer).map_err(|e| {
            XlsxToJsonlError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        info!(
            "Converted sheet '{}': {} rows, {} columns",
            loaded.sheet_name,
            row_count,
            columns.len()
        );

        Ok((
            jsonl,
            ConversionSummary {
                sheet_name: loaded.sheet_name.clone(),
                row_count,
                columns,
            },
        ))
    }
}

/// 上限+1バイトまで読み込む（超過判定はパーサー側で行う）
fn read_limited<R: Read>(input: R, limit: u64) -> Result<Vec<u8>, XlsxToJsonlError> {
    let mut data = Vec::new();
    input.take(limit.saturating_add(1)).read_to_end(&mut data)?;
    Ok(data)
}
