//! Output Module
//!
//! JSONL出力のファイル名とメディアタイプを定義するモジュール。

/// JSONLのメディアタイプ
pub const JSONL_CONTENT_TYPE: &str = "application/jsonl";

/// ファイル名が決定できない場合の出力ファイル名
const FALLBACK_FILE_NAME: &str = "converted.jsonl";

/// アップロードされたファイル名から出力ファイル名を生成
///
/// ディレクトリ部分（`/`、`\`区切り）と最後の拡張子を取り除き、`.jsonl`を付与します。
/// 引用符と制御文字は削除します。
///
/// # 使用例
///
/// ```rust
/// use xlsxjsonl::jsonl_file_name;
///
/// assert_eq!(jsonl_file_name("sales_2024.xlsx"), "sales_2024.jsonl");
/// assert_eq!(jsonl_file_name("C:\\fakepath\\Report.XLS"), "Report.jsonl");
/// assert_eq!(jsonl_file_name(""), "converted.jsonl");
/// ```
pub fn jsonl_file_name(upload_name: &str) -> String {
    let base = upload_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(upload_name);

    let stem = match base.rfind('.') {
        Some(0) | None => base,
        Some(dot) => &base[..dot],
    };

    let cleaned: String = stem
        .chars()
        .filter(|ch| *ch != '"' && !ch.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        format!("{}.jsonl", cleaned)
    }
}
