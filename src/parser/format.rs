//! ファイル形式の判定
//!
//! 拡張子とファイル先頭のシグネチャ（マジックバイト）の両方から
//! スプレッドシート形式を判定します。

use std::fmt;
use std::path::Path;

use crate::error::XlsxToJsonlError;

/// ZIPローカルファイルヘッダーのシグネチャ（XLSX）
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE2複合ドキュメントのシグネチャ（XLS）
const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// サポートするスプレッドシート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML（`.xlsx`）
    Xlsx,
    /// Excel 97-2003バイナリ（`.xls`）
    Xls,
}

impl SpreadsheetFormat {
    /// 受け付ける拡張子（小文字、ドットなし）
    pub const EXTENSIONS: [&'static str; 2] = ["xlsx", "xls"];

    /// HTMLの`accept`属性値（例: `.xlsx,.xls`）
    pub fn accept_attribute() -> String {
        Self::EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 拡張子から形式を判定（大文字小文字を区別しない）
    ///
    /// 拡張子がない場合やサポート外の拡張子の場合は`None`を返します。
    pub fn from_extension(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Some(SpreadsheetFormat::Xlsx),
            "xls" => Some(SpreadsheetFormat::Xls),
            _ => None,
        }
    }

    /// ファイル先頭のシグネチャから形式を判定
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&ZIP_SIGNATURE) {
            Some(SpreadsheetFormat::Xlsx)
        } else if data.starts_with(&OLE2_SIGNATURE) {
            Some(SpreadsheetFormat::Xls)
        } else {
            None
        }
    }

    /// ファイル名と内容から形式を判定
    ///
    /// ファイル名が与えられた場合は、拡張子とシグネチャが一致する必要があります。
    /// ファイル名がない場合は内容のみで判定します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(SpreadsheetFormat)` - 判定に成功した場合
    /// * `Err(XlsxToJsonlError::UnsupportedFormat)` - サポート外の形式、または拡張子と内容が一致しない場合
    pub fn detect(file_name: Option<&str>, data: &[u8]) -> Result<Self, XlsxToJsonlError> {
        let sniffed = Self::sniff(data);

        let Some(file_name) = file_name else {
            return sniffed.ok_or_else(|| {
                XlsxToJsonlError::UnsupportedFormat(
                    "content is not an XLSX or XLS spreadsheet".to_string(),
                )
            });
        };

        let by_extension = Self::from_extension(file_name).ok_or_else(|| {
            XlsxToJsonlError::UnsupportedFormat(format!(
                "'{}' does not have a .xlsx or .xls extension",
                file_name
            ))
        })?;

        if sniffed != Some(by_extension) {
            return Err(XlsxToJsonlError::UnsupportedFormat(format!(
                "content of '{}' is not a valid {} file",
                file_name, by_extension
            )));
        }

        Ok(by_extension)
    }
}

impl fmt::Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadsheetFormat::Xlsx => write!(f, "XLSX"),
            SpreadsheetFormat::Xls => write!(f, "XLS"),
        }
    }
}
