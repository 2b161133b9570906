//! Security Tests
//!
//! セキュリティ対策のテストケースを実装します。
//! ZIP bomb攻撃、パストラバーサル攻撃、入力サイズ制限への対策を検証します。
//! XLSXのZIPアーカイブはcalamineで展開する前に検査されます。

use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Write};
use xlsxjsonl::{ConverterBuilder, XlsxToJsonlError};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// 指定されたエントリを持つZIPアーカイブを作成
fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip_data = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }

        zip.finish().unwrap();
    }
    zip_data
}

fn expect_security_violation(zip_data: Vec<u8>, expected: &[&str]) {
    let converter = ConverterBuilder::new().build().unwrap();
    let mut output = Vec::new();
    let result = converter.convert(Some("attack.xlsx"), Cursor::new(zip_data), &mut output);

    match result {
        Err(XlsxToJsonlError::SecurityViolation(msg)) => {
            assert!(
                expected.iter().any(|e| msg.contains(e)),
                "Unexpected message: {}",
                msg
            );
        }
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
    assert!(output.is_empty());
}

/// ZIP bomb攻撃のテスト: 大量のファイルを含むZIPアーカイブ
#[test]
fn test_zip_bomb_too_many_files() {
    // 10,001個のファイルを含むZIPアーカイブを作成（上限: 10,000）
    let mut zip_data = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        for i in 0..10_001 {
            let file_name = format!("xl/file{}.xml", i);
            zip.start_file(file_name, options).unwrap();
            zip.write_all(b"test").unwrap();
        }

        zip.finish().unwrap();
    }

    expect_security_violation(zip_data, &["too many files"]);
}

/// ZIP bomb攻撃のテスト: 展開後のサイズが大きすぎるZIPアーカイブ
#[test]
#[ignore] // 大きなファイルを作成するため、通常のテストではスキップ
fn test_zip_bomb_large_decompressed_size() {
    // 100MB + 1バイトのエントリ（単一ファイルの上限: 100MB）
    let large_data = vec![0u8; 104_857_601];
    let zip_data = build_zip(&[("xl/large_file.xml", &large_data[..])]);

    expect_security_violation(zip_data, &["exceeds maximum size"]);
}

/// パストラバーサル攻撃のテスト: `..`を含むパス
#[test]
fn test_path_traversal_dotdot() {
    let zip_data = build_zip(&[
        ("xl/workbook.xml", &b"<workbook/>"[..]),
        ("../etc/passwd", &b"test"[..]),
    ]);

    expect_security_violation(zip_data, &["Path traversal"]);
}

/// パストラバーサル攻撃のテスト: 絶対パス
#[test]
fn test_path_traversal_absolute_path() {
    let zip_data = build_zip(&[("/etc/passwd", &b"test"[..])]);

    expect_security_violation(zip_data, &["Absolute path"]);
}

/// パストラバーサル攻撃のテスト: Windows形式の絶対パス
#[test]
fn test_path_traversal_windows_absolute_path() {
    let zip_data = build_zip(&[("C:\\Windows\\system32", &b"test"[..])]);

    expect_security_violation(zip_data, &["Absolute path", "Backslash"]);
}

/// ファイルサイズ制限のテスト: 入力ファイルが上限を超える場合
#[test]
fn test_input_file_size_limit() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Header").unwrap();
    let excel_data = workbook.save_to_buffer().unwrap();

    let converter = ConverterBuilder::new()
        .with_max_input_size(1024)
        .build()
        .unwrap();
    let result = converter.convert_to_string(Some("big.xlsx"), Cursor::new(excel_data.clone()));

    match result {
        Err(XlsxToJsonlError::SecurityViolation(msg)) => {
            assert!(msg.contains("Input file size exceeds maximum"));
        }
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }

    // 上限内であれば変換できる
    let converter = ConverterBuilder::new()
        .with_max_input_size(excel_data.len() as u64)
        .build()
        .unwrap();
    assert!(converter
        .convert_to_string(Some("big.xlsx"), Cursor::new(excel_data))
        .is_ok());
}

/// 正常な構造のZIPアーカイブはセキュリティ検査を通過する
#[test]
fn test_valid_structure_passes_inspection() {
    let zip_data = build_zip(&[
        ("xl/workbook.xml", &b"<?xml version=\"1.0\"?><workbook/>"[..]),
        (
            "xl/worksheets/sheet1.xml",
            &b"<?xml version=\"1.0\"?><worksheet/>"[..],
        ),
    ]);

    let converter = ConverterBuilder::new().build().unwrap();
    let result = converter.convert_to_string(Some("minimal.xlsx"), Cursor::new(zip_data));

    // XLSXとしては不完全なため解析エラーになり得るが、セキュリティ違反ではない
    assert!(!matches!(result, Err(XlsxToJsonlError::SecurityViolation(_))));
}
