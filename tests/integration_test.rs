//! Integration Tests for xlsxjsonl
//!
//! 実際のXLSXファイルを`rust_xlsxwriter`で生成し、読み込みからJSONL出力までを検証します。

use rust_xlsxwriter::*;
use serde_json::Value;
use std::io::Cursor;
use xlsxjsonl::{
    CollisionPolicy, ColumnType, ConverterBuilder, DateFormat, JsonStyle, SheetSelector,
    XlsxToJsonlError,
};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// ID/Amountの1行テーブル
    pub fn generate_id_amount() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "ID")?;
        worksheet.write_string(0, 1, "Amount")?;
        worksheet.write_number(1, 0, 1.0)?;
        worksheet.write_number(1, 1, 9.5)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// ヘッダー行のみのテーブル
    pub fn generate_headers_only() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "A")?;
        Ok(workbook.save_to_buffer()?)
    }

    /// サニタイズが必要な列名と、型の異なるセルを含む顧客テーブル
    pub fn generate_customers() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Customers")?;

        worksheet.write_string(0, 0, "Customer Name")?;
        worksheet.write_string(0, 1, "Revenue (USD)")?;
        worksheet.write_string(0, 2, "email.address+tag")?;
        worksheet.write_string(0, 3, "Active")?;
        worksheet.write_string(0, 4, "Signup Date")?;

        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        worksheet.write_string(1, 0, "Alice")?;
        worksheet.write_number(1, 1, 1200.5)?;
        worksheet.write_string(1, 2, "alice@example.com")?;
        worksheet.write_boolean(1, 3, true)?;
        worksheet.write_datetime_with_format(
            1,
            4,
            &ExcelDateTime::from_ymd(2024, 1, 15)?,
            &date_format,
        )?;

        // 2行目は一部のセルが空
        worksheet.write_string(2, 0, "Bob")?;
        worksheet.write_number(2, 1, 300.0)?;
        worksheet.write_boolean(2, 3, false)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// サニタイズ後に衝突する列名
    pub fn generate_colliding_headers() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "Revenue (USD)")?;
        worksheet.write_string(0, 1, "Revenue USD")?;
        worksheet.write_number(1, 0, 1.0)?;
        worksheet.write_number(1, 1, 2.0)?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 数値列に欠損値の表記と解釈できない文字列が混じったテーブル
    pub fn generate_messy_quantities() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "SKU")?;
        worksheet.write_string(0, 1, "Qty")?;
        for row in 1..=9u32 {
            worksheet.write_string(row, 0, &format!("SKU-{}", row))?;
            worksheet.write_number(row, 1, row as f64 * 10.0)?;
        }
        worksheet.write_string(10, 0, "SKU-10")?;
        worksheet.write_string(10, 1, "n/a")?;
        worksheet.write_string(11, 0, "SKU-11")?;
        worksheet.write_string(11, 1, "lots")?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 3シートのワークブック
    pub fn generate_multi_sheets() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        for name in ["First", "Second", "Third"] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name)?;
            sheet.write_string(0, 0, "Sheet")?;
            sheet.write_string(1, 0, name)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn parse_lines(jsonl: &str) -> Vec<serde_json::Map<String, Value>> {
    jsonl
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_single_row_exact_output() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_id_amount().unwrap();

    let jsonl = converter
        .convert_to_string(Some("amounts.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(jsonl, "{\"id\": 1, \"amount\": 9.5}\n");
}

#[test]
fn test_compact_style() {
    let converter = ConverterBuilder::new()
        .with_json_style(JsonStyle::Compact)
        .build()
        .unwrap();
    let excel_data = fixtures::generate_id_amount().unwrap();

    let jsonl = converter
        .convert_to_string(Some("amounts.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(jsonl, "{\"id\":1,\"amount\":9.5}\n");
}

#[test]
fn test_headers_only_produces_empty_output() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_headers_only().unwrap();

    let mut output = Vec::new();
    let summary = converter
        .convert(Some("headers.xlsx"), Cursor::new(excel_data), &mut output)
        .unwrap();

    assert!(output.is_empty());
    assert_eq!(summary.row_count, 0);
    assert_eq!(summary.columns.len(), 1);
    assert_eq!(summary.columns[0].sanitized, "a");
}

#[test]
fn test_sanitized_keys_and_value_types() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let jsonl = converter
        .convert_to_string(Some("customers.xlsx"), Cursor::new(excel_data))
        .unwrap();
    let records = parse_lines(&jsonl);

    assert_eq!(records.len(), 2);
    let keys: Vec<&String> = records[0].keys().collect();
    assert_eq!(
        keys,
        vec![
            "customer_name",
            "revenue_usd",
            "emailaddresstag",
            "active",
            "signup_date"
        ]
    );

    assert_eq!(records[0]["customer_name"], "Alice");
    assert_eq!(records[0]["revenue_usd"], 1200.5);
    assert_eq!(records[0]["active"], true);
    assert_eq!(records[0]["signup_date"], "2024-01-15T00:00:00.000");

    // 空セルはnull、整数値の数値は小数部なし
    assert_eq!(records[1]["emailaddresstag"], Value::Null);
    assert_eq!(records[1]["signup_date"], Value::Null);
    assert_eq!(records[1]["active"], false);
    assert!(jsonl.lines().nth(1).unwrap().contains("\"revenue_usd\": 300,"));
}

#[test]
fn test_custom_date_format() {
    let converter = ConverterBuilder::new()
        .with_date_format(DateFormat::Custom("%Y/%m/%d".to_string()))
        .build()
        .unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let jsonl = converter
        .convert_to_string(Some("customers.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(parse_lines(&jsonl)[0]["signup_date"], "2024/01/15");
}

#[test]
fn test_collision_suffix_policy() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_colliding_headers().unwrap();

    let jsonl = converter
        .convert_to_string(Some("revenue.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(jsonl, "{\"revenue_usd\": 1, \"revenue_usd_2\": 2}\n");
}

#[test]
fn test_collision_error_policy() {
    let converter = ConverterBuilder::new()
        .with_collision_policy(CollisionPolicy::Error)
        .build()
        .unwrap();
    let excel_data = fixtures::generate_colliding_headers().unwrap();

    let mut output = Vec::new();
    let result = converter.convert(Some("revenue.xlsx"), Cursor::new(excel_data), &mut output);

    match result {
        Err(XlsxToJsonlError::DuplicateColumn {
            name,
            first,
            second,
        }) => {
            assert_eq!(name, "revenue_usd");
            assert_eq!((first, second), (0, 1));
        }
        other => panic!("Expected DuplicateColumn error, got {:?}", other),
    }
    assert!(output.is_empty());
}

#[test]
fn test_first_sheet_is_default() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_multi_sheets().unwrap();

    let mut output = Vec::new();
    let summary = converter
        .convert(Some("sheets.xlsx"), Cursor::new(excel_data), &mut output)
        .unwrap();

    assert_eq!(summary.sheet_name, "First");
    assert_eq!(String::from_utf8(output).unwrap(), "{\"sheet\": \"First\"}\n");
}

#[test]
fn test_sheet_selection() {
    let excel_data = fixtures::generate_multi_sheets().unwrap();

    let by_index = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Index(2))
        .build()
        .unwrap()
        .convert_to_string(Some("sheets.xlsx"), Cursor::new(excel_data.clone()))
        .unwrap();
    assert_eq!(by_index, "{\"sheet\": \"Third\"}\n");

    let by_name = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Name("Second".to_string()))
        .build()
        .unwrap()
        .convert_to_string(Some("sheets.xlsx"), Cursor::new(excel_data))
        .unwrap();
    assert_eq!(by_name, "{\"sheet\": \"Second\"}\n");
}

#[test]
fn test_unknown_sheet() {
    let excel_data = fixtures::generate_multi_sheets().unwrap();

    let result = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Name("Missing".to_string()))
        .build()
        .unwrap()
        .convert_to_string(Some("sheets.xlsx"), Cursor::new(excel_data.clone()));
    assert!(matches!(result, Err(XlsxToJsonlError::Config(ref msg)) if msg.contains("Missing")));

    let result = ConverterBuilder::new()
        .with_sheet_selector(SheetSelector::Index(3))
        .build()
        .unwrap()
        .convert_to_string(Some("sheets.xlsx"), Cursor::new(excel_data));
    assert!(matches!(result, Err(XlsxToJsonlError::Config(ref msg)) if msg.contains("out of range")));
}

#[test]
fn test_conversion_is_deterministic() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let first = converter
        .convert_to_string(Some("customers.xlsx"), Cursor::new(excel_data.clone()))
        .unwrap();
    let second = converter
        .convert_to_string(Some("customers.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_content_detection_without_file_name() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_id_amount().unwrap();

    let jsonl = converter
        .convert_to_string(None, Cursor::new(excel_data))
        .unwrap();

    assert_eq!(jsonl.lines().count(), 1);
}

#[test]
fn test_convert_bytes() {
    let converter = ConverterBuilder::new().with_preview_rows(1).build().unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let output = converter
        .convert_bytes("C:\\fakepath\\Customers 2024.xlsx", excel_data)
        .unwrap();

    assert_eq!(output.file_name, "Customers 2024.jsonl");
    assert_eq!(output.summary.sheet_name, "Customers");
    assert_eq!(output.summary.row_count, 2);
    assert_eq!(output.jsonl.lines().count(), 2);

    assert_eq!(output.summary.columns[1].original, "Revenue (USD)");
    assert_eq!(output.summary.columns[1].sanitized, "revenue_usd");

    // プレビューは元の列名と表示用文字列
    assert_eq!(output.preview.headers()[0], "Customer Name");
    assert_eq!(output.preview.rows().len(), 1);
    assert_eq!(output.preview.rows()[0][1], "1200.5");
    assert_eq!(output.preview.rows()[0][3], "TRUE");
    assert_eq!(output.preview.total_rows(), 2);
}

#[test]
fn test_preview_markdown() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_id_amount().unwrap();

    let preview = converter
        .preview(Some("amounts.xlsx"), Cursor::new(excel_data))
        .unwrap();
    let markdown = preview.to_markdown().unwrap();

    assert_eq!(markdown, "| ID  | Amount |\n|-----|--------|\n| 1   | 9.5    |\n");
}

#[test]
fn test_load_table() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let table = converter
        .load_table(Some("customers.xlsx"), Cursor::new(excel_data))
        .unwrap();

    assert_eq!(table.column_count(), 5);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.headers()[4], "Signup Date");
}

#[test]
fn test_convert_from_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("amounts.xlsx");
    let output_path = dir.path().join("amounts.jsonl");
    std::fs::write(&input_path, fixtures::generate_id_amount().unwrap()).unwrap();

    let converter = ConverterBuilder::new().build().unwrap();
    let input = std::fs::File::open(&input_path).unwrap();
    let mut output = std::fs::File::create(&output_path).unwrap();
    let summary = converter
        .convert(Some("amounts.xlsx"), input, &mut output)
        .unwrap();
    drop(output);

    assert_eq!(summary.row_count, 1);
    assert_eq!(
        std::fs::read_to_string(&output_path).unwrap(),
        "{\"id\": 1, \"amount\": 9.5}\n"
    );
}

#[test]
fn test_inspect_bytes_reports_column_types() {
    let converter = ConverterBuilder::new().with_preview_rows(1).build().unwrap();
    let excel_data = fixtures::generate_customers().unwrap();

    let inspection = converter
        .inspect_bytes("customers.xlsx", excel_data)
        .unwrap();

    assert_eq!(inspection.sheet_name, "Customers");
    assert_eq!(inspection.row_count, 2);
    assert_eq!(inspection.columns[1].sanitized, "revenue_usd");
    assert_eq!(inspection.preview.rows().len(), 1);
    assert!(inspection.preview.is_truncated());

    let types: Vec<ColumnType> = inspection
        .quality
        .columns()
        .iter()
        .map(|column| column.inferred_type)
        .collect();
    assert_eq!(
        types,
        vec![
            ColumnType::String,
            ColumnType::Float,
            ColumnType::String,
            ColumnType::Boolean,
            ColumnType::DateTime,
        ]
    );
    assert!(inspection.quality.quarantined().is_empty());
}

#[test]
fn test_quality_report_does_not_change_output() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_messy_quantities().unwrap();

    let output = converter
        .convert_bytes("stock.xlsx", excel_data.clone())
        .unwrap();

    // 欠損値の表記も解釈できない値も、シート上の値のまま出力される
    let rows = parse_lines(&output.jsonl);
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0]["qty"], 10);
    assert_eq!(rows[9]["qty"], "n/a");
    assert_eq!(rows[10]["qty"], "lots");
    assert_eq!(
        output.jsonl,
        converter
            .convert_to_string(Some("stock.xlsx"), Cursor::new(excel_data))
            .unwrap()
    );

    let qty = &output.quality.columns()[1];
    assert_eq!(qty.inferred_type, ColumnType::Integer);
    assert_eq!(qty.junk, 1);
    assert_eq!(qty.failed, 1);

    let quarantined = output.quality.quarantined();
    assert_eq!(quarantined.len(), 1);
    assert_eq!(quarantined[0].row, 10);
    assert_eq!(
        quarantined[0].reason(),
        "Column 'Qty': Value 'lots' (Failed to parse as INTEGER)"
    );
}
