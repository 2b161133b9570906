//! xlsxjsonl - Spreadsheet to JSONL converter for columnar data warehouses
//!
//! This crate converts the first (or a selected) sheet of an XLSX/XLS workbook into
//! JSON Lines: one JSON object per data row, keyed by sanitized column names that
//! are safe to load into BigQuery and similar warehouses.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxjsonl::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let input = File::open("orders.xlsx")?;
//!     let output = File::create("orders.jsonl")?;
//!
//!     // The file name is used to validate the extension
//!     let summary = converter.convert(Some("orders.xlsx"), input, output)?;
//!     for column in &summary.columns {
//!         println!("{} -> {}", column.original, column.sanitized);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxjsonl::{CollisionPolicy, ConverterBuilder, JsonStyle, NonFinitePolicy, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Orders".to_string()))
//!         .with_collision_policy(CollisionPolicy::Error)  // fail on "A B" vs "a_b"
//!         .with_non_finite_policy(NonFinitePolicy::Null)
//!         .with_json_style(JsonStyle::Compact)
//!         .build()?;
//!
//!     let jsonl = converter.convert_to_string(Some("orders.xlsx"), File::open("orders.xlsx")?)?;
//!     print!("{}", jsonl);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Header Sanitization
//!
//! ```rust
//! use xlsxjsonl::sanitize_column_name;
//!
//! assert_eq!(sanitize_column_name("Customer Name"), "customer_name");
//! assert_eq!(sanitize_column_name("Revenue (USD)"), "revenue_usd");
//! ```

mod api;
mod builder;
mod error;
mod output;
mod parser;
mod preview;
mod quality;
mod sanitize;
mod security;
mod serializer;
mod types;

#[cfg(feature = "web")]
pub mod web;

// 公開API
pub use api::{CollisionPolicy, DateFormat, JsonStyle, NonFinitePolicy, SheetSelector};
pub use builder::{
    ConversionConfig, ConversionOutput, ConversionSummary, Converter, ConverterBuilder, Inspection,
    DEFAULT_MAX_INPUT_SIZE, DEFAULT_PREVIEW_ROWS,
};
pub use error::XlsxToJsonlError;
pub use output::{jsonl_file_name, JSONL_CONTENT_TYPE};
pub use parser::SpreadsheetFormat;
pub use preview::Preview;
pub use quality::{
    is_junk, ColumnProfile, ColumnType, QualityReport, QuarantineIssue, QuarantinedRow,
    DEFAULT_TYPE_THRESHOLD, JUNK_VALUES,
};
pub use sanitize::{sanitize_column_name, HeaderSanitizer};
pub use serializer::{JsonlLines, RowSerializer};
pub use types::{CellValue, ColumnMapping, Table};
