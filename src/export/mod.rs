//! Report export: field stripping, fixed column layouts, and the two
//! artifact formats.
//!
//! - PDF via `printpdf` (see `pdf`)
//! - XLSX via `rust_xlsxwriter` (see `xlsx`)
//!
//! Rows are cleaned before either format sees them. Cleaning is a pure
//! projection and running it twice gives the same rows as running it once.

pub mod pdf;
pub mod xlsx;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::i18n::Language;
use crate::models::{ReportFormat, ReportRecords, ReportRow, ReportType};
use crate::normalize::parse_record_date;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("Spreadsheet generation failed: {0}")]
    Spreadsheet(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Spreadsheet(err.to_string())
    }
}

/// Internal identifiers, audit stamps, status and credential fields.
/// Never exported, whatever the report type.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "_id",
    "id",
    "__v",
    "doctor_id",
    "clinic_id",
    "patient_id",
    "visit_id",
    "receipt_id",
    "createdAt",
    "updatedAt",
    "created_at",
    "updated_at",
    "status",
    "token",
    "auth_token",
    "password",
];

const PATIENT_ONLY_FIELDS: &[&str] = &["age", "address"];
const VISIT_ONLY_FIELDS: &[&str] = &["visit_type"];

/// Copy of `row` without excluded and type-restricted fields.
pub fn strip_fields(row: &ReportRow, report_type: ReportType) -> ReportRow {
    let mut cleaned = row.clone();
    for field in EXCLUDED_FIELDS {
        cleaned.remove(field);
    }
    if report_type != ReportType::Patient {
        for field in PATIENT_ONLY_FIELDS {
            cleaned.remove(field);
        }
    }
    if report_type != ReportType::Visit {
        for field in VISIT_ONLY_FIELDS {
            cleaned.remove(field);
        }
    }
    cleaned
}

/// Project records into cleaned rows for `report_type`.
pub fn clean_rows(records: &ReportRecords) -> Vec<ReportRow> {
    let report_type = records.report_type();
    records
        .to_rows()
        .iter()
        .map(|row| strip_fields(row, report_type))
        .collect()
}

/// One column of the fixed tabular layout.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub field: &'static str,
    /// Translation key for the header label.
    pub label_key: &'static str,
    /// Rendered when the value is missing or blank.
    pub fallback: &'static str,
    pub is_date: bool,
}

const fn col(field: &'static str, label_key: &'static str, fallback: &'static str) -> Column {
    Column {
        field,
        label_key,
        fallback,
        is_date: false,
    }
}

const fn date_col(label_key: &'static str) -> Column {
    Column {
        field: "date",
        label_key,
        fallback: "N/A",
        is_date: true,
    }
}

const PATIENT_COLUMNS: &[Column] = &[
    col("name", "column.name", "N/A"),
    col("phone", "column.phone", "N/A"),
    col("age", "column.age", ""),
    col("address", "column.address", ""),
    date_col("column.registration_date"),
];

const VISIT_COLUMNS: &[Column] = &[
    col("patient_name", "column.patient", "N/A"),
    col("patient_phone", "column.phone", ""),
    date_col("column.date"),
    col("visit_type", "column.visit_type", "N/A"),
    col("complaint", "column.complaint", ""),
    col("diagnosis", "column.diagnosis", ""),
];

const PRESCRIPTION_COLUMNS: &[Column] = &[
    col("patient_name", "column.patient", "N/A"),
    date_col("column.date"),
    col("drug", "column.drug", "N/A"),
    col("frequency", "column.frequency", ""),
    col("period", "column.period", ""),
    col("timing", "column.timing", ""),
];

pub fn columns_for(report_type: ReportType) -> &'static [Column] {
    match report_type {
        ReportType::Patient => PATIENT_COLUMNS,
        ReportType::Visit => VISIT_COLUMNS,
        ReportType::Prescription => PRESCRIPTION_COLUMNS,
    }
}

/// Display text for one cell: fallback for missing values, short locale
/// date for date columns (unparseable dates are shown as-is).
pub fn cell_text(row: &ReportRow, column: &Column, language: Language) -> String {
    let Some(text) = row.text(column.field) else {
        return column.fallback.to_string();
    };
    if column.is_date {
        if let Some(dt) = parse_record_date(&text) {
            return dt.format(language.short_date_format()).to_string();
        }
    }
    text
}

/// `{type}_report_{YYYY-MM-DD}.{ext}`
pub fn export_filename(report_type: ReportType, format: ReportFormat, generated_at: NaiveDateTime) -> String {
    format!(
        "{}_report_{}.{}",
        report_type.as_str(),
        generated_at.format("%Y-%m-%d"),
        format.extension()
    )
}

/// A rendered report ready for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Clean and render `records` in the requested format.
pub fn export_report(
    records: &ReportRecords,
    format: ReportFormat,
    language: Language,
    generated_at: NaiveDateTime,
) -> Result<ExportArtifact, ExportError> {
    let report_type = records.report_type();
    let rows = clean_rows(records);

    let bytes = match format {
        ReportFormat::Pdf => pdf::render_pdf(&rows, report_type, language, generated_at)?,
        ReportFormat::Xlsx => xlsx::render_xlsx(&rows, report_type)?,
    };

    tracing::info!(
        report = report_type.as_str(),
        format = format.extension(),
        rows = rows.len(),
        size = bytes.len(),
        "Report exported"
    );

    Ok(ExportArtifact {
        filename: export_filename(report_type, format, generated_at),
        content_type: format.content_type(),
        bytes,
    })
}
