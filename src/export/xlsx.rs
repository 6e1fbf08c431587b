//! Spreadsheet rendering via `rust_xlsxwriter`.
//!
//! One sheet named after the report type. The header row is the union of
//! row keys in first-seen order, so columns follow the insertion order of
//! the cleaned rows.

use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;

use super::ExportError;
use crate::models::{ReportRow, ReportType};

/// Excel's hard column limit.
const MAX_COLUMNS: usize = 16_384;

pub fn render_xlsx(rows: &[ReportRow], report_type: ReportType) -> Result<Vec<u8>, ExportError> {
    let headers = header_keys(rows);
    if headers.len() > MAX_COLUMNS {
        return Err(ExportError::Spreadsheet(format!(
            "{} columns exceed the sheet limit",
            headers.len()
        )));
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(report_type.sheet_name())?;

        for (col, key) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *key, &bold)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, key) in headers.iter().enumerate() {
                let c = col as u16;
                match row.get(key) {
                    Some(Value::String(s)) => {
                        sheet.write_string(r, c, s.as_str())?;
                    }
                    Some(Value::Number(n)) => {
                        if let Some(f) = n.as_f64() {
                            sheet.write_number(r, c, f)?;
                        }
                    }
                    Some(Value::Bool(b)) => {
                        sheet.write_boolean(r, c, *b)?;
                    }
                    Some(other @ (Value::Array(_) | Value::Object(_))) => {
                        sheet.write_string(r, c, other.to_string())?;
                    }
                    Some(Value::Null) | None => {}
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Distinct keys across all rows, in first-seen order.
fn header_keys(rows: &[ReportRow]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> ReportRow {
        let mut r = ReportRow::default();
        for (k, v) in pairs {
            r.insert(k, v.clone());
        }
        r
    }

    #[test]
    fn header_follows_first_seen_order() {
        let rows = vec![
            row(&[("name", json!("Sara")), ("phone", json!("1"))]),
            row(&[("name", json!("Omar")), ("age", json!(30)), ("phone", json!("2"))]),
        ];
        assert_eq!(header_keys(&rows), vec!["name", "phone", "age"]);
    }

    #[test]
    fn renders_xlsx_container() {
        let rows = vec![
            row(&[("name", json!("Sara")), ("age", json!(40)), ("active", json!(true))]),
            row(&[("name", json!("Omar")), ("age", Value::Null)]),
        ];
        let bytes = render_xlsx(&rows, ReportType::Patient).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn empty_rows_still_produce_a_workbook() {
        let bytes = render_xlsx(&[], ReportType::Visit).unwrap();
        assert!(!bytes.is_empty());
    }
}
