use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::records::{Patient, PrescriptionRow, Visit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Patient,
    Visit,
    Prescription,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Patient => "patient",
            ReportType::Visit => "visit",
            ReportType::Prescription => "prescription",
        }
    }

    /// Capitalized name, used as the spreadsheet sheet name.
    pub fn sheet_name(self) -> &'static str {
        match self {
            ReportType::Patient => "Patient",
            ReportType::Visit => "Visit",
            ReportType::Prescription => "Prescription",
        }
    }

    pub fn title_key(self) -> &'static str {
        match self {
            ReportType::Patient => "report.patient",
            ReportType::Visit => "report.visit",
            ReportType::Prescription => "report.prescription",
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" | "patients" => Ok(ReportType::Patient),
            "visit" | "visits" => Ok(ReportType::Visit),
            "prescription" | "prescriptions" => Ok(ReportType::Prescription),
            other => Err(format!("Unknown report type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    #[serde(alias = "excel")]
    Xlsx,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// Scoping and filters for one report request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub doctor_id: String,
    #[serde(default)]
    pub clinic_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub visit_types: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ReportQuery {
    /// Clinic id, ignoring blank values.
    pub fn clinic(&self) -> Option<&str> {
        self.clinic_id.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Allow-list of visit types; `None` when absent or empty.
    pub fn visit_type_filter(&self) -> Option<&[String]> {
        self.visit_types.as_deref().filter(|types| !types.is_empty())
    }
}

/// Records returned by the fetcher for one report type.
#[derive(Debug, Clone)]
pub enum ReportRecords {
    Patients(Vec<Patient>),
    Visits(Vec<Visit>),
    Prescriptions(Vec<PrescriptionRow>),
}

impl ReportRecords {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportRecords::Patients(_) => ReportType::Patient,
            ReportRecords::Visits(_) => ReportType::Visit,
            ReportRecords::Prescriptions(_) => ReportType::Prescription,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReportRecords::Patients(p) => p.len(),
            ReportRecords::Visits(v) => v.len(),
            ReportRecords::Prescriptions(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_rows(&self) -> Vec<ReportRow> {
        match self {
            ReportRecords::Patients(p) => p.iter().map(Patient::to_row).collect(),
            ReportRecords::Visits(v) => v.iter().map(Visit::to_row).collect(),
            ReportRecords::Prescriptions(r) => r.iter().map(PrescriptionRow::to_row).collect(),
        }
    }
}

/// A flattened record: an ordered JSON object whose key order is the
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportRow(Map<String, Value>);

impl ReportRow {
    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Inserts `value` as a string when present; absent values are skipped.
    pub fn insert_opt(&mut self, key: &str, value: &Option<String>) {
        if let Some(v) = value {
            self.insert(key, Value::String(v.clone()));
        }
    }

    /// Appends scalar entries from `extra` that are not already present.
    /// Arrays and objects are skipped.
    pub fn extend_scalars(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            if value.is_array() || value.is_object() || self.0.contains_key(key) {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Text form of a field; `None` when missing, null or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_type_parses_singular_and_plural() {
        assert_eq!("visits".parse::<ReportType>().unwrap(), ReportType::Visit);
        assert_eq!("Patient".parse::<ReportType>().unwrap(), ReportType::Patient);
        assert!("invoice".parse::<ReportType>().is_err());
    }

    #[test]
    fn sheet_name_is_capitalized() {
        assert_eq!(ReportType::Prescription.sheet_name(), "Prescription");
    }

    #[test]
    fn format_accepts_excel_alias() {
        let f: ReportFormat = serde_json::from_value(json!("excel")).unwrap();
        assert_eq!(f, ReportFormat::Xlsx);
        assert_eq!(f.extension(), "xlsx");
    }

    #[test]
    fn query_deserializes_with_optional_fields() {
        let q: ReportQuery = serde_json::from_value(json!({
            "doctor_id": "d1",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "visit_types": []
        }))
        .unwrap();
        assert_eq!(q.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(q.clinic().is_none());
        assert!(q.visit_type_filter().is_none());
    }

    #[test]
    fn row_remove_keeps_order() {
        let mut row = ReportRow::default();
        row.insert("a", json!(1));
        row.insert("b", json!(2));
        row.insert("c", json!(3));
        row.remove("b");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn row_text_treats_blank_as_missing() {
        let mut row = ReportRow::default();
        row.insert("blank", json!("  "));
        row.insert("num", json!(7));
        row.insert("null", Value::Null);
        assert!(row.text("blank").is_none());
        assert!(row.text("null").is_none());
        assert_eq!(row.text("num").as_deref(), Some("7"));
    }
}
