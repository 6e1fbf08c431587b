//! Clinic records as returned by the external API.
//!
//! Every scalar is optional and read leniently (numbers and booleans are
//! accepted where text is expected) because the upstream shapes vary.
//! Unknown fields are kept in `extra` so exports can decide what to strip.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::report::ReportRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, rename = "_id", alias = "id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    /// Registration date.
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at", deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "seq_or_empty")]
    pub visits: Vec<Visit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Visit {
    #[serde(default, rename = "_id", alias = "id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, alias = "patientName", deserialize_with = "lenient_text")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "patientPhone", deserialize_with = "lenient_text")]
    pub patient_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, alias = "visitType", deserialize_with = "lenient_text")]
    pub visit_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complaint: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "seq_or_empty")]
    pub receipts: Vec<Receipt>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, rename = "_id", alias = "id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "seq_or_empty")]
    pub drugs: Vec<Drug>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drug {
    #[serde(default, alias = "name", deserialize_with = "lenient_text")]
    pub drug: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timing: Option<String>,
}

/// One row per drug, flattened out of visit → receipt → drug.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRow {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub visit_id: Option<String>,
    pub visit_date: Option<String>,
    pub visit_type: Option<String>,
    pub receipt_id: Option<String>,
    pub receipt_date: Option<String>,
    pub notes: Option<String>,
    pub drug: Option<String>,
    pub frequency: Option<String>,
    pub period: Option<String>,
    pub timing: Option<String>,
}

impl Patient {
    /// Registration date, falling back to the audit `createdAt` stamp.
    pub fn registration_date(&self) -> Option<&str> {
        self.date.as_deref().or(self.created_at.as_deref())
    }

    pub fn to_row(&self) -> ReportRow {
        let mut row = ReportRow::default();
        row.insert_opt("_id", &self.id);
        row.insert_opt("name", &self.name);
        row.insert_opt("phone", &self.phone);
        row.insert_opt("age", &self.age);
        row.insert_opt("address", &self.address);
        row.insert_opt("date", &self.registration_date().map(str::to_string));
        row.insert_opt("createdAt", &self.created_at);
        row.extend_scalars(&self.extra);
        row
    }
}

impl Visit {
    /// Copy of this visit carrying the owning patient's name and phone.
    /// Values already present on the visit win.
    pub fn with_patient(&self, patient: &Patient) -> Visit {
        let mut visit = self.clone();
        if visit.patient_name.is_none() {
            visit.patient_name = patient.name.clone();
        }
        if visit.patient_phone.is_none() {
            visit.patient_phone = patient.phone.clone();
        }
        visit
    }

    pub fn to_row(&self) -> ReportRow {
        let mut row = ReportRow::default();
        row.insert_opt("_id", &self.id);
        row.insert_opt("patient_name", &self.patient_name);
        row.insert_opt("patient_phone", &self.patient_phone);
        row.insert_opt("date", &self.date);
        row.insert_opt("visit_type", &self.visit_type);
        row.insert_opt("complaint", &self.complaint);
        row.insert_opt("diagnosis", &self.diagnosis);
        row.extend_scalars(&self.extra);
        row
    }
}

impl PrescriptionRow {
    /// Date used for filtering: the receipt's own date, else the visit's.
    pub fn effective_date(&self) -> Option<&str> {
        self.receipt_date.as_deref().or(self.visit_date.as_deref())
    }

    pub fn to_row(&self) -> ReportRow {
        let mut row = ReportRow::default();
        row.insert_opt("patient_name", &self.patient_name);
        row.insert_opt("patient_phone", &self.patient_phone);
        row.insert_opt("visit_id", &self.visit_id);
        row.insert_opt("visit_type", &self.visit_type);
        row.insert_opt("receipt_id", &self.receipt_id);
        row.insert_opt("date", &self.effective_date().map(str::to_string));
        row.insert_opt("notes", &self.notes);
        row.insert_opt("drug", &self.drug);
        row.insert_opt("frequency", &self.frequency);
        row.insert_opt("period", &self.period);
        row.insert_opt("timing", &self.timing);
        row
    }
}

/// Accepts a string, number or boolean as text; anything else is `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Treats `null` as an empty sequence.
fn seq_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_parses_mixed_scalar_types() {
        let patient: Patient = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Sara",
            "phone": 5551234,
            "age": 42,
            "address": null,
            "createdAt": "2024-01-05T10:00:00Z",
            "gender": "F",
            "visits": null
        }))
        .unwrap();

        assert_eq!(patient.id.as_deref(), Some("p1"));
        assert_eq!(patient.phone.as_deref(), Some("5551234"));
        assert_eq!(patient.age.as_deref(), Some("42"));
        assert!(patient.address.is_none());
        assert!(patient.visits.is_empty());
        assert_eq!(patient.registration_date(), Some("2024-01-05T10:00:00Z"));
        assert_eq!(patient.extra.get("gender"), Some(&json!("F")));
    }

    #[test]
    fn visit_accepts_camel_case_aliases() {
        let visit: Visit = serde_json::from_value(json!({
            "id": "v1",
            "visitType": "Regular",
            "patientName": "Omar",
            "date": "2024-01-10",
            "receipts": [{"date": "2024-01-10", "drugs": [{"name": "Amoxicillin"}]}]
        }))
        .unwrap();

        assert_eq!(visit.id.as_deref(), Some("v1"));
        assert_eq!(visit.visit_type.as_deref(), Some("Regular"));
        assert_eq!(visit.patient_name.as_deref(), Some("Omar"));
        assert_eq!(visit.receipts[0].drugs[0].drug.as_deref(), Some("Amoxicillin"));
    }

    #[test]
    fn with_patient_copies_missing_identity_only() {
        let patient = Patient {
            name: Some("Lina".into()),
            phone: Some("0100".into()),
            ..Default::default()
        };
        let visit = Visit {
            patient_phone: Some("0999".into()),
            ..Default::default()
        };

        let derived = visit.with_patient(&patient);
        assert_eq!(derived.patient_name.as_deref(), Some("Lina"));
        assert_eq!(derived.patient_phone.as_deref(), Some("0999"));
        // The source visit is untouched.
        assert!(visit.patient_name.is_none());
    }

    #[test]
    fn patient_row_skips_nested_visits_and_keeps_order() {
        let patient: Patient = serde_json::from_value(json!({
            "name": "Sara",
            "phone": "1",
            "date": "2024-01-05",
            "visits": [{"date": "2024-01-06"}],
            "tags": ["a"],
            "gender": "F"
        }))
        .unwrap();

        let row = patient.to_row();
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["name", "phone", "date", "gender"]);
    }

    #[test]
    fn prescription_effective_date_prefers_receipt() {
        let row = PrescriptionRow {
            visit_date: Some("2024-01-01".into()),
            receipt_date: Some("2024-01-02".into()),
            ..Default::default()
        };
        assert_eq!(row.effective_date(), Some("2024-01-02"));

        let row = PrescriptionRow {
            visit_date: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert_eq!(row.effective_date(), Some("2024-01-01"));
    }
}
