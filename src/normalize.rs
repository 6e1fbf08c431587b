//! Date-range and visit-type filtering, plus prescription flattening.
//!
//! Pure functions over borrowed records; nothing here mutates its input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{Patient, PrescriptionRow, Visit};

/// Inclusive calendar-day range. The end bound covers the whole end day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Start date {start} is after end date {end}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First instant of the start day.
    pub fn lower_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last representable instant of the end day.
    pub fn upper_bound(&self) -> NaiveDateTime {
        let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        self.end.and_time(last)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.lower_bound() <= instant && instant <= self.upper_bound()
    }
}

/// Parse a record date. Offsets are normalized to UTC; date-only values
/// mean midnight.
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// A record that can be placed on the timeline and, optionally, tagged
/// with a visit type.
pub trait DatedRecord {
    fn raw_date(&self) -> Option<&str>;

    fn visit_type(&self) -> Option<&str> {
        None
    }

    fn record_date(&self) -> Option<NaiveDateTime> {
        self.raw_date().and_then(parse_record_date)
    }
}

impl DatedRecord for Patient {
    fn raw_date(&self) -> Option<&str> {
        self.registration_date()
    }
}

impl DatedRecord for Visit {
    fn raw_date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn visit_type(&self) -> Option<&str> {
        self.visit_type.as_deref()
    }
}

impl DatedRecord for PrescriptionRow {
    fn raw_date(&self) -> Option<&str> {
        self.effective_date()
    }

    fn visit_type(&self) -> Option<&str> {
        self.visit_type.as_deref()
    }
}

/// True when `visit_type` passes the allow-list. An absent or empty list
/// lets everything through; membership is exact and case-sensitive.
pub fn visit_type_allowed(visit_type: Option<&str>, allow: Option<&[String]>) -> bool {
    match allow {
        None => true,
        Some([]) => true,
        Some(list) => visit_type.is_some_and(|t| list.iter().any(|a| a == t)),
    }
}

/// Lazily filter records by date range and visit-type allow-list,
/// preserving input order. Records without a parseable date are dropped.
pub fn filter_records<'a, T, I>(
    records: I,
    range: DateRange,
    visit_types: Option<&'a [String]>,
) -> impl Iterator<Item = &'a T> + 'a
where
    T: DatedRecord + 'a,
    I: IntoIterator<Item = &'a T> + 'a,
{
    records.into_iter().filter(move |record| {
        let in_range = record.record_date().is_some_and(|d| range.contains(d));
        in_range && visit_type_allowed(record.visit_type(), visit_types)
    })
}

/// Flatten visits into one row per drug, carrying patient, visit and
/// receipt identity forward. Receipts without drugs contribute no rows.
pub fn flatten_prescriptions(visits: &[Visit]) -> Vec<PrescriptionRow> {
    visits
        .iter()
        .flat_map(|visit| {
            visit.receipts.iter().flat_map(move |receipt| {
                receipt.drugs.iter().map(move |drug| PrescriptionRow {
                    patient_name: visit.patient_name.clone(),
                    patient_phone: visit.patient_phone.clone(),
                    visit_id: visit.id.clone(),
                    visit_date: visit.date.clone(),
                    visit_type: visit.visit_type.clone(),
                    receipt_id: receipt.id.clone(),
                    receipt_date: receipt.date.clone(),
                    notes: receipt.notes.clone(),
                    drug: drug.drug.clone(),
                    frequency: drug.frequency.clone(),
                    period: drug.period.clone(),
                    timing: drug.timing.clone(),
                })
            })
        })
        .collect()
}

/// Derive visits from patients' embedded visit lists, stamping each with
/// the owning patient's name and phone.
pub fn visits_from_patients(patients: &[Patient]) -> Vec<Visit> {
    patients
        .iter()
        .flat_map(|p| p.visits.iter().map(move |v| v.with_patient(p)))
        .collect()
}
