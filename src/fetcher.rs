//! Report data fetcher.
//!
//! Three report kinds:
//! - patients: one endpoint scoped by doctor (and optionally clinic)
//! - visits: ordered data sources, first structurally valid one wins
//! - prescriptions: always derived from visits → receipts → drugs
//!
//! Patient failures propagate. Visit sources are tried in order and an
//! exhausted list yields an empty sequence; prescription derivation
//! inherits that and never fails.

use serde_json::{json, Value};

use crate::client::{ClinicApi, FetchError};
use crate::config::VISITS_PAGE_SIZE;
use crate::models::{Patient, PrescriptionRow, ReportQuery, ReportRecords, ReportType, Visit};
use crate::normalize::{self, DateRange};

const VISITS_PATH: &str = "/patients/visits";

fn patients_path(doctor_id: &str) -> String {
    format!("/patients/doctor/{doctor_id}")
}

/// Where visit records can come from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitSource {
    /// Dedicated visits endpoint.
    VisitsEndpoint,
    /// Re-derived from each patient's embedded visit list.
    DerivedFromPatients,
}

pub const VISIT_SOURCES: &[VisitSource] = &[VisitSource::VisitsEndpoint, VisitSource::DerivedFromPatients];

impl VisitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitSource::VisitsEndpoint => "visits_endpoint",
            VisitSource::DerivedFromPatients => "derived_from_patients",
        }
    }
}

/// Shared validity check for any visit source: the body must carry a
/// `visits` array of visit objects.
pub fn parse_visits_body(body: &Value) -> Result<Vec<Visit>, FetchError> {
    let list = body
        .get("visits")
        .filter(|v| v.is_array())
        .ok_or_else(|| FetchError::Shape("response has no `visits` array".into()))?;
    serde_json::from_value(list.clone())
        .map_err(|e| FetchError::Shape(format!("invalid visit entry: {e}")))
}

/// Patients arrive either as a bare array or wrapped as `{ "patients": [...] }`.
pub fn parse_patients_body(body: &Value) -> Result<Vec<Patient>, FetchError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(map) => map
            .get("patients")
            .filter(|v| v.is_array())
            .ok_or_else(|| FetchError::Shape("response has no `patients` array".into()))?,
        _ => return Err(FetchError::Shape("patients response is not a list".into())),
    };
    serde_json::from_value(list.clone())
        .map_err(|e| FetchError::Shape(format!("invalid patient entry: {e}")))
}

pub struct ReportFetcher<A> {
    api: A,
}

impl<A: ClinicApi> ReportFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// All patients for the doctor (and clinic, when given), unfiltered.
    pub async fn fetch_patients(&self, query: &ReportQuery) -> Result<Vec<Patient>, FetchError> {
        let mut params = Vec::new();
        if let Some(clinic) = query.clinic() {
            params.push(("clinic_id", clinic.to_string()));
        }

        let body = self
            .api
            .get_json(&patients_path(&query.doctor_id), &params)
            .await
            .inspect_err(|e| tracing::error!(doctor_id = %query.doctor_id, "Patient fetch failed: {e}"))?;

        parse_patients_body(&body)
            .inspect_err(|e| tracing::error!(doctor_id = %query.doctor_id, "Patient response rejected: {e}"))
    }

    /// Visits from the first source that yields a valid body. When every
    /// source fails the result is empty.
    pub async fn fetch_visits(&self, query: &ReportQuery) -> Vec<Visit> {
        for source in VISIT_SOURCES {
            let outcome = match self.visit_body(*source, query).await {
                Ok(body) => parse_visits_body(&body),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(visits) => {
                    tracing::debug!(source = source.as_str(), count = visits.len(), "Visits fetched");
                    return visits;
                }
                Err(e) => {
                    tracing::warn!(source = source.as_str(), "Visit source failed: {e}");
                }
            }
        }

        tracing::warn!(doctor_id = %query.doctor_id, "All visit sources failed, returning no visits");
        Vec::new()
    }

    async fn visit_body(&self, source: VisitSource, query: &ReportQuery) -> Result<Value, FetchError> {
        match source {
            VisitSource::VisitsEndpoint => {
                let mut params = vec![("doctor_id", query.doctor_id.clone())];
                if let Some(clinic) = query.clinic() {
                    params.push(("clinic_id", clinic.to_string()));
                }
                params.push(("limit", VISITS_PAGE_SIZE.to_string()));
                self.api.get_json(VISITS_PATH, &params).await
            }
            VisitSource::DerivedFromPatients => {
                let patients = self.fetch_patients(query).await?;
                let visits = normalize::visits_from_patients(&patients);
                let list = serde_json::to_value(&visits)
                    .map_err(|e| FetchError::Shape(format!("cannot re-encode derived visits: {e}")))?;
                Ok(json!({ "visits": list }))
            }
        }
    }

    /// One row per drug across all visits. Never fails.
    pub async fn fetch_prescriptions(&self, query: &ReportQuery) -> Vec<PrescriptionRow> {
        let visits = self.fetch_visits(query).await;
        normalize::flatten_prescriptions(&visits)
    }

    /// Fetch, filter by range and visit types, and cap at `query.limit`,
    /// keeping the original order.
    pub async fn fetch_report(
        &self,
        report_type: ReportType,
        query: &ReportQuery,
        range: DateRange,
    ) -> Result<ReportRecords, FetchError> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let visit_types = query.visit_type_filter();

        let records = match report_type {
            ReportType::Patient => {
                let patients = self.fetch_patients(query).await?;
                ReportRecords::Patients(
                    normalize::filter_records(&patients, range, None)
                        .take(limit)
                        .cloned()
                        .collect(),
                )
            }
            ReportType::Visit => {
                let visits = self.fetch_visits(query).await;
                ReportRecords::Visits(
                    normalize::filter_records(&visits, range, visit_types)
                        .take(limit)
                        .cloned()
                        .collect(),
                )
            }
            ReportType::Prescription => {
                let rows = self.fetch_prescriptions(query).await;
                ReportRecords::Prescriptions(
                    normalize::filter_records(&rows, range, visit_types)
                        .take(limit)
                        .cloned()
                        .collect(),
                )
            }
        };

        tracing::info!(
            report = report_type.as_str(),
            start = %range.start(),
            end = %range.end(),
            rows = records.len(),
            "Report data ready"
        );
        Ok(records)
    }
}
