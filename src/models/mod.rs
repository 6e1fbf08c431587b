pub mod records;
pub mod report;

pub use records::{Drug, Patient, PrescriptionRow, Receipt, Visit};
pub use report::{ReportFormat, ReportQuery, ReportRecords, ReportRow, ReportType};
