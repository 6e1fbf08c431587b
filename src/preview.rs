//! Report preview state machine.
//!
//! States: Idle → Loading → Loaded | Error. Every new selection stamps a
//! fresh generation; a completion carrying an older generation is dropped,
//! so a slow superseded fetch can never overwrite a newer result.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::client::{ClinicApi, FetchError};
use crate::config::PREVIEW_ROW_CAP;
use crate::export::{self, columns_for};
use crate::fetcher::ReportFetcher;
use crate::i18n::{self, Direction, Language};
use crate::models::{ReportQuery, ReportRecords, ReportRow, ReportType};
use crate::normalize::DateRange;

/// A preview selection: report type plus the report query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub report_type: Option<ReportType>,
    #[serde(flatten)]
    pub query: ReportQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewState {
    Idle,
    Loading,
    Loaded { rows: Vec<ReportRow> },
    Error { detail: String },
}

impl PreviewState {
    pub fn name(&self) -> &'static str {
        match self {
            PreviewState::Idle => "idle",
            PreviewState::Loading => "loading",
            PreviewState::Loaded { .. } => "loaded",
            PreviewState::Error { .. } => "error",
        }
    }
}

/// Issued when a selection enters Loading; hand it back on completion.
#[derive(Debug, Clone)]
pub struct PreviewTicket {
    pub generation: u64,
    pub report_type: ReportType,
    pub query: ReportQuery,
    pub range: DateRange,
}

#[derive(Debug)]
struct Inner {
    state: PreviewState,
    report_type: Option<ReportType>,
    generation: u64,
}

/// Column header as shown to the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewColumn {
    pub field: &'static str,
    pub label: String,
}

/// Localized, serializable snapshot of the preview.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub state: &'static str,
    pub generation: u64,
    pub report_type: Option<ReportType>,
    pub direction: Direction,
    pub message: Option<String>,
    pub columns: Vec<PreviewColumn>,
    pub rows: Vec<ReportRow>,
}

pub struct PreviewSession {
    inner: Mutex<Inner>,
}

impl Default for PreviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PreviewState::Idle,
                report_type: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PreviewState {
        self.lock().state.clone()
    }

    /// Apply a new selection. Returns a ticket when the selection is
    /// complete enough to load (type and both range ends present).
    pub fn select(&self, request: &PreviewRequest) -> Option<PreviewTicket> {
        let mut inner = self.lock();
        inner.generation += 1;
        let generation = inner.generation;
        inner.report_type = request.report_type;

        let (Some(report_type), Some(start), Some(end)) = (
            request.report_type,
            request.query.start_date,
            request.query.end_date,
        ) else {
            inner.state = PreviewState::Idle;
            return None;
        };

        match DateRange::new(start, end) {
            Ok(range) => {
                inner.state = PreviewState::Loading;
                Some(PreviewTicket {
                    generation,
                    report_type,
                    query: request.query.clone(),
                    range,
                })
            }
            Err(e) => {
                inner.state = PreviewState::Error { detail: e.to_string() };
                None
            }
        }
    }

    /// Record the outcome of a load. Returns `false` (and changes nothing)
    /// when a newer selection has been made since the ticket was issued.
    pub fn complete(&self, ticket: &PreviewTicket, result: Result<ReportRecords, FetchError>) -> bool {
        let mut inner = self.lock();
        if ticket.generation != inner.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = inner.generation,
                "Discarding stale preview result"
            );
            return false;
        }

        inner.state = match result {
            Ok(records) => {
                let mut rows = export::clean_rows(&records);
                rows.truncate(PREVIEW_ROW_CAP);
                PreviewState::Loaded { rows }
            }
            Err(e) => {
                tracing::error!(report = ticket.report_type.as_str(), "Preview load failed: {e}");
                PreviewState::Error { detail: e.to_string() }
            }
        };
        true
    }

    /// Select, fetch at most the preview cap, and complete.
    pub async fn refresh<A: ClinicApi>(
        &self,
        fetcher: &ReportFetcher<A>,
        request: &PreviewRequest,
        language: Language,
    ) -> PreviewView {
        if let Some(ticket) = self.select(request) {
            let mut query = ticket.query.clone();
            query.limit = Some(query.limit.map_or(PREVIEW_ROW_CAP, |l| l.min(PREVIEW_ROW_CAP)));
            let result = fetcher.fetch_report(ticket.report_type, &query, ticket.range).await;
            self.complete(&ticket, result);
        }
        self.snapshot(language)
    }

    pub fn snapshot(&self, language: Language) -> PreviewView {
        let inner = self.lock();

        let message_key = match &inner.state {
            PreviewState::Idle => Some("preview.select_range"),
            PreviewState::Loading => Some("preview.loading"),
            PreviewState::Loaded { rows } if rows.is_empty() => Some("preview.empty"),
            PreviewState::Loaded { .. } => None,
            PreviewState::Error { .. } => Some("preview.error"),
        };

        let columns = inner
            .report_type
            .map(|rt| {
                columns_for(rt)
                    .iter()
                    .map(|c| PreviewColumn {
                        field: c.field,
                        label: i18n::translate(language, c.label_key),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows = match &inner.state {
            PreviewState::Loaded { rows } => rows.clone(),
            _ => Vec::new(),
        };

        PreviewView {
            state: inner.state.name(),
            generation: inner.generation,
            report_type: inner.report_type,
            direction: language.direction(),
            message: message_key.map(|k| i18n::translate(language, k)),
            columns,
            rows,
        }
    }
}
