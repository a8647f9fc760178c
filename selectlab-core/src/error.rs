//! Error taxonomy: fatal run errors vs per-step recoverable diagnostics.
//!
//! Only integrity violations abort a run: a lookahead breach invalidates
//! every downstream number, and a bad configuration is caught before the
//! loop starts. Everything else — missing bars, provider failures, rejected
//! allocations — is recovered locally and recorded as a `Diagnostic` on the
//! affected variant's result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::market::SeriesError;

/// Fatal simulation errors. A timeframe run that hits one of these yields no
/// result; recoverable conditions never surface here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("market data error: {0}")]
    Series(#[from] SeriesError),

    #[error(
        "lookahead violation: provider '{provider}' returned data asof {asof} \
         while simulating {current}"
    )]
    Lookahead {
        provider: String,
        asof: NaiveDate,
        current: NaiveDate,
    },
}

/// What went sideways on one step, recorded rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A symbol had no bar on this date; its order was deferred.
    DeferredFill,
    /// A buy could not be satisfied under the constraints and was dropped.
    AllocationRejected,
    /// The candidate feed produced nothing for this date.
    EmptyCandidates,
    /// A provider in the chain failed and the next one was tried.
    ProviderFailover,
    /// A held symbol stopped trading and is marked at its last known price.
    StaleMark,
    /// Market data for a symbol was unavailable for part of the range.
    DataGap,
}

/// One recoverable incident, attached to the step (date) it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub date: NaiveDate,
    pub kind: DiagnosticKind,
    /// Symbol or provider the incident concerns, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(date: NaiveDate, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            subject: None,
            detail: detail.into(),
        }
    }

    pub fn for_subject(
        date: NaiveDate,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            date,
            kind,
            subject: Some(subject.into()),
            detail: detail.into(),
        }
    }
}
