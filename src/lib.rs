//! Sample QC Alert
//!
//! Per-origin QC failure alerts for sample run reports.
//!
//! This library provides shared functionality for:
//! - Pre-flight validation of the sample file and recipient address
//! - Grouping QC outcomes by sample origin
//! - Composing and dispatching the alert email

pub mod aggregation;
pub mod mail;
pub mod reporting;
pub mod validation;

use anyhow::{Context, Result};
use std::path::Path;

use crate::aggregation::OriginTally;
use crate::mail::Mailer;

/// Failure ratio at or above which an origin is reported
pub const FAILURE_THRESHOLD: f64 = 0.10;
/// `FAILURE_THRESHOLD` as an exact fraction, used for the comparison itself
pub const THRESHOLD_NUMERATOR: u64 = 1;
pub const THRESHOLD_DENOMINATOR: u64 = 10;

/// QC token meaning the sample passed
pub const QC_PASS_TOKEN: &str = "TRUE";
/// Expected name of the sixth header column
pub const QC_HEADER_TOKEN: &str = "qc_pass";
pub const EXPECTED_COLUMNS: usize = 6;
/// Zero-based index of the QC column
pub const QC_COLUMN: usize = EXPECTED_COLUMNS - 1;
pub const FIELD_DELIMITER: char = ',';
pub const ORIGIN_SEPARATOR: char = '-';

/// QC outcome of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QcOutcome {
    Pass,
    Fail,
}

impl QcOutcome {
    /// Exact match against `TRUE`; every other token is a failure.
    pub fn from_token(token: &str) -> Self {
        if token == QC_PASS_TOKEN {
            QcOutcome::Pass
        } else {
            QcOutcome::Fail
        }
    }
}

/// One data row of the sample file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub sample_id: String,
    pub outcome: QcOutcome,
}

impl SampleRecord {
    /// Grouping key: the sample id up to its first `-`
    pub fn origin(&self) -> &str {
        origin_of(&self.sample_id)
    }
}

/// Returns the part of `sample_id` before the first separator, or the whole id.
pub fn origin_of(sample_id: &str) -> &str {
    sample_id
        .split_once(ORIGIN_SEPARATOR)
        .map(|(origin, _)| origin)
        .unwrap_or(sample_id)
}

/// Pass/fail counters for one origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OriginStats {
    pub total: u64,
    pub passed: u64,
}

impl OriginStats {
    pub fn record(&mut self, outcome: QcOutcome) {
        self.total += 1;
        if outcome == QcOutcome::Pass {
            self.passed += 1;
        }
    }

    pub fn failed(&self) -> u64 {
        self.total - self.passed
    }

    /// Fraction of samples that failed, computed as `1 - passed/total`
    pub fn failure_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - (self.passed as f64 / self.total as f64)
    }

    /// Inclusive threshold check on the integer counts
    pub fn reaches_threshold(&self) -> bool {
        self.total > 0
            && self.failed() * THRESHOLD_DENOMINATOR >= self.total * THRESHOLD_NUMERATOR
    }
}

/// An origin whose failure ratio reached the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    pub origin: String,
    pub failure_ratio: f64,
}

/// What a completed run did
#[derive(Debug)]
pub struct RunOutcome {
    pub tally: OriginTally,
    pub reports: Vec<FailureReport>,
    pub alert_sent: bool,
}

/// Validate, aggregate and notify.
///
/// Validation errors come back as `validation::ValidationError` inside the
/// `anyhow::Error` so callers can tell pre-flight failures apart.
pub fn run<P: AsRef<Path>>(sample_file: P, email: &str, mailer: &dyn Mailer) -> Result<RunOutcome> {
    let sample_file = sample_file.as_ref();

    validation::validate(sample_file, email)?;

    let tally = aggregation::tally_file(sample_file)
        .with_context(|| format!("Failed to aggregate {}", sample_file.display()))?;
    let reports = tally.failure_reports();

    let alert_sent = if reports.is_empty() {
        false
    } else {
        let label = sample_file.display().to_string();
        mail::notify(&reports, email, &label, mailer)
            .with_context(|| format!("Failed to send QC alert to {}", email))?;
        true
    };

    Ok(RunOutcome {
        tally,
        reports,
        alert_sent,
    })
}
