//! Per-origin QC aggregation module
//!
//! Streams the sample file, groups QC outcomes by origin and picks out the
//! origins whose failure ratio reaches the alert threshold.

use crate::{
    FailureReport, OriginStats, QcOutcome, SampleRecord, EXPECTED_COLUMNS, FIELD_DELIMITER,
    QC_COLUMN,
};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Line {line} has {fields} fields, expected at least 6")]
    MalformedRow { line: usize, fields: usize },

    #[error("Failed to read sample file: {0}")]
    Io(#[from] std::io::Error),
}

/// Split one data line into a sample record.
///
/// `line` is the 1-based line number in the file, used for error reporting.
pub fn parse_line(text: &str, line: usize) -> Result<SampleRecord, AggregateError> {
    let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();
    if fields.len() < EXPECTED_COLUMNS {
        return Err(AggregateError::MalformedRow {
            line,
            fields: fields.len(),
        });
    }

    Ok(SampleRecord {
        sample_id: fields[0].to_string(),
        outcome: QcOutcome::from_token(fields[QC_COLUMN].trim_end()),
    })
}

/// Origin counters in the order origins were first seen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginTally {
    origins: IndexMap<String, OriginStats>,
}

impl OriginTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &SampleRecord) {
        match self.origins.get_mut(record.origin()) {
            Some(stats) => stats.record(record.outcome),
            None => {
                let mut stats = OriginStats::default();
                stats.record(record.outcome);
                self.origins.insert(record.origin().to_string(), stats);
            }
        }
    }

    pub fn get(&self, origin: &str) -> Option<&OriginStats> {
        self.origins.get(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OriginStats)> {
        self.origins.iter().map(|(origin, stats)| (origin.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn total_samples(&self) -> u64 {
        self.origins.values().map(|s| s.total).sum()
    }

    /// Origins at or above the threshold, in discovery order
    pub fn failure_reports(&self) -> Vec<FailureReport> {
        self.iter()
            .filter(|(_, stats)| stats.reaches_threshold())
            .map(|(origin, stats)| {
                log::warn!(
                    "Origin {} failed {} of {} samples",
                    origin,
                    stats.failed(),
                    stats.total
                );
                FailureReport {
                    origin: origin.to_string(),
                    failure_ratio: stats.failure_ratio(),
                }
            })
            .collect()
    }
}

/// Read every data line of `sample_file` (header skipped) into a tally
pub fn tally_file<P: AsRef<Path>>(sample_file: P) -> Result<OriginTally, AggregateError> {
    let reader = BufReader::new(File::open(sample_file.as_ref())?);
    let mut tally = OriginTally::new();

    for (index, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let record = parse_line(&line, index + 1)?;
        tally.add(&record);
    }

    log::debug!(
        "Tallied {} samples across {} origins from {}",
        tally.total_samples(),
        tally.len(),
        sample_file.as_ref().display()
    );
    for (origin, stats) in tally.iter() {
        log::debug!("{}: {}/{} passed", origin, stats.passed, stats.total);
    }

    Ok(tally)
}

/// Failure reports for `sample_file`
pub fn aggregate<P: AsRef<Path>>(sample_file: P) -> Result<Vec<FailureReport>, AggregateError> {
    Ok(tally_file(sample_file)?.failure_reports())
}
