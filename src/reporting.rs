//! Alert report module
//!
//! Turns failure reports into the plain-text alert email.

use crate::{FailureReport, THRESHOLD_DENOMINATOR, THRESHOLD_NUMERATOR};

pub const ALERT_SUBJECT: &str = "Sample parse status";
pub const ALERT_SENDER: &str = "emilio.rudbeck@gu.se";
pub const REPORT_HEADER: &str = "origin, quota_failed";

/// Alert email ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEmail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: String,
}

impl AlertEmail {
    /// Build the alert for `reports`, naming `source_label` in the first line
    pub fn compose(reports: &[FailureReport], to: &str, source_label: &str) -> Self {
        Self {
            subject: ALERT_SUBJECT.to_string(),
            body: render_body(reports, source_label),
            from: ALERT_SENDER.to_string(),
            to: to.to_string(),
        }
    }
}

/// One line per report, `{origin}, {quota}` with the ratio unrounded
pub fn render_line(report: &FailureReport) -> String {
    format!("{}, {}", report.origin, report.failure_ratio)
}

pub fn render_body(reports: &[FailureReport], source_label: &str) -> String {
    let mut body = format!(
        "During parsing of {} there were origins that failed >{}% of samples:\n",
        source_label,
        100 * THRESHOLD_NUMERATOR / THRESHOLD_DENOMINATOR
    );
    body.push_str(REPORT_HEADER);
    body.push('\n');
    for report in reports {
        body.push_str(&render_line(report));
        body.push('\n');
    }
    body
}
