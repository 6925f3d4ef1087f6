//! Pre-flight validation module
//!
//! Checks the sample file and recipient address before any aggregation:
//! - the sample file exists and is a regular file
//! - the email address contains an `@`
//! - the header has six columns, the last being `qc_pass`

use crate::{EXPECTED_COLUMNS, FIELD_DELIMITER, QC_COLUMN, QC_HEADER_TOKEN};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File {} does not appear to exist...", .0.display())]
    FileNotFound(PathBuf),

    #[error("You gave {0} as email. Is this a real address? It doesn't contain an @...")]
    InvalidEmail(String),

    #[error("Header on {} looks odd. Expected 6 headers, and qc_pass.", .0.display())]
    MalformedHeader(PathBuf),

    #[error("File {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run all checks in order: file, email, header.
pub fn validate<P: AsRef<Path>>(sample_file: P, email: &str) -> Result<(), ValidationError> {
    let sample_file = sample_file.as_ref();

    if !sample_file.is_file() {
        return Err(ValidationError::FileNotFound(sample_file.to_path_buf()));
    }

    check_email(email)?;
    check_header(sample_file)?;

    log::debug!("Validated {} for recipient {}", sample_file.display(), email);
    Ok(())
}

/// Minimal shape check, not address validation
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Read the first line and check it against the expected layout
pub fn check_header(sample_file: &Path) -> Result<(), ValidationError> {
    let unreadable = |source| ValidationError::Unreadable {
        path: sample_file.to_path_buf(),
        source,
    };

    let file = File::open(sample_file).map_err(unreadable)?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(unreadable)?;

    if header_is_valid(&header) {
        Ok(())
    } else {
        Err(ValidationError::MalformedHeader(sample_file.to_path_buf()))
    }
}

fn header_is_valid(line: &str) -> bool {
    let columns: Vec<&str> = line.trim_end().split(FIELD_DELIMITER).collect();
    columns.len() == EXPECTED_COLUMNS && columns[QC_COLUMN] == QC_HEADER_TOKEN
}
