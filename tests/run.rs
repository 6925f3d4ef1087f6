use std::cell::RefCell;
use std::io::Write;

use sample_qc_alert::aggregation::AggregateError;
use sample_qc_alert::mail::{MailError, Mailer};
use sample_qc_alert::reporting::AlertEmail;
use sample_qc_alert::run;
use sample_qc_alert::validation::ValidationError;
use tempfile::NamedTempFile;

#[derive(Default)]
struct RecordingMailer {
    sent: RefCell<Vec<AlertEmail>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &AlertEmail) -> Result<(), MailError> {
        self.sent.borrow_mut().push(email.clone());
        Ok(())
    }
}

struct RejectingMailer;

impl Mailer for RejectingMailer {
    fn send(&self, _email: &AlertEmail) -> Result<(), MailError> {
        let address = "not an address";
        let source = address.parse::<lettre::Address>().unwrap_err();
        Err(MailError::Address {
            address: address.to_string(),
            source,
        })
    }
}

fn write_samples(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create sample file");
    file.write_all(contents.as_bytes()).expect("write sample file");
    file
}

#[test]
fn offending_origins_are_mailed() {
    let file = write_samples(
        "id,a,b,c,d,qc_pass\n\
         X-1,1,2,3,4,TRUE\n\
         OK-1,1,2,3,4,TRUE\n\
         X-2,1,2,3,4,FALSE\n\
         X-3,1,2,3,4,FALSE\n",
    );
    let mailer = RecordingMailer::default();

    let outcome = run(file.path(), "lab@example.org", &mailer).expect("run");
    assert!(outcome.alert_sent);
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.tally.len(), 2);

    let sent = mailer.sent.borrow();
    assert_eq!(sent.len(), 1);
    let expected = format!(
        "During parsing of {} there were origins that failed >10% of samples:\n\
         origin, quota_failed\n\
         X, 0.6666666666666667\n",
        file.path().display()
    );
    assert_eq!(sent[0].body, expected);
    assert_eq!(sent[0].subject, "Sample parse status");
    assert_eq!(sent[0].to, "lab@example.org");
}

#[test]
fn clean_run_sends_nothing() {
    let mut contents = String::from("id,a,b,c,d,qc_pass\n");
    for i in 0..11 {
        let qc = if i == 0 { "FALSE" } else { "TRUE" };
        contents.push_str(&format!("Y-{},1,2,3,4,{}\n", i, qc));
    }
    let file = write_samples(&contents);
    let mailer = RecordingMailer::default();

    let outcome = run(file.path(), "lab@example.org", &mailer).expect("run");
    assert!(!outcome.alert_sent);
    assert!(outcome.reports.is_empty());
    assert!(mailer.sent.borrow().is_empty());
}

#[test]
fn missing_file_never_reaches_mailer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mailer = RecordingMailer::default();

    let err = run(dir.path().join("absent.csv"), "lab@example.org", &mailer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ValidationError>(),
        Some(ValidationError::FileNotFound(_))
    ));
    assert!(mailer.sent.borrow().is_empty());
}

#[test]
fn malformed_header_never_reaches_mailer() {
    let file = write_samples("id,a,b,c,qc_pass\nX-1,1,2,3,FALSE\n");
    let mailer = RecordingMailer::default();

    let err = run(file.path(), "lab@example.org", &mailer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ValidationError>(),
        Some(ValidationError::MalformedHeader(_))
    ));
    assert!(mailer.sent.borrow().is_empty());
}

#[test]
fn short_row_aborts_before_mailing() {
    let file = write_samples("id,a,b,c,d,qc_pass\nX-1,1,2,3,4,FALSE\nX-2,FALSE\n");
    let mailer = RecordingMailer::default();

    let err = run(file.path(), "lab@example.org", &mailer).unwrap_err();
    assert!(err.downcast_ref::<ValidationError>().is_none());
    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::MalformedRow { line: 3, fields: 2 })
    ));
    assert!(mailer.sent.borrow().is_empty());
}

#[test]
fn mail_failure_propagates() {
    let file = write_samples("id,a,b,c,d,qc_pass\nX-1,1,2,3,4,FALSE\n");

    let err = run(file.path(), "lab@example.org", &RejectingMailer).unwrap_err();
    assert!(err.downcast_ref::<MailError>().is_some());
    assert!(err.to_string().contains("Failed to send QC alert"));
}
