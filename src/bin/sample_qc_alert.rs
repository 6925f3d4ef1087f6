//! Sample QC Alert Tool
//!
//! Parse a sample run report and email a summary of any origin failing QC on
//! at least 10% of its samples.

use anyhow::Result;
use clap::{Arg, Command};
use env_logger::Env;
use sample_qc_alert::mail::SmtpMailer;
use sample_qc_alert::validation::ValidationError;
use sample_qc_alert::{run, FAILURE_THRESHOLD};
use std::path::PathBuf;
use std::process;

fn main() -> Result<()> {
    let matches = Command::new("sample-qc-alert")
        .version("0.1.0")
        .about("Parse a textfile with run info and report on any origins failing >10% of samples via email.")
        .arg(
            Arg::new("sample_file")
                .long("sample_file")
                .value_name("FILE")
                .help("Path to txt-file with sample info (required)")
                .required(true),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("ADDRESS")
                .help("email to send result (required)")
                .required(true),
        )
        .get_matches();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    // Parse arguments
    let sample_file = PathBuf::from(matches.get_one::<String>("sample_file").unwrap());
    let email = matches.get_one::<String>("email").unwrap();

    println!("🧪 Sample QC Alert");
    println!("Input: {}", sample_file.display());
    println!("Recipient: {}", email);

    let mailer = SmtpMailer::default();
    let outcome = match run(&sample_file, email, &mailer) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(invalid) = err.downcast_ref::<ValidationError>() {
                eprintln!("{}", invalid);
                eprintln!("Exiting...");
                process::exit(1);
            }
            return Err(err);
        }
    };

    println!("📊 QC Results:");
    println!("  Total samples: {}", outcome.tally.total_samples());
    println!("  Origins: {}", outcome.tally.len());
    for (origin, stats) in outcome.tally.iter() {
        let marker = if stats.reaches_threshold() { "⚠️ " } else { "" };
        println!(
            "  {}{}: {}/{} passed ({:.1}% failed)",
            marker,
            origin,
            stats.passed,
            stats.total,
            stats.failure_ratio() * 100.0
        );
    }

    if outcome.alert_sent {
        println!(
            "📧 {} origin(s) at or above {:.0}% failures, alert sent to {}",
            outcome.reports.len(),
            FAILURE_THRESHOLD * 100.0,
            email
        );
    } else {
        println!(
            "✅ No origin at or above {:.0}% failures, no alert sent",
            FAILURE_THRESHOLD * 100.0
        );
    }

    Ok(())
}
