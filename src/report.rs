//! Human readable and JSON reports of a single collection pass (`--once`).

use comfy_table::Table;
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::certificate::CertificateRecord;
use crate::collector::{LoadFailure, Scan};
use crate::error::ExporterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where a certificate stands relative to the report time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Validity {
    Valid,
    Expired,
    NotYetValid,
}

impl Validity {
    pub fn at(record: &CertificateRecord, now: f64) -> Validity {
        if record.not_after < now {
            Validity::Expired
        } else if record.not_before > now {
            Validity::NotYetValid
        } else {
            Validity::Valid
        }
    }
}

#[derive(Serialize)]
struct JsonCertificate<'a> {
    #[serde(flatten)]
    record: &'a CertificateRecord,
    validity: Validity,
    days_left: i64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    certificates: Vec<JsonCertificate<'a>>,
    failures: &'a [LoadFailure],
}

fn days_left(record: &CertificateRecord, now: f64) -> i64 {
    ((record.not_after - now) / 86_400.0).floor() as i64
}

/// Renders `scan` as seen at `now` (seconds since the Unix epoch).
pub fn render(scan: &Scan, format: OutputFormat, now: f64) -> Result<String, ExporterError> {
    match format {
        OutputFormat::Json => {
            let report = JsonReport {
                certificates: scan
                    .certificates
                    .iter()
                    .map(|record| JsonCertificate {
                        record,
                        validity: Validity::at(record, now),
                        days_left: days_left(record, now),
                    })
                    .collect(),
                failures: &scan.failures,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Text => Ok(render_text(scan, now)),
    }
}

fn render_text(scan: &Scan, now: f64) -> String {
    let mut certificates = Table::new();
    certificates.set_header(vec![
        "Path",
        "Subjects",
        "Issuer",
        "Not Before",
        "Not After",
        "Days Left",
        "Status",
    ]);
    for record in &scan.certificates {
        certificates.add_row(vec![
            record.path.clone(),
            record.subjects_label(),
            record.issuer_label().to_string(),
            format!("{:.0}", record.not_before),
            format!("{:.0}", record.not_after),
            days_left(record, now).to_string(),
            Validity::at(record, now).to_string(),
        ]);
    }

    let mut output = certificates.to_string();
    if !scan.failures.is_empty() {
        let mut failures = Table::new();
        failures.set_header(vec!["Path", "Load Error"]);
        for failure in &scan.failures {
            failures.add_row(vec![failure.path.clone(), failure.reason.clone()]);
        }
        output.push('\n');
        output.push_str(&failures.to_string());
    }
    output
}
