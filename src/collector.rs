//! Collection pass: discovery, loading and projection into metric families.
//!
//! A [`CertificateCollector`] holds the immutable search configuration and the
//! metric descriptions. Every call to [`CertificateCollector::families`] (which
//! is what the registry invokes on each scrape) walks the filesystem again and
//! builds brand new metric vectors, so concurrent scrapes never share state.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Histogram, HistogramOpts, Opts, Registry};
use serde::Serialize;
use tracing::{debug, warn};

use crate::certificate::{decode_pem, CertificateRecord};
use crate::discovery::SearchConfig;
use crate::error::{ExporterError, LoadError};

pub const BEGIN_VALIDITY_METRIC: &str = "ssl_certificate_begin_validity_timestamp";
pub const END_VALIDITY_METRIC: &str = "ssl_certificate_end_validity_timestamp";
pub const LOAD_ERROR_METRIC: &str = "certificateexporter_load_error";
pub const LOOKUP_DURATION_METRIC: &str = "certificateexporter_lookup_duration";

const CERTIFICATE_LABELS: [&str; 3] = ["path", "issuer", "subjects"];
const LOAD_ERROR_LABELS: [&str; 1] = ["path"];

/// A path that did not yield any certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scan {
    pub certificates: Vec<CertificateRecord>,
    pub failures: Vec<LoadFailure>,
}

#[derive(Clone)]
pub struct CertificateCollector {
    search: SearchConfig,
    begin_validity: GaugeVec,
    end_validity: GaugeVec,
    load_error: GaugeVec,
    lookup_duration: Histogram,
}

impl CertificateCollector {
    pub fn new(search: SearchConfig) -> Result<Self, ExporterError> {
        let (begin_validity, end_validity, load_error) = gauge_vecs()?;
        let lookup_duration = Histogram::with_opts(HistogramOpts::new(
            LOOKUP_DURATION_METRIC,
            "Number of seconds it took to load all certificates",
        ))?;

        Ok(CertificateCollector {
            search,
            begin_validity,
            end_validity,
            load_error,
            lookup_duration,
        })
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    /// Registers the collector and its lookup duration histogram.
    pub fn register(self, registry: &Registry) -> Result<(), ExporterError> {
        registry.register(Box::new(self.lookup_duration.clone()))?;
        registry.register(Box::new(self))?;
        Ok(())
    }

    /// Runs discovery and loads every candidate.
    ///
    /// Never fails: each candidate that cannot be loaded ends up in
    /// [`Scan::failures`] and the pass carries on with the next one.
    pub fn scan(&self) -> Scan {
        let timer = self.lookup_duration.start_timer();
        let mut scan = Scan::default();

        for candidate in self.search.discover() {
            let path = candidate.path.display().to_string();
            match load_certificates(&candidate.path, &path) {
                Ok(records) => scan.certificates.extend(records),
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to load certificate");
                    scan.failures.push(LoadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        timer.observe_duration();
        debug!(
            certificates = scan.certificates.len(),
            failures = scan.failures.len(),
            "Collection pass finished"
        );
        scan
    }

    /// Runs a pass and returns the begin validity, end validity and load
    /// error families, in that order.
    pub fn families(&self) -> Vec<MetricFamily> {
        self.families_for(&self.scan())
    }

    /// Projects an existing scan into metric families.
    pub fn families_for(&self, scan: &Scan) -> Vec<MetricFamily> {
        let (begin, end, errors) = match gauge_vecs() {
            Ok(vecs) => vecs,
            Err(e) => {
                warn!(error = %e, "Failed to build certificate metric families");
                return self.empty_families();
            }
        };

        let mut seen = HashSet::new();
        for record in &scan.certificates {
            let issuer = record.issuer_label();
            let subjects = record.subjects_label();
            if !seen.insert((record.path.as_str(), issuer, subjects.clone())) {
                debug!(path = %record.path, subjects = %subjects, "Skipping duplicate certificate");
                continue;
            }
            let labels = [record.path.as_str(), issuer, subjects.as_str()];
            begin.with_label_values(&labels).set(record.not_before);
            end.with_label_values(&labels).set(record.not_after);
        }
        for failure in &scan.failures {
            errors.with_label_values(&[failure.path.as_str()]).set(1.0);
        }

        let mut families = begin.collect();
        families.extend(end.collect());
        families.extend(errors.collect());
        families
    }

    /// The three families without samples, taken from the description vecs.
    fn empty_families(&self) -> Vec<MetricFamily> {
        let mut families = self.begin_validity.collect();
        families.extend(self.end_validity.collect());
        families.extend(self.load_error.collect());
        families
    }
}

impl Collector for CertificateCollector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.begin_validity.desc();
        descs.extend(self.end_validity.desc());
        descs.extend(self.load_error.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.families()
    }
}

fn gauge_vecs() -> Result<(GaugeVec, GaugeVec, GaugeVec), prometheus::Error> {
    let begin = GaugeVec::new(
        Opts::new(
            BEGIN_VALIDITY_METRIC,
            "Beginning of certificate validity timestamp",
        ),
        &CERTIFICATE_LABELS,
    )?;
    let end = GaugeVec::new(
        Opts::new(END_VALIDITY_METRIC, "End of certificate validity timestamp"),
        &CERTIFICATE_LABELS,
    )?;
    let errors = GaugeVec::new(
        Opts::new(LOAD_ERROR_METRIC, "Certificates that failed to load"),
        &LOAD_ERROR_LABELS,
    )?;
    Ok((begin, end, errors))
}

/// Validates, reads and decodes one candidate into its records.
pub fn load_certificates(path: &Path, label: &str) -> Result<Vec<CertificateRecord>, LoadError> {
    let metadata = fs::metadata(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: label.to_string(),
        },
        _ => LoadError::Read {
            path: label.to_string(),
            source,
        },
    })?;
    if !metadata.is_file() {
        return Err(LoadError::NotRegularFile {
            path: label.to_string(),
        });
    }

    let content = fs::read(path).map_err(|source| LoadError::Read {
        path: label.to_string(),
        source,
    })?;

    decode_pem(&content)?
        .iter()
        .map(|cert| CertificateRecord::from_x509(cert, label))
        .collect()
}
