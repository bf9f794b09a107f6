//! Prometheus exporter for TLS certificates stored on disk.
//!
//! The exporter walks the configured paths on every scrape, decodes each
//! certificate it finds with OpenSSL and reports:
//!
//! - `ssl_certificate_begin_validity_timestamp{path, issuer, subjects}`
//! - `ssl_certificate_end_validity_timestamp{path, issuer, subjects}`
//! - `certificateexporter_load_error{path}` for every path that could not be loaded
//! - `certificateexporter_lookup_duration` timing each discovery pass
//!
//! ```no_run
//! use std::path::PathBuf;
//! use certificate_exporter::{CertificateCollector, SearchConfig};
//!
//! let search = SearchConfig::new(vec![PathBuf::from("/etc/ssl/private")])
//!     .with_suffixes(vec![".pem".to_string()]);
//! let collector = CertificateCollector::new(search)?;
//! for record in collector.scan().certificates {
//!     println!("{} expires at {}", record.path, record.not_after);
//! }
//! # Ok::<(), certificate_exporter::ExporterError>(())
//! ```

pub mod certificate;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod metrics;
pub mod report;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod fixtures;

pub use certificate::{decode_pem, CertificateRecord};
pub use collector::{CertificateCollector, LoadFailure, Scan};
pub use config::{Config, ConfigError, Settings};
pub use discovery::{Candidate, Discovery, SearchConfig};
pub use error::{ExporterError, LoadError};
pub use report::{OutputFormat, Validity};
