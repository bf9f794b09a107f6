//! Error types for certificate discovery and metric export.
//!
//! [`LoadError`] describes why a single candidate path did not yield a usable
//! certificate. It never escapes a collection pass: the collector turns every
//! `LoadError` into a load-error sample and moves on to the next path.
//!
//! [`ExporterError`] covers failures of the exporter itself (metric
//! registration, HTTP serving, encoding).

use std::io;

use thiserror::Error;

/// Reason a candidate path failed to produce a certificate record.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not exist on the filesystem
    #[error("{path} does not exist")]
    NotFound {
        /// The missing path
        path: String,
    },

    /// The path exists but is not a regular file (directory, FIFO, socket, ...)
    #[error("{path} is not a regular file")]
    NotRegularFile {
        /// The offending path
        path: String,
    },

    /// Reading the file content failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path being read
        path: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The content could not be decoded as PEM encoded X.509
    #[error("failed to decode certificate: {details}")]
    Decode {
        /// Details reported by OpenSSL
        details: String,
    },

    /// The content decoded cleanly but held no certificate block
    #[error("no PEM certificate found")]
    NoCertificate,
}

impl From<openssl::error::ErrorStack> for LoadError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::Decode {
            details: e.to_string(),
        }
    }
}

/// Errors raised by the exporter outside of a collection pass.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Metric construction or registration failed
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Binding the listen socket or serving requests failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Rendering a report failed
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),

    /// The HTTP server stopped with an error
    #[error("server error: {message}")]
    Server {
        /// Error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = LoadError::NotFound {
            path: "/etc/ssl/missing.pem".to_string(),
        };
        assert_eq!(err.to_string(), "/etc/ssl/missing.pem does not exist");

        let err = LoadError::NotRegularFile {
            path: "/tmp/fifo.pem".to_string(),
        };
        assert_eq!(err.to_string(), "/tmp/fifo.pem is not a regular file");
    }

    #[test]
    fn test_load_error_from_openssl() {
        let stack = openssl::x509::X509::from_pem(b"garbage").unwrap_err();
        let err: LoadError = stack.into();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(err.to_string().starts_with("failed to decode certificate"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let err = LoadError::Read {
            path: "/root/key.pem".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "failed to read /root/key.pem: denied");
    }
}
