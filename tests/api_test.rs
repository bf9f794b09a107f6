//! Integration tests for the public API

use std::path::PathBuf;

use certificate_exporter::{
    decode_pem, CertificateCollector, Config, ConfigError, ExporterError, LoadError,
    OutputFormat, SearchConfig, Validity,
};

#[test]
fn test_public_api_compiles() {
    // This test ensures the public API is usable and compiles correctly
    fn scan(path: &str) -> Result<usize, ExporterError> {
        let collector = CertificateCollector::new(SearchConfig::new(vec![PathBuf::from(path)]))?;
        Ok(collector.scan().certificates.len())
    }

    let _ = scan;
}

#[test]
fn test_error_types_are_public() {
    // Verify error types can be matched
    fn describe(err: LoadError) -> String {
        match err {
            LoadError::NotFound { path } => format!("missing {}", path),
            LoadError::NotRegularFile { path } => format!("not a file {}", path),
            LoadError::Read { path, source } => format!("read {}: {}", path, source),
            LoadError::Decode { details } => format!("decode: {}", details),
            LoadError::NoCertificate => "empty".to_string(),
        }
    }

    let msg = describe(LoadError::NotFound {
        path: "/etc/ssl/test.pem".to_string(),
    });
    assert!(msg.contains("/etc/ssl/test.pem"));
}

#[test]
fn test_decode_error_is_reported() {
    assert!(matches!(
        decode_pem(b"hello"),
        Err(LoadError::NoCertificate)
    ));
}

#[test]
fn test_config_validation_error_display() {
    let err = Config::default().validate().unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().starts_with("Validation Error:"));
}

#[test]
fn test_report_types_are_public() {
    let formats = vec![OutputFormat::Text, OutputFormat::Json];
    let states = vec![Validity::Valid, Validity::Expired, Validity::NotYetValid];

    assert_eq!(formats.len(), 2);
    assert_eq!(states.len(), 3);
    assert_eq!(OutputFormat::Json.to_string(), "json");
}
