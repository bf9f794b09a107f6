use prometheus::{Encoder, Registry, TextEncoder};

use crate::collector::CertificateCollector;
use crate::error::ExporterError;

/// Builds the registry scraped by the HTTP endpoint.
///
/// # Arguments
/// * `collector` - certificate collector, run on every gather
pub fn build_registry(collector: CertificateCollector) -> Result<Registry, ExporterError> {
    let registry = Registry::new();
    collector.register(&registry)?;

    #[cfg(target_os = "linux")]
    registry.register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;

    Ok(registry)
}

/// Gathers every registered collector and renders the text exposition format.
pub fn encode(registry: &Registry) -> Result<String, ExporterError> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SearchConfig;
    use crate::fixtures::CertSpec;
    use tempfile::TempDir;

    #[test]
    fn test_encode_renders_certificate_metrics() {
        let dir = TempDir::new().unwrap();
        let path = CertSpec::new("metrics.example.com")
            .issuer("Metrics CA")
            .write(dir.path(), "metrics.pem");

        let collector =
            CertificateCollector::new(SearchConfig::new(vec![dir.path().to_path_buf()])).unwrap();
        let registry = build_registry(collector).unwrap();
        let output = encode(&registry).unwrap();

        assert!(output.contains("# TYPE ssl_certificate_begin_validity_timestamp gauge"));
        assert!(output.contains("# TYPE ssl_certificate_end_validity_timestamp gauge"));
        assert!(output.contains(&format!("path=\"{}\"", path.display())));
        assert!(output.contains("issuer=\"Metrics CA\""));
        assert!(output.contains("subjects=\"metrics.example.com\""));
    }
}
