//! Certificate decoding and the attributes reported for each certificate.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use openssl::asn1::{Asn1StringRef, Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref, X509};
use serde::Serialize;

use crate::error::LoadError;

/// Issuer label used when the issuer has no common name.
pub const UNKNOWN_ISSUER: &str = "unknown";

/// Decodes every PEM `CERTIFICATE` block found in `pem`.
///
/// Other PEM blocks (keys, parameters) are skipped. Content with no
/// certificate block at all is reported as [`LoadError::NoCertificate`].
pub fn decode_pem(pem: &[u8]) -> Result<Vec<X509>, LoadError> {
    let certs = X509::stack_from_pem(pem)?;
    if certs.is_empty() {
        return Err(LoadError::NoCertificate);
    }
    Ok(certs)
}

/// Reportable view of one decoded certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRecord {
    /// File the certificate was loaded from
    pub path: String,
    /// Start of the validity window, seconds since the Unix epoch
    pub not_before: f64,
    /// End of the validity window, seconds since the Unix epoch
    pub not_after: f64,
    /// First common name of the issuer, empty when absent
    pub issuer_common_name: String,
    /// Subject common names followed by the subject alternative names
    pub subject_names: Vec<String>,
}

impl CertificateRecord {
    /// Extracts the reported attributes from a decoded certificate.
    pub fn from_x509(cert: &X509Ref, path: &str) -> Result<CertificateRecord, LoadError> {
        let epoch = Asn1Time::from_unix(0)?;

        let mut subject_names = common_names(cert.subject_name());
        if let Some(sans) = cert.subject_alt_names() {
            for name in sans.iter() {
                if let Some(dns) = name.dnsname() {
                    subject_names.push(dns.to_string());
                } else if let Some(email) = name.email() {
                    subject_names.push(email.to_string());
                } else if let Some(uri) = name.uri() {
                    subject_names.push(uri.to_string());
                } else if let Some(ip) = name.ipaddress().and_then(ip_to_string) {
                    subject_names.push(ip);
                }
            }
        }

        Ok(CertificateRecord {
            path: path.to_string(),
            not_before: seconds_since(&epoch, cert.not_before())?,
            not_after: seconds_since(&epoch, cert.not_after())?,
            issuer_common_name: common_names(cert.issuer_name())
                .into_iter()
                .next()
                .unwrap_or_default(),
            subject_names,
        })
    }

    /// Issuer common name, or `"unknown"` when the issuer has none.
    pub fn issuer_label(&self) -> &str {
        if self.issuer_common_name.is_empty() {
            UNKNOWN_ISSUER
        } else {
            &self.issuer_common_name
        }
    }

    /// Subject names joined with `;`.
    pub fn subjects_label(&self) -> String {
        self.subject_names.join(";")
    }
}

fn common_names(name: &X509NameRef) -> Vec<String> {
    name.entries_by_nid(Nid::COMMONNAME)
        .map(|entry| asn1_string(entry.data()))
        .collect()
}

fn asn1_string(data: &Asn1StringRef) -> String {
    match data.as_utf8() {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(data.as_slice()).into_owned(),
    }
}

fn seconds_since(epoch: &Asn1TimeRef, time: &Asn1TimeRef) -> Result<f64, LoadError> {
    let diff = epoch.diff(time)?;
    Ok(f64::from(diff.days) * 86_400.0 + f64::from(diff.secs))
}

fn ip_to_string(bytes: &[u8]) -> Option<String> {
    let addr = match bytes.len() {
        4 => IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(bytes).ok()?)),
        16 => IpAddr::V6(Ipv6Addr::from(<[u8; 16]>::try_from(bytes).ok()?)),
        _ => return None,
    };
    Some(addr.to_string())
}
