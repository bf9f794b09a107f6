//! Certificate fixtures generated on the fly for tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

pub struct CertSpec {
    subject: String,
    issuer: Option<String>,
    not_before: i64,
    not_after: i64,
    sans: Vec<String>,
    ips: Vec<String>,
}

impl CertSpec {
    pub fn new(subject: &str) -> Self {
        let now = now();
        CertSpec {
            subject: subject.to_string(),
            issuer: Some("Test CA".to_string()),
            not_before: now - 86_400,
            not_after: now + 86_400,
            sans: Vec::new(),
            ips: Vec::new(),
        }
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    pub fn issuer_without_cn(mut self) -> Self {
        self.issuer = None;
        self
    }

    pub fn window(mut self, not_before: i64, not_after: i64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn sans(mut self, names: &[&str]) -> Self {
        self.sans = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn ips(mut self, ips: &[&str]) -> Self {
        self.ips = ips.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn build(&self) -> X509 {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let mut subject = X509NameBuilder::new().unwrap();
        subject
            .append_entry_by_nid(Nid::COMMONNAME, &self.subject)
            .unwrap();
        let subject = subject.build();

        let mut issuer = X509NameBuilder::new().unwrap();
        match &self.issuer {
            Some(cn) => issuer.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap(),
            None => issuer
                .append_entry_by_nid(Nid::ORGANIZATIONNAME, "Nameless Authority")
                .unwrap(),
        }
        let issuer = issuer.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&subject).unwrap();
        builder.set_issuer_name(&issuer).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix(self.not_before as _).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix(self.not_after as _).unwrap())
            .unwrap();

        if !self.sans.is_empty() || !self.ips.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for name in &self.sans {
                san.dns(name);
            }
            for ip in &self.ips {
                san.ip(ip);
            }
            let extension = san
                .build(&builder.x509v3_context(None, None))
                .unwrap();
            builder.append_extension(extension).unwrap();
        }

        builder.sign(&key, MessageDigest::sha256()).unwrap();
        builder.build()
    }

    pub fn pem(&self) -> Vec<u8> {
        self.build().to_pem().unwrap()
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.pem()).unwrap();
        path
    }
}
