use crate::catalog::CatalogEntry;
use bcder::Oid;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use x509_certificate::CapturedX509Certificate;

pub const UNKNOWN_SUBJECT: &str = "Unknown";
pub const UNKNOWN_ISSUER: &str = "Unknown Issuer";

// Attribute types from RFC 4519, DER encoded.
const OID_GIVEN_NAME: &[u8] = &[85, 4, 42];
const OID_SURNAME: &[u8] = &[85, 4, 4];
const OID_ORGANIZATION_NAME: &[u8] = &[85, 4, 10];

/// A validity bound. Parsed certificates give real timestamps, catalog
/// entries only give whatever text the certificate store printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityDate {
    Parsed(DateTime<Utc>),
    Display(String),
}

impl ValidityDate {
    pub fn format(&self, date_format: &str) -> String {
        match self {
            ValidityDate::Parsed(date) => date.format(date_format).to_string(),
            ValidityDate::Display(text) => text.clone(),
        }
    }
}

/// Normalized signer identity, input for the signature block.
///
/// `subject_common_name` and `issuer_common_name` are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIdentity {
    pub subject_common_name: String,
    pub issuer_common_name: String,
    pub valid_from: Option<ValidityDate>,
    pub valid_to: Option<ValidityDate>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub organization: Option<String>,
    pub serial_number: Option<String>,
    /// Only known for catalog entries, local parsing does not hash the container.
    pub thumbprint: Option<String>,
}

impl CertificateIdentity {
    pub(crate) fn from_certificate(certificate: &CapturedX509Certificate) -> Self {
        let subject = certificate.subject_name();
        let attribute = |oid: &'static [u8]| {
            subject
                .find_first_attribute_string(Oid(Bytes::from_static(oid)))
                .ok()
                .flatten()
                .and_then(non_empty)
        };
        let serial = certificate.serial_number_asn1();

        CertificateIdentity {
            subject_common_name: certificate
                .subject_common_name()
                .and_then(non_empty)
                .unwrap_or_else(|| UNKNOWN_SUBJECT.to_owned()),
            issuer_common_name: certificate
                .issuer_common_name()
                .and_then(non_empty)
                .unwrap_or_else(|| UNKNOWN_ISSUER.to_owned()),
            valid_from: Some(ValidityDate::Parsed(certificate.validity_not_before())),
            valid_to: Some(ValidityDate::Parsed(certificate.validity_not_after())),
            given_name: attribute(OID_GIVEN_NAME),
            surname: attribute(OID_SURNAME),
            organization: attribute(OID_ORGANIZATION_NAME),
            serial_number: Some(hex_upper(serial.as_slice())).filter(|hex| !hex.is_empty()),
            thumbprint: None,
        }
    }

    /// Identity for display-only signing, built from the catalog fields alone.
    pub fn from_catalog_entry(entry: &CatalogEntry) -> Self {
        let subject = DistinguishedName::parse(&entry.subject);
        let issuer = DistinguishedName::parse(&entry.issuer);

        CertificateIdentity {
            subject_common_name: subject
                .common_name()
                .unwrap_or_else(|| UNKNOWN_SUBJECT.to_owned()),
            issuer_common_name: issuer
                .common_name()
                .unwrap_or_else(|| UNKNOWN_ISSUER.to_owned()),
            valid_from: non_empty(entry.not_before.clone()).map(ValidityDate::Display),
            valid_to: non_empty(entry.not_after.clone()).map(ValidityDate::Display),
            given_name: subject.find(&["G", "GN", "GIVENNAME"]),
            surname: subject.find(&["SN", "SURNAME"]),
            organization: subject.find(&["O"]),
            serial_number: None,
            thumbprint: non_empty(entry.thumbprint.clone()),
        }
    }

    /// Short multi-line description shown after a certificate was picked.
    pub fn summary(&self, date_format: &str) -> String {
        let date = |date: &Option<ValidityDate>| {
            date.as_ref()
                .map(|date| date.format(date_format))
                .unwrap_or_default()
        };
        format!(
            "Issuer: {}\nSubject: {}\nValid From: {}\nValid To: {}",
            self.issuer_common_name,
            self.subject_common_name,
            date(&self.valid_from),
            date(&self.valid_to),
        )
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02X}", byte)).collect()
}

/// Loose reader for distinguished names as printed by certificate stores,
/// e.g. `CN=Ana Pop, G=Ana, SN=Pop, O="Acme, Inc."`.
struct DistinguishedName {
    raw: String,
    components: Vec<(String, String)>,
}

impl DistinguishedName {
    fn parse(raw: &str) -> Self {
        let mut components = Vec::new();
        for part in split_unquoted(raw) {
            if let Some((key, value)) = part.split_once('=') {
                let key = key.trim().to_ascii_uppercase();
                let value = value.trim().trim_matches('"').trim().to_owned();
                if !key.is_empty() && !key.contains(' ') {
                    components.push((key, value));
                }
            }
        }
        DistinguishedName {
            raw: raw.trim().to_owned(),
            components,
        }
    }

    fn find(&self, keys: &[&str]) -> Option<String> {
        self.components
            .iter()
            .find(|(key, _)| keys.contains(&key.as_str()))
            .and_then(|(_, value)| non_empty(value.clone()))
    }

    /// `CN` when present, otherwise the whole text when it is not a DN at all.
    fn common_name(&self) -> Option<String> {
        self.find(&["CN"]).or_else(|| {
            if self.components.is_empty() {
                non_empty(self.raw.clone())
            } else {
                None
            }
        })
    }
}

fn split_unquoted(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, char) in raw.char_indices() {
        match char {
            '"' => in_quotes = !in_quotes,
            ',' | ';' if !in_quotes => {
                parts.push(&raw[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}
