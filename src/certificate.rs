//! Certificate containers and how to get an identity out of them.
//!
//! Two container kinds are accepted:
//! - `PKCS12` (`.p12`/`.pfx`): binary, always password protected.
//! - `PEM` (`.pem`/`.crt`): text, the first `CERTIFICATE` block is used.
//!
//! Unlocking PKCS#12 is done with OpenSSL, the certificate itself is read with
//! `x509_certificate` for both kinds so the extracted fields are identical.

use crate::identity::CertificateIdentity;
use crate::Error;
use openssl::pkcs12::Pkcs12;
use x509_certificate::CapturedX509Certificate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Pkcs12,
    Pem,
}

impl ContainerFormat {
    /// Guess the format from a file name. Matching is case insensitive.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "p12" | "pfx" => Some(ContainerFormat::Pkcs12),
            "pem" | "crt" => Some(ContainerFormat::Pem),
            _ => None,
        }
    }

    pub fn requires_secret(&self) -> bool {
        matches!(self, ContainerFormat::Pkcs12)
    }
}

/// Raw container bytes, only held for the duration of one signing attempt.
#[derive(Clone)]
pub struct CertificateContainer {
    bytes: Vec<u8>,
    format: ContainerFormat,
}

// Manual impl so container bytes never end up in logs.
impl std::fmt::Debug for CertificateContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateContainer")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl CertificateContainer {
    pub fn new(bytes: Vec<u8>, format: ContainerFormat) -> Self {
        CertificateContainer { bytes, format }
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extract the signer identity.
    ///
    /// An empty secret counts as no secret. For `PEM` the secret is ignored.
    pub fn parse(&self, secret: Option<&str>) -> Result<CertificateIdentity, Error> {
        let certificate = match self.format {
            ContainerFormat::Pkcs12 => {
                let secret = secret
                    .filter(|secret| !secret.is_empty())
                    .ok_or(Error::MissingSecret)?;
                Self::unlock_pkcs12(&self.bytes, secret)?
            }
            ContainerFormat::Pem => Self::first_pem_certificate(&self.bytes)?,
        };
        let identity = CertificateIdentity::from_certificate(&certificate);
        log::info!(
            "Parsed {:?} certificate for `{}` issued by `{}`.",
            self.format,
            identity.subject_common_name,
            identity.issuer_common_name
        );
        Ok(identity)
    }

    fn unlock_pkcs12(bytes: &[u8], secret: &str) -> Result<CapturedX509Certificate, Error> {
        let pkcs12 = Pkcs12::from_der(bytes)
            .map_err(|err| Error::InvalidContainer(format!("not a PKCS#12 structure: {}", err)))?;
        // OpenSSL reports a wrong password and a damaged MAC the same way.
        let parsed = pkcs12.parse2(secret).map_err(|err| {
            log::debug!("PKCS#12 unlock failed: {}", err);
            Error::InvalidContainer("wrong password or damaged container".to_owned())
        })?;
        let certificate = match parsed.cert {
            Some(certificate) => certificate,
            None => parsed
                .ca
                .and_then(|chain| chain.into_iter().next())
                .ok_or_else(|| {
                    Error::InvalidContainer("no certificate found in PKCS#12 file".to_owned())
                })?,
        };
        let der = certificate
            .to_der()
            .map_err(|err| Error::InvalidContainer(err.to_string()))?;
        CapturedX509Certificate::from_der(der)
            .map_err(|err| Error::InvalidContainer(format!("unreadable certificate: {}", err)))
    }

    fn first_pem_certificate(bytes: &[u8]) -> Result<CapturedX509Certificate, Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::InvalidContainer("PEM file is not valid text".to_owned()))?;
        CapturedX509Certificate::from_pem_multiple(text)
            .map_err(|err| Error::InvalidContainer(format!("unreadable PEM data: {}", err)))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidContainer("no certificate block found".to_owned()))
    }
}

/// A certificate file the operator picked from disk, already read into memory.
#[derive(Debug, Clone)]
pub struct LocalCertificateFile {
    file_name: String,
    container: CertificateContainer,
}

impl LocalCertificateFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Error> {
        let file_name = file_name.into();
        let format = ContainerFormat::from_file_name(&file_name)
            .ok_or_else(|| Error::UnsupportedContainer(file_name.clone()))?;
        Ok(LocalCertificateFile {
            file_name,
            container: CertificateContainer::new(bytes, format),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn container(&self) -> &CertificateContainer {
        &self.container
    }
}
