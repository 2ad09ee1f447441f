//! Settings for a signing session.
//!
//! All fields have defaults, so a configuration file only needs the values
//! that differ. Files are JSON.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SigningConfig {
    /// Where the certificate relay lives.
    pub certificate_service: CertificateServiceConfig,
    /// Signer name used when the certificate carries no usable name.
    pub fallback_signer_label: String,
    /// `chrono` format string for dates printed on the signature block.
    pub date_format: String,
    /// Name of the base document, only used in log messages.
    pub document_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig {
            certificate_service: CertificateServiceConfig::default(),
            fallback_signer_label: "Unknown".to_owned(),
            date_format: "%-m/%-d/%Y".to_owned(),
            document_name: "document.pdf".to_owned(),
        }
    }
}

impl Default for CertificateServiceConfig {
    fn default() -> Self {
        CertificateServiceConfig {
            base_url: "http://localhost:3000".to_owned(),
            timeout_secs: 30,
        }
    }
}

impl CertificateServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SigningConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {}", path.display(), err)))?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded signing configuration from `{}`.", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SigningConfig::from_json_str(
            r#"{ "certificateService": { "baseUrl": "http://relay:8080" } }"#,
        )
        .unwrap();
        assert_eq!(config.certificate_service.base_url, "http://relay:8080");
        assert_eq!(config.certificate_service.timeout_secs, 30);
        assert_eq!(config.fallback_signer_label, "Unknown");
        assert_eq!(config.date_format, "%-m/%-d/%Y");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SigningConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = SigningConfig::load("/definitely/not/here/signing.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
