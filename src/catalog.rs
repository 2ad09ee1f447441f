//! Contracts with the outside certificate services.

use crate::certificate::{CertificateContainer, ContainerFormat};
use crate::Error;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One certificate offered by the certificate store. All fields are display
/// text, an entry is not something that can be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub not_before: String,
    #[serde(default)]
    pub not_after: String,
    #[serde(default)]
    pub thumbprint: String,
}

impl CatalogEntry {
    /// The name the export service knows this certificate by.
    pub fn identifying_name(&self) -> &str {
        &self.thumbprint
    }
}

/// Result of an export request, as sent by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(rename = "Success", default)]
    pub success: bool,
    /// Base64 encoded PKCS#12 container.
    #[serde(rename = "Certificate", default)]
    pub container_bytes: Option<String>,
    /// Export failures use `Error`, request validation failures use `error`.
    #[serde(rename = "Error", alias = "error", default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ExportResponse {
    /// Turn a response into a container, or the reason there is none.
    pub fn into_container(self) -> Result<CertificateContainer, Error> {
        if !self.success {
            let reason = match (self.error_message, self.details) {
                (Some(message), Some(details)) => format!("{} ({})", message, details),
                (Some(message), None) => message,
                (None, Some(details)) => details,
                (None, None) => "service reported failure".to_owned(),
            };
            return Err(Error::ExportFailed(reason));
        }
        let encoded = self
            .container_bytes
            .filter(|encoded| !encoded.trim().is_empty())
            .ok_or_else(|| Error::ExportFailed("response contained no certificate".to_owned()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| Error::ExportFailed(format!("certificate is not base64: {}", err)))?;
        Ok(CertificateContainer::new(bytes, ContainerFormat::Pkcs12))
    }
}

/// Lists the identities the operator can sign with.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Point in time snapshot of the store.
    async fn list_available(&self) -> Result<Vec<CatalogEntry>, Error>;
}

/// Hands out the container of a named identity, protected with `secret`.
#[async_trait]
pub trait CertificateExportService: Send + Sync {
    async fn export(&self, identifying_name: &str, secret: &str) -> Result<ExportResponse, Error>;
}
