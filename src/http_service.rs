//! Client for the certificate relay that fronts the operating system
//! certificate store.
//!
//! Endpoints:
//! - `GET  /api/certificates`: list of [`CatalogEntry`].
//! - `POST /api/certificates/export`: `{ thumbprint, password }` to [`ExportResponse`].

use crate::catalog::{CatalogEntry, CertificateExportService, CertificateSource, ExportResponse};
use crate::config::CertificateServiceConfig;
use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct HttpCertificateService {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    thumbprint: &'a str,
    password: &'a str,
}

/// The store serializes a single certificate as an object instead of a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogListing {
    Many(Vec<CatalogEntry>),
    One(CatalogEntry),
}

impl From<CatalogListing> for Vec<CatalogEntry> {
    fn from(listing: CatalogListing) -> Self {
        match listing {
            CatalogListing::Many(entries) => entries,
            CatalogListing::One(entry) => vec![entry],
        }
    }
}

impl HttpCertificateService {
    pub fn new(config: &CertificateServiceConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| Error::Config(format!("Failed to create HTTP client: {}", err)))?;
        Ok(HttpCertificateService {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateService {
    async fn list_available(&self) -> Result<Vec<CatalogEntry>, Error> {
        let url = self.url("/api/certificates");
        log::debug!("Fetching certificate list from `{}`.", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| Error::SourceUnavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!(
                "certificate service answered {}",
                status
            )));
        }
        let listing: CatalogListing = response
            .json()
            .await
            .map_err(|err| Error::SourceUnavailable(format!("unreadable certificate list: {}", err)))?;
        let entries = Vec::from(listing);
        log::info!("Certificate service offers {} certificate(s).", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl CertificateExportService for HttpCertificateService {
    async fn export(&self, identifying_name: &str, secret: &str) -> Result<ExportResponse, Error> {
        let url = self.url("/api/certificates/export");
        log::debug!("Requesting export of `{}`.", identifying_name);
        let response = self
            .client
            .post(&url)
            .json(&ExportRequest {
                thumbprint: identifying_name,
                password: secret,
            })
            .send()
            .await
            .map_err(|err| Error::ExportFailed(err.to_string()))?;
        let status = response.status();
        // Failures still carry a JSON body with the reason.
        let body = response
            .text()
            .await
            .map_err(|err| Error::ExportFailed(err.to_string()))?;
        match serde_json::from_str::<ExportResponse>(&body) {
            Ok(export) => {
                if !status.is_success() && export.success {
                    return Err(Error::ExportFailed(format!(
                        "certificate service answered {}",
                        status
                    )));
                }
                Ok(export)
            }
            Err(err) => {
                log::warn!("Unreadable export response ({}): {}", status, err);
                Err(Error::ExportFailed(format!(
                    "certificate service answered {}",
                    status
                )))
            }
        }
    }
}
