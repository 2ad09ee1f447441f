//! One controller for every way of signing a loaded document.
//!
//! An attempt moves through [`SigningState`]s and ends by publishing the new
//! document or with an error. Attempts are numbered when they start, only the
//! newest one may publish. An older attempt that finishes late gets
//! [`Error::Superseded`] and its render is dropped.

use crate::blob_store::{BlobBackend, BlobReference, DocumentBlobManager};
use crate::catalog::{CatalogEntry, CertificateExportService, CertificateSource};
use crate::certificate::LocalCertificateFile;
use crate::config::SigningConfig;
use crate::http_service::HttpCertificateService;
use crate::identity::CertificateIdentity;
use crate::layout::LayoutVariant;
use crate::signature_block::SignatureBlock;
use crate::signer_name::display_name;
use crate::Error;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Signed documents always get the block on the first page.
const SIGNED_PAGE_INDEX: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    Idle,
    SourceResolved,
    Parsed,
    Rendered,
    Published,
    Failed,
}

/// Where the signer identity comes from.
#[derive(Debug, Clone)]
pub enum SigningSource {
    /// A certificate file chosen by the user. PEM files need no secret.
    LocalFile {
        file: LocalCertificateFile,
        secret: Option<String>,
    },
    /// A catalog certificate, exported by the certificate service.
    CatalogExport { entry: CatalogEntry, secret: String },
    /// A catalog certificate whose listed fields are printed as they are.
    /// Nothing proves the caller controls the certificate's key.
    CatalogDisplayOnly { entry: CatalogEntry },
}

impl SigningSource {
    pub fn layout(&self) -> LayoutVariant {
        match self {
            SigningSource::LocalFile { .. } => LayoutVariant::Compact,
            SigningSource::CatalogExport { .. } | SigningSource::CatalogDisplayOnly { .. } => {
                LayoutVariant::Large
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            SigningSource::LocalFile { file, .. } => format!("local file `{}`", file.file_name()),
            SigningSource::CatalogExport { entry, .. } => {
                format!("exported certificate `{}`", entry.subject)
            }
            SigningSource::CatalogDisplayOnly { entry } => {
                format!("catalog certificate `{}` (display only)", entry.subject)
            }
        }
    }
}

/// Result of a published signing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    pub reference: BlobReference,
    pub signer_name: String,
    pub certificate_subject: String,
    pub signed_at: DateTime<Utc>,
    pub layout: LayoutVariant,
    pub suggested_file_name: String,
}

#[derive(Debug)]
struct SessionState {
    /// Document the next attempt starts from.
    document: Option<Arc<Vec<u8>>>,
    blobs: DocumentBlobManager,
    last_state: SigningState,
    latest_attempt: u64,
}

pub struct SigningSession {
    config: SigningConfig,
    certificate_source: Option<Arc<dyn CertificateSource>>,
    export_service: Option<Arc<dyn CertificateExportService>>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSession")
            .field("config", &self.config)
            .field("has_certificate_source", &self.certificate_source.is_some())
            .field("has_export_service", &self.export_service.is_some())
            .finish()
    }
}

impl SigningSession {
    pub fn new(config: SigningConfig) -> Self {
        SigningSession {
            config,
            certificate_source: None,
            export_service: None,
            state: Mutex::new(SessionState {
                document: None,
                blobs: DocumentBlobManager::default(),
                last_state: SigningState::Idle,
                latest_attempt: 0,
            }),
        }
    }

    /// Session backed by the HTTP certificate service from `config`.
    pub fn with_http_service(config: SigningConfig) -> Result<Self, Error> {
        let service = Arc::new(HttpCertificateService::new(&config.certificate_service)?);
        Ok(Self::new(config)
            .with_certificate_source(service.clone())
            .with_export_service(service))
    }

    pub fn with_certificate_source(mut self, source: Arc<dyn CertificateSource>) -> Self {
        self.certificate_source = Some(source);
        self
    }

    pub fn with_export_service(mut self, service: Arc<dyn CertificateExportService>) -> Self {
        self.export_service = Some(service);
        self
    }

    pub fn with_blob_backend(self, backend: Arc<dyn BlobBackend>) -> Self {
        self.lock_state().blobs = DocumentBlobManager::new(backend);
        self
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `pdf_bytes` the document to sign and publish it as it is.
    ///
    /// Attempts still running on the previous document will not publish.
    pub fn load_document(&self, pdf_bytes: Vec<u8>) -> BlobReference {
        let bytes = Arc::new(pdf_bytes);
        let mut state = self.lock_state();
        state.latest_attempt += 1;
        state.document = Some(bytes.clone());
        state.last_state = SigningState::Idle;
        let reference = state.blobs.publish(bytes);
        log::info!(
            "Loaded `{}` as `{}`.",
            self.config.document_name,
            reference
        );
        reference
    }

    pub fn current_reference(&self) -> Option<BlobReference> {
        self.lock_state().blobs.current_reference().cloned()
    }

    /// Bytes behind the live reference.
    pub fn current_document(&self) -> Result<Arc<Vec<u8>>, Error> {
        self.lock_state().blobs.resolve_current()
    }

    /// State reached by the newest attempt.
    pub fn last_state(&self) -> SigningState {
        self.lock_state().last_state
    }

    pub async fn available_certificates(&self) -> Result<Vec<CatalogEntry>, Error> {
        let source = self.certificate_source.as_ref().ok_or_else(|| {
            Error::SourceUnavailable("No certificate source configured.".to_owned())
        })?;
        match source.list_available().await {
            Ok(entries) => {
                log::debug!("Certificate source listed {} entries.", entries.len());
                Ok(entries)
            }
            Err(err) => {
                log::warn!("Could not list certificates: {}", err);
                Err(match err {
                    Error::SourceUnavailable(message) => Error::SourceUnavailable(message),
                    other => Error::SourceUnavailable(other.to_string()),
                })
            }
        }
    }

    /// Parse a local file and return the preview shown before signing.
    pub async fn preview_local_file(
        &self,
        file: &LocalCertificateFile,
        secret: Option<&str>,
    ) -> Result<String, Error> {
        let container = file.container().clone();
        let secret = secret.map(str::to_owned);
        let identity =
            tokio::task::spawn_blocking(move || container.parse(secret.as_deref())).await??;
        Ok(identity.summary(&self.config.date_format))
    }

    pub async fn sign_with_local_file(
        &self,
        file: LocalCertificateFile,
        secret: Option<String>,
    ) -> Result<SignedDocument, Error> {
        self.sign(Some(SigningSource::LocalFile { file, secret }))
            .await
    }

    pub async fn sign_with_catalog_entry(
        &self,
        entry: CatalogEntry,
        secret: String,
    ) -> Result<SignedDocument, Error> {
        self.sign(Some(SigningSource::CatalogExport { entry, secret }))
            .await
    }

    pub async fn sign_with_catalog_entry_display_only(
        &self,
        entry: CatalogEntry,
    ) -> Result<SignedDocument, Error> {
        self.sign(Some(SigningSource::CatalogDisplayOnly { entry }))
            .await
    }

    /// Run one signing attempt. Starting it supersedes every attempt still
    /// running.
    pub async fn sign(&self, source: Option<SigningSource>) -> Result<SignedDocument, Error> {
        let (attempt, document) = {
            let mut state = self.lock_state();
            state.latest_attempt += 1;
            state.last_state = SigningState::Idle;
            (state.latest_attempt, state.document.clone())
        };

        let result = self.run_attempt(attempt, document, source).await;
        match &result {
            Ok(signed) => log::info!(
                "Attempt {} published `{}` signed by {}.",
                attempt,
                signed.reference,
                signed.signer_name
            ),
            Err(Error::Superseded) => {}
            Err(err) => {
                log::warn!("Attempt {} failed: {}", attempt, err);
                self.transition(attempt, SigningState::Failed);
            }
        }
        result
    }

    async fn run_attempt(
        &self,
        attempt: u64,
        document: Option<Arc<Vec<u8>>>,
        source: Option<SigningSource>,
    ) -> Result<SignedDocument, Error> {
        let document = document.ok_or(Error::DocumentNotLoaded)?;
        let source = source.ok_or(Error::NoSourceSelected)?;
        let layout = source.layout();
        log::debug!("Attempt {} signs with {}.", attempt, source.describe());

        let identity = match source {
            SigningSource::LocalFile { file, secret } => {
                self.transition(attempt, SigningState::SourceResolved);
                let container = file.container().clone();
                tokio::task::spawn_blocking(move || container.parse(secret.as_deref())).await??
            }
            SigningSource::CatalogExport { entry, secret } => {
                if secret.is_empty() {
                    return Err(Error::MissingSecret);
                }
                let service = self.export_service.clone().ok_or_else(|| {
                    Error::ExportFailed("No certificate export service configured.".to_owned())
                })?;
                let response = service.export(entry.identifying_name(), &secret).await?;
                let container = response.into_container()?;
                self.transition(attempt, SigningState::SourceResolved);
                tokio::task::spawn_blocking(move || container.parse(Some(&secret))).await??
            }
            SigningSource::CatalogDisplayOnly { entry } => {
                self.transition(attempt, SigningState::SourceResolved);
                CertificateIdentity::from_catalog_entry(&entry)
            }
        };
        log::debug!(
            "Attempt {} identity: subject `{}`, issuer `{}`.",
            attempt,
            identity.subject_common_name,
            identity.issuer_common_name
        );
        self.transition(attempt, SigningState::Parsed);

        let signer_name = display_name(&identity, &self.config.fallback_signer_label);
        let signed_at = Utc::now();
        let date_format = self.config.date_format.clone();
        let (pdf_bytes, identity, signer_name) = tokio::task::spawn_blocking(move || {
            let block = SignatureBlock {
                identity: &identity,
                signer_name: &signer_name,
                signed_at,
                date_format: &date_format,
            };
            crate::render(&document, SIGNED_PAGE_INDEX, layout, &block)
                .map(|bytes| (bytes, identity, signer_name))
        })
        .await??;
        self.transition(attempt, SigningState::Rendered);

        let reference = self.publish(attempt, pdf_bytes)?;
        Ok(SignedDocument {
            reference,
            suggested_file_name: suggested_file_name(&signer_name, signed_at),
            signer_name,
            certificate_subject: identity.subject_common_name,
            signed_at,
            layout,
        })
    }

    fn publish(&self, attempt: u64, pdf_bytes: Vec<u8>) -> Result<BlobReference, Error> {
        let mut state = self.lock_state();
        if state.latest_attempt != attempt {
            log::info!(
                "Attempt {} finished after attempt {} started, dropping its render.",
                attempt,
                state.latest_attempt
            );
            return Err(Error::Superseded);
        }
        let bytes = Arc::new(pdf_bytes);
        state.document = Some(bytes.clone());
        state.last_state = SigningState::Published;
        Ok(state.blobs.publish(bytes))
    }

    /// Record progress, only the newest attempt is tracked.
    fn transition(&self, attempt: u64, next: SigningState) {
        let mut state = self.lock_state();
        if state.latest_attempt == attempt {
            log::trace!("Attempt {}: {:?} -> {:?}", attempt, state.last_state, next);
            state.last_state = next;
        }
    }
}

/// `signed_<name>_<date>.pdf`, whitespace in the name becomes `_`.
pub fn suggested_file_name(signer_name: &str, signed_at: DateTime<Utc>) -> String {
    let name = signer_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("signed_{}_{}.pdf", name, signed_at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;
    use chrono::TimeZone;

    #[test]
    fn file_name_from_signer() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 0, 0).unwrap();
        assert_eq!(
            suggested_file_name("Ana  Maria Pop", at),
            "signed_Ana_Maria_Pop_2024-03-09.pdf"
        );
    }

    #[test]
    fn layout_follows_source() {
        let file = LocalCertificateFile::new("me.pem", test_fixtures::pem_bytes()).unwrap();
        let local = SigningSource::LocalFile { file, secret: None };
        assert_eq!(local.layout(), LayoutVariant::Compact);
        let display_only = SigningSource::CatalogDisplayOnly {
            entry: CatalogEntry::default(),
        };
        assert_eq!(display_only.layout(), LayoutVariant::Large);
    }

    #[tokio::test]
    async fn document_must_be_loaded_first() {
        let session = SigningSession::new(SigningConfig::default());
        let result = session.sign(None).await;
        assert!(matches!(result, Err(Error::DocumentNotLoaded)));
        assert_eq!(session.last_state(), SigningState::Failed);
    }

    #[tokio::test]
    async fn source_must_be_selected() {
        let session = SigningSession::new(SigningConfig::default());
        session.load_document(test_fixtures::pdf_bytes(1));
        let result = session.sign(None).await;
        assert!(matches!(result, Err(Error::NoSourceSelected)));
        assert_eq!(session.last_state(), SigningState::Failed);
    }

    #[tokio::test]
    async fn local_pem_file_is_published() {
        let session = SigningSession::new(SigningConfig::default());
        let loaded = session.load_document(test_fixtures::pdf_bytes(2));
        let file = LocalCertificateFile::new("ana.crt", test_fixtures::pem_bytes()).unwrap();

        let signed = session.sign_with_local_file(file, None).await.unwrap();
        assert_eq!(signed.signer_name, "Ana Pop");
        assert_eq!(signed.certificate_subject, "ana.pop");
        assert_eq!(signed.layout, LayoutVariant::Compact);
        assert_ne!(signed.reference, loaded);
        assert_eq!(session.current_reference(), Some(signed.reference));
        assert_eq!(session.last_state(), SigningState::Published);
        assert!(session.current_document().unwrap().len() > test_fixtures::pdf_bytes(2).len());
    }

    #[tokio::test]
    async fn missing_export_secret() {
        let session = SigningSession::new(SigningConfig::default());
        session.load_document(test_fixtures::pdf_bytes(1));
        let result = session
            .sign_with_catalog_entry(CatalogEntry::default(), String::new())
            .await;
        assert!(matches!(result, Err(Error::MissingSecret)));
    }

    #[tokio::test]
    async fn no_source_configured() {
        let session = SigningSession::new(SigningConfig::default());
        assert!(matches!(
            session.available_certificates().await,
            Err(Error::SourceUnavailable(_))
        ));
    }
}
