#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use lopdf::{Document, ObjectId};
use pdf_signature_stamp::{CatalogEntry, CertificateExportService, Error, ExportResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[path = "../../src/test_fixtures.rs"]
mod fixtures;

#[allow(unused_imports)]
pub(crate) use fixtures::{pdf_with_pages, TestCertificate};

pub const RIGHT_PASSWORD: &str = "rightpass";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Self-signed certificate for `given_name surname`, common name
/// `given.surname` in lower case.
pub(crate) fn certificate(given_name: &str, surname: &str) -> TestCertificate {
    TestCertificate::new(given_name, surname)
}

pub fn a4_pdf(page_count: usize) -> Vec<u8> {
    fixtures::pdf_bytes(page_count)
}

pub fn page_ids(pdf: &[u8]) -> Vec<ObjectId> {
    Document::load_mem(pdf)
        .unwrap()
        .get_pages()
        .values()
        .copied()
        .collect()
}

/// Every string shown with `Tj` on a page, in drawing order.
pub fn shown_text(pdf: &[u8], page_index: usize) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = *doc.get_pages().values().nth(page_index).unwrap();
    let content = doc.get_and_decode_page_content(page_id).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| op.operands.first())
        .filter_map(|operand| operand.as_str().ok())
        .map(|text| text.to_vec())
        .collect()
}

pub fn shows(pdf: &[u8], page_index: usize, text: &str) -> bool {
    shown_text(pdf, page_index)
        .iter()
        .any(|shown| shown.as_slice() == text.as_bytes())
}

pub fn catalog_entry(common_name: &str, thumbprint: &str) -> CatalogEntry {
    CatalogEntry {
        subject: format!("CN={}, O=Acme Training", common_name),
        issuer: "CN=Acme Issuing CA, O=Acme Training".to_owned(),
        not_before: "1/1/2025".to_owned(),
        not_after: "1/1/2027".to_owned(),
        thumbprint: thumbprint.to_owned(),
    }
}

/// Export service answering from memory. With a gate, every export waits
/// until the gate is opened.
pub struct StaticExportService {
    pkcs12: Vec<u8>,
    fail_with: Option<String>,
    gate: Option<Notify>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<(String, String)>>,
}

impl StaticExportService {
    pub fn exporting(pkcs12: Vec<u8>) -> Self {
        StaticExportService {
            pkcs12,
            fail_with: None,
            gate: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        StaticExportService {
            fail_with: Some(message.to_owned()),
            ..Self::exporting(vec![])
        }
    }

    pub fn gated(pkcs12: Vec<u8>) -> Self {
        StaticExportService {
            gate: Some(Notify::new()),
            ..Self::exporting(pkcs12)
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl CertificateExportService for StaticExportService {
    async fn export(&self, identifying_name: &str, secret: &str) -> Result<ExportResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() =
            Some((identifying_name.to_owned(), secret.to_owned()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(match &self.fail_with {
            Some(message) => ExportResponse {
                success: false,
                container_bytes: None,
                error_message: Some(message.clone()),
                details: None,
            },
            None => ExportResponse {
                success: true,
                container_bytes: Some(base64::engine::general_purpose::STANDARD.encode(&self.pkcs12)),
                error_message: None,
                details: None,
            },
        })
    }
}
