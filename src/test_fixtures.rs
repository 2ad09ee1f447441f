//! Certificates and PDFs generated for tests.
//!
//! Also compiled into the integration tests through `tests/common`, so only
//! `openssl` and `lopdf` may be used here.

#![allow(dead_code)]

use lopdf::{content::Content, content::Operation, dictionary, Document, Object, Stream};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::sync::OnceLock;

pub(crate) const ORGANIZATION: &str = "Acme Training";

/// Self-signed certificate with its key.
pub(crate) struct TestCertificate {
    common_name: String,
    key: PKey<Private>,
    cert: X509,
}

impl TestCertificate {
    /// Certificate for `given_name surname` with common name
    /// `given.surname` in lower case.
    pub(crate) fn new(given_name: &str, surname: &str) -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let common_name = format!("{}.{}", given_name, surname).to_lowercase();
        let mut name_builder = X509NameBuilder::new().unwrap();
        name_builder.append_entry_by_text("CN", &common_name).unwrap();
        name_builder.append_entry_by_text("GN", given_name).unwrap();
        name_builder.append_entry_by_text("SN", surname).unwrap();
        name_builder.append_entry_by_text("O", ORGANIZATION).unwrap();
        let name = name_builder.build();

        let mut x509_builder = X509Builder::new().unwrap();
        x509_builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(0x1234_5678).unwrap().to_asn1_integer().unwrap();
        x509_builder.set_serial_number(&serial).unwrap();
        x509_builder.set_subject_name(&name).unwrap();
        x509_builder.set_issuer_name(&name).unwrap();
        x509_builder.set_pubkey(&key).unwrap();
        let not_before = Asn1Time::days_from_now(0).unwrap();
        let not_after = Asn1Time::days_from_now(365).unwrap();
        x509_builder.set_not_before(&not_before).unwrap();
        x509_builder.set_not_after(&not_after).unwrap();
        x509_builder.sign(&key, MessageDigest::sha256()).unwrap();

        TestCertificate {
            common_name,
            key,
            cert: x509_builder.build(),
        }
    }

    pub(crate) fn common_name(&self) -> &str {
        &self.common_name
    }

    pub(crate) fn pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    pub(crate) fn pkcs12(&self, password: &str) -> Vec<u8> {
        Pkcs12::builder()
            .name(&self.common_name)
            .pkey(&self.key)
            .cert(&self.cert)
            .build2(password)
            .unwrap()
            .to_der()
            .unwrap()
    }
}

/// The `Ana Pop` certificate, generated once per test binary.
pub(crate) fn ana_pop() -> &'static TestCertificate {
    static FIXTURE: OnceLock<TestCertificate> = OnceLock::new();
    FIXTURE.get_or_init(|| TestCertificate::new("Ana", "Pop"))
}

pub(crate) fn pem_bytes() -> Vec<u8> {
    ana_pop().pem()
}

pub(crate) fn pkcs12_bytes(password: &str) -> Vec<u8> {
    ana_pop().pkcs12(password)
}

/// Document whose pages are all `width` x `height`. The pages share one
/// resource dictionary, inherit their `MediaBox` and show `Page <n>`.
pub(crate) fn pdf_with_pages(page_count: usize, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let mut kids = Vec::with_capacity(page_count);
    for page_number in 1..=page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 100.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", page_number))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut pdf_file_data = Vec::new();
    doc.save_to(&mut pdf_file_data).unwrap();
    pdf_file_data
}

/// A4 document with `page_count` pages.
pub(crate) fn pdf_bytes(page_count: usize) -> Vec<u8> {
    pdf_with_pages(page_count, 595, 842)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_names_follow_the_signer() {
        let certificate = TestCertificate::new("Maria", "Ionescu");
        assert_eq!(certificate.common_name(), "maria.ionescu");
        assert!(certificate.pem().starts_with(b"-----BEGIN CERTIFICATE-----"));
        let pkcs12 = Pkcs12::from_der(&certificate.pkcs12("secret")).unwrap();
        assert!(pkcs12.parse2("secret").unwrap().cert.is_some());
    }
}
