mod blob_store;
mod catalog;
mod certificate;
mod config;
mod error;
mod http_service;
mod identity;
mod layout;
mod lopdf_utils;
mod page_content;
mod pdf_object;
mod rectangle;
mod session;
mod signature_block;
mod signer_name;
#[cfg(test)]
mod test_fixtures;

use lopdf::{dictionary, IncrementalDocument, ObjectId};
use lopdf_utils::{as_rectangle, inherited_attribute};
use page_content::AppendToPage;
use std::io::{Read, Write};

pub use blob_store::{BlobBackend, BlobReference, DocumentBlobManager, MemoryBlobBackend};
pub use catalog::{CatalogEntry, CertificateExportService, CertificateSource, ExportResponse};
pub use certificate::{CertificateContainer, ContainerFormat, LocalCertificateFile};
pub use config::{CertificateServiceConfig, SigningConfig};
pub use error::Error;
pub use http_service::HttpCertificateService;
pub use identity::{CertificateIdentity, ValidityDate, UNKNOWN_ISSUER, UNKNOWN_SUBJECT};
pub use layout::{BlockGeometry, LayoutVariant, PAGE_MARGIN};
pub use lopdf;
pub use rectangle::Rectangle;
pub use session::{SignedDocument, SigningSession, SigningSource, SigningState};
pub use signature_block::{encode_win_ansi, truncate_thumbprint, SignatureBlock};
pub use signer_name::display_name;

/// Name under which the block's font is registered in the page resources.
const BLOCK_FONT_NAME: &str = "FSigBlock";

/// The whole PDF document. Changes are kept apart from the loaded document
/// and written as an incremental update.
#[derive(Debug)]
pub struct PDFSigningDocument {
    raw_document: IncrementalDocument,
    file_name: String,
}

impl PDFSigningDocument {
    pub fn new(raw_document: IncrementalDocument, file_name: String) -> Self {
        PDFSigningDocument {
            raw_document,
            file_name,
        }
    }

    pub fn read_from<R: Read>(reader: R, file_name: String) -> Result<Self, Error> {
        let raw_document = IncrementalDocument::load_from(reader)?;
        Ok(Self::new(raw_document, file_name))
    }

    pub fn read<P: AsRef<std::path::Path>>(path: P, file_name: String) -> Result<Self, Error> {
        let raw_document = IncrementalDocument::load(path)?;
        Ok(Self::new(raw_document, file_name))
    }

    pub fn get_document_ref(&self) -> &IncrementalDocument {
        &self.raw_document
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn page_count(&self) -> usize {
        self.raw_document.get_prev_documents().get_pages().len()
    }

    /// Object id of the page at `page_index`, counting from 0.
    pub fn page_id(&self, page_index: usize) -> Result<ObjectId, Error> {
        let pages = self.raw_document.get_prev_documents().get_pages();
        let page_count = pages.len();
        // `get_pages` is keyed by page number, starting at 1.
        pages
            .values()
            .nth(page_index)
            .copied()
            .ok_or(Error::PageOutOfRange {
                page_index,
                page_count,
            })
    }

    /// The visible area of a page, from its own or an inherited `MediaBox`.
    pub fn page_rectangle(&self, page_id: ObjectId) -> Result<Rectangle, Error> {
        let doc = self.raw_document.get_prev_documents();
        match inherited_attribute(doc, page_id, b"MediaBox")? {
            Some(media_box) => as_rectangle(media_box, doc),
            None => {
                log::warn!(
                    "Page {:?} of `{}` has no `MediaBox`, assuming Letter size.",
                    page_id,
                    self.file_name
                );
                Ok(Rectangle::LETTER)
            }
        }
    }

    /// Draw a signature block on the page at `page_index`.
    pub fn add_signature_block(
        &mut self,
        page_index: usize,
        layout: LayoutVariant,
        block: &SignatureBlock,
    ) -> Result<BlockGeometry, Error> {
        let page_id = self.page_id(page_index)?;
        let page_rect = self.page_rectangle(page_id)?;
        let geometry = layout.place(&page_rect).ok_or_else(|| {
            Error::Other(format!("Page {} has no area to draw on.", page_index))
        })?;
        log::info!(
            "Adding {:?} signature block to page {} of `{}` at ({}, {}).",
            layout,
            page_index,
            self.file_name,
            geometry.bounds.x1,
            geometry.bounds.y1
        );

        self.raw_document.add_font_to_page(
            page_id,
            BLOCK_FONT_NAME,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
        )?;
        let operations = block.operations(&geometry, BLOCK_FONT_NAME);
        self.raw_document
            .add_to_page_content(page_id, lopdf::content::Content { operations })?;
        Ok(geometry)
    }

    /// Write the original document followed by the incremental update.
    pub fn write_document<W: Write>(&mut self, target: &mut W) -> Result<(), Error> {
        self.raw_document.save_to(target)?;
        Ok(())
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>, Error> {
        let mut pdf_file_data = Vec::new();
        self.write_document(&mut pdf_file_data)?;
        Ok(pdf_file_data)
    }
}

/// Draw a signature block on one page of `pdf_bytes` and return the new file.
///
/// Nothing is returned when the page does not exist, a document without pages
/// fails with [`Error::PageOutOfRange`].
pub fn render(
    pdf_bytes: &[u8],
    page_index: usize,
    layout: LayoutVariant,
    block: &SignatureBlock,
) -> Result<Vec<u8>, Error> {
    let mut document = PDFSigningDocument::read_from(pdf_bytes, "document.pdf".to_owned())?;
    document.add_signature_block(page_index, layout, block)?;
    document.into_bytes()
}
