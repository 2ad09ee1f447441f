use crate::lopdf_utils::{as_owned_dictionary, content_references, inherited_attribute};
use crate::Error;
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, IncrementalDocument, Object, ObjectId, Stream,
};

/// Drawing on top of an existing page without touching anything the page
/// shares with other pages.
pub(crate) trait AppendToPage {
    fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId;

    fn opt_clone_object_to_new_document(&mut self, object_id: ObjectId) -> Result<(), Error>;

    /// The document as it was loaded.
    fn source_document(&self) -> &Document;

    /// The newest version of an object, changed or not.
    fn latest_object(&self, object_id: ObjectId) -> Result<&Object, Error>;

    fn get_new_object_mut(&mut self, object_id: ObjectId) -> Result<&mut Object, Error>;

    /// Make `font` available on the page as `font_name`.
    ///
    /// Resources can be inherited or shared with other pages, so the page gets
    /// its own copy of the resource dictionary before the font is added.
    fn add_font_to_page(
        &mut self,
        page_id: ObjectId,
        font_name: &str,
        font: Dictionary,
    ) -> Result<(), Error> {
        let (mut resources, mut fonts) = {
            let doc = self.source_document();
            let page = self.latest_object(page_id)?.as_dict()?;
            let resources = match page.get(b"Resources") {
                Ok(resources) => Some(resources),
                Err(_) => inherited_attribute(doc, page_id, b"Resources")?,
            };
            let resources = as_owned_dictionary(resources, doc)?;
            let fonts = as_owned_dictionary(resources.get(b"Font").ok(), doc)?;
            (resources, fonts)
        };
        if fonts.has(font_name.as_bytes()) {
            log::debug!("Page already has font `{}`.", font_name);
            if self.latest_object(page_id)?.as_dict()?.has(b"Resources") {
                return Ok(());
            }
        } else {
            let font_id = self.add_object(font);
            fonts.set(font_name, Object::Reference(font_id));
        }
        resources.set("Font", Object::Dictionary(fonts));

        self.opt_clone_object_to_new_document(page_id)?;
        self.get_new_object_mut(page_id)?
            .as_dict_mut()?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    /// Draw `content` over the existing page content.
    ///
    /// The existing streams are wrapped in `q`/`Q` so a graphics state they
    /// leave behind does not leak into the new content.
    fn add_to_page_content(
        &mut self,
        page_id: ObjectId,
        content: Content<Vec<Operation>>,
    ) -> Result<(), Error> {
        let existing = {
            let doc = self.source_document();
            let page = self.latest_object(page_id)?.as_dict()?;
            content_references(page, doc)?
        };

        let mut operations = Vec::with_capacity(content.operations.len() + 3);
        if !existing.is_empty() {
            // `Q` = Restore graphics state saved before the existing content
            operations.push(Operation::new("Q", vec![]));
        }
        operations.push(Operation::new("q", vec![]));
        operations.extend(content.operations);
        operations.push(Operation::new("Q", vec![]));
        // Streams are concatenated when read, keep them apart.
        let mut stream_data = b"\n".to_vec();
        stream_data.extend(Content { operations }.encode()?);

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let save_state_id = self.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(save_state_id));
            contents.extend(existing);
        }
        let content_id = self.add_object(Stream::new(Dictionary::new(), stream_data));
        contents.push(Object::Reference(content_id));

        self.opt_clone_object_to_new_document(page_id)?;
        self.get_new_object_mut(page_id)?
            .as_dict_mut()?
            .set("Contents", Object::Array(contents));
        Ok(())
    }
}

impl AppendToPage for IncrementalDocument {
    fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.new_document.add_object(object)
    }

    fn opt_clone_object_to_new_document(&mut self, object_id: ObjectId) -> Result<(), Error> {
        IncrementalDocument::opt_clone_object_to_new_document(self, object_id)?;
        Ok(())
    }

    fn source_document(&self) -> &Document {
        self.get_prev_documents()
    }

    fn latest_object(&self, object_id: ObjectId) -> Result<&Object, Error> {
        match self.new_document.objects.get(&object_id) {
            Some(object) => Ok(object),
            None => Ok(self.get_prev_documents().get_object(object_id)?),
        }
    }

    fn get_new_object_mut(&mut self, object_id: ObjectId) -> Result<&mut Object, Error> {
        Ok(self.new_document.get_object_mut(object_id)?)
    }
}
