use crate::pdf_object::PdfObjectDeref;
use crate::rectangle::Rectangle;
use crate::Error;
use lopdf::{Dictionary, Document, Object, ObjectId};

// Deep or cyclic `Parent` chains are treated as broken.
const MAX_PAGE_TREE_DEPTH: usize = 64;

pub(crate) fn as_number(obj: &Object) -> Result<f32, Error> {
    match *obj {
        Object::Integer(value) => Ok(value as f32),
        Object::Real(value) => Ok(value as f32),
        _ => Err(Error::Other(format!("Expected a number, found {:?}.", obj))),
    }
}

pub(crate) fn as_rectangle(obj: &Object, doc: &Document) -> Result<Rectangle, Error> {
    let list = obj.deref(doc)?.as_array()?;
    if list.len() < 4 {
        return Err(Error::from("Rectangle needs 4 numbers."));
    }
    let mut values = [0f32; 4];
    for (value, item) in values.iter_mut().zip(list) {
        *value = as_number(item.deref(doc)?)?;
    }
    Ok(Rectangle {
        x1: values[0],
        y1: values[1],
        x2: values[2],
        y2: values[3],
    }
    .normalized())
}

/// Look up a page attribute, walking up the page tree for inheritable keys
/// like `MediaBox` and `Resources`.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, Error> {
    let mut node: &Dictionary = doc.get_object(page_id)?.as_dict()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value.deref(doc)?));
        }
        match node.get(b"Parent") {
            Ok(parent) => node = parent.deref(doc)?.as_dict()?,
            Err(_) => return Ok(None),
        }
    }
    log::warn!("Page tree is deeper than {} levels.", MAX_PAGE_TREE_DEPTH);
    Ok(None)
}

/// Copy a dictionary that may be stored inline or behind a reference.
pub(crate) fn as_owned_dictionary(obj: Option<&Object>, doc: &Document) -> Result<Dictionary, Error> {
    match obj {
        Some(obj) => Ok(obj.deref(doc)?.as_dict()?.clone()),
        None => Ok(Dictionary::new()),
    }
}

/// The content stream references of a page, in drawing order.
pub(crate) fn content_references(page: &Dictionary, doc: &Document) -> Result<Vec<Object>, Error> {
    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(vec![]),
    };
    match contents {
        Object::Reference(_) => match contents.deref(doc) {
            // A reference to an array of streams
            Ok(Object::Array(list)) => Ok(list.clone()),
            _ => Ok(vec![contents.clone()]),
        },
        Object::Array(list) => Ok(list.clone()),
        _ => Err(Error::from("Page `Contents` is not a stream reference.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn media_box_is_inherited() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), Object::Real(400.5)],
            }),
        );

        let media_box = inherited_attribute(&doc, page_id, b"MediaBox")
            .unwrap()
            .unwrap();
        let rect = as_rectangle(media_box, &doc).unwrap();
        assert_eq!(rect.width(), 300.0);
        assert_eq!(rect.height(), 400.5);
        assert!(inherited_attribute(&doc, page_id, b"CropBox")
            .unwrap()
            .is_none());
    }

    #[test]
    fn contents_variants() {
        let doc = Document::with_version("1.5");
        let single = dictionary! { "Contents" => Object::Reference((4, 0)) };
        assert_eq!(content_references(&single, &doc).unwrap().len(), 1);
        let list = dictionary! {
            "Contents" => vec![Object::Reference((4, 0)), Object::Reference((5, 0))],
        };
        assert_eq!(content_references(&list, &doc).unwrap().len(), 2);
        assert!(content_references(&Dictionary::new(), &doc).unwrap().is_empty());
    }
}
