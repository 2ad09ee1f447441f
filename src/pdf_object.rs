use crate::Error;
use lopdf::{Document, Object};

pub(crate) trait PdfObjectDeref {
    /// Follow a reference, other objects are returned as is.
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error>;
}

impl PdfObjectDeref for Object {
    fn deref<'a>(&'a self, doc: &'a Document) -> Result<&'a Object, Error> {
        match *self {
            Object::Reference(oid) => doc
                .objects
                .get(&oid)
                .ok_or_else(|| Error::Other(format!("PDF Error: NoSuchReference({:#?})", oid))),
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deref_follows_references() {
        let mut doc = Document::with_version("1.5");
        let id = doc.add_object(Object::Integer(7));
        let reference = Object::Reference(id);
        assert!(matches!(reference.deref(&doc), Ok(Object::Integer(7))));
        assert!(matches!(Object::Integer(3).deref(&doc), Ok(Object::Integer(3))));
        assert!(Object::Reference((999, 0)).deref(&doc).is_err());
    }
}
