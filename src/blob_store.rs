//! Transient references to the current PDF.
//!
//! A reference stands for a blob held by a [`BlobBackend`]. The
//! [`DocumentBlobManager`] owns at most one of them at a time and releases the
//! old one whenever a new document is published.

use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Opaque handle to a published document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobReference(String);

impl BlobReference {
    pub fn new<S: Into<String>>(value: S) -> Self {
        BlobReference(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage behind blob references.
pub trait BlobBackend: Send + Sync {
    fn create(&self, bytes: Arc<Vec<u8>>) -> BlobReference;

    /// Returns `false` when the reference was not live.
    fn release(&self, reference: &BlobReference) -> bool;

    fn resolve(&self, reference: &BlobReference) -> Option<Arc<Vec<u8>>>;

    fn live_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryBlobBackend {
    next_id: AtomicU64,
    blobs: Mutex<HashMap<BlobReference, Arc<Vec<u8>>>>,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> MutexGuard<'_, HashMap<BlobReference, Arc<Vec<u8>>>> {
        // A poisoned map is still consistent, every operation is a single call.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobBackend for MemoryBlobBackend {
    fn create(&self, bytes: Arc<Vec<u8>>) -> BlobReference {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let reference = BlobReference(format!("blob:pdf/{}", id));
        self.blobs().insert(reference.clone(), bytes);
        reference
    }

    fn release(&self, reference: &BlobReference) -> bool {
        self.blobs().remove(reference).is_some()
    }

    fn resolve(&self, reference: &BlobReference) -> Option<Arc<Vec<u8>>> {
        self.blobs().get(reference).cloned()
    }

    fn live_count(&self) -> usize {
        self.blobs().len()
    }
}

/// Owner of the single live document reference.
pub struct DocumentBlobManager {
    backend: Arc<dyn BlobBackend>,
    current: Option<BlobReference>,
}

impl fmt::Debug for DocumentBlobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentBlobManager")
            .field("current", &self.current)
            .finish()
    }
}

impl Default for DocumentBlobManager {
    fn default() -> Self {
        Self::new(Arc::new(MemoryBlobBackend::new()))
    }
}

impl DocumentBlobManager {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        DocumentBlobManager {
            backend,
            current: None,
        }
    }

    /// Release the current reference, then publish `bytes` under a new one.
    pub fn publish(&mut self, bytes: Arc<Vec<u8>>) -> BlobReference {
        if let Some(previous) = self.current.take() {
            self.release(&previous);
        }
        let reference = self.backend.create(bytes);
        log::debug!("Published document as `{}`.", reference);
        self.current = Some(reference.clone());
        reference
    }

    pub fn current_reference(&self) -> Option<&BlobReference> {
        self.current.as_ref()
    }

    pub fn resolve_current(&self) -> Result<Arc<Vec<u8>>, Error> {
        let reference = self.current.as_ref().ok_or(Error::DocumentNotLoaded)?;
        self.backend.resolve(reference).ok_or_else(|| {
            Error::Other(format!("Blob `{}` is no longer available.", reference))
        })
    }

    /// Number of references the backend still holds.
    pub fn live_references(&self) -> usize {
        self.backend.live_count()
    }

    fn release(&self, reference: &BlobReference) {
        if self.backend.release(reference) {
            log::debug!("Released `{}`.", reference);
        } else {
            log::warn!("Blob `{}` was already released.", reference);
        }
    }
}

impl Drop for DocumentBlobManager {
    fn drop(&mut self) {
        if let Some(current) = self.current.take() {
            self.release(&current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_reference_stays_live() {
        let backend = Arc::new(MemoryBlobBackend::new());
        let mut manager = DocumentBlobManager::new(backend.clone());
        let mut references = Vec::new();
        for i in 0..5u8 {
            references.push(manager.publish(Arc::new(vec![i])));
            assert_eq!(backend.live_count(), 1);
        }
        let (last, earlier) = references.split_last().unwrap();
        assert_eq!(manager.current_reference(), Some(last));
        for reference in earlier {
            assert!(backend.resolve(reference).is_none());
        }
        assert_eq!(*manager.resolve_current().unwrap(), vec![4u8]);
    }

    #[test]
    fn references_are_unique() {
        let backend = MemoryBlobBackend::new();
        let a = backend.create(Arc::new(vec![]));
        let b = backend.create(Arc::new(vec![]));
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:pdf/"));
        assert!(backend.release(&a));
        assert!(!backend.release(&a));
    }

    #[test]
    fn drop_releases_current() {
        let backend = Arc::new(MemoryBlobBackend::new());
        {
            let mut manager = DocumentBlobManager::new(backend.clone());
            manager.publish(Arc::new(b"%PDF".to_vec()));
            assert_eq!(manager.live_references(), 1);
        }
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn nothing_published_yet() {
        let manager = DocumentBlobManager::default();
        assert!(manager.current_reference().is_none());
        assert!(matches!(
            manager.resolve_current(),
            Err(Error::DocumentNotLoaded)
        ));
    }
}
