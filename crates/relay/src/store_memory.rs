//! In-memory registry store for tests and dry runs.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{Result, registry::RegistryDocument, store::RegistryStore};

#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<RegistryDocument>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn with_document(doc: RegistryDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
            ..Self::default()
        }
    }

    /// The last saved (or seeded) document.
    pub fn document(&self) -> RegistryDocument {
        self.doc.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load(&self) -> Result<RegistryDocument> {
        Ok(self.document())
    }

    async fn save(&self, doc: &RegistryDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("memory store configured to fail").into());
        }
        *self.doc.lock().unwrap_or_else(|e| e.into_inner()) = doc.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
