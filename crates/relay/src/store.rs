use async_trait::async_trait;

use crate::{Result, registry::RegistryDocument};

/// Persistence for the registry document. Every save is a whole-document
/// overwrite.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Read the persisted document, creating and persisting an empty one if
    /// nothing has been stored yet.
    async fn load(&self) -> Result<RegistryDocument>;

    /// Replace the persisted document.
    async fn save(&self, doc: &RegistryDocument) -> Result<()>;
}
