use crate::error::AppError;
use crate::model::{DefinitionRecord, DefinitionSource};

/// Lookup and enumeration of definition files
#[async_trait::async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Resolve a name or id to exactly one definition file
    async fn resolve(&self, reference: &str) -> Result<DefinitionRecord, AppError>;
    /// All definitions, sorted by id
    async fn list(&self) -> Result<Vec<DefinitionRecord>, AppError>;
    /// Read a resolved definition's contents
    async fn load(&self, record: &DefinitionRecord) -> Result<DefinitionSource, AppError> {
        let bytes = tokio::fs::read(&record.absolute_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(record.id.clone())
            } else {
                AppError::Io(e)
            }
        })?;
        Ok(DefinitionSource::new(record.clone(), bytes))
    }
}
