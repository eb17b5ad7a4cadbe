use std::path::PathBuf;

use crate::error::AppError;
use crate::model::{has_definition_extension, DefinitionRecord, DEFINITION_EXTENSIONS};
use crate::store::traits::DefinitionStore;

/// Definitions stored as plain files under a root directory
#[derive(Debug, Clone)]
pub struct FsDefinitionStore {
    root: PathBuf,
}

impl FsDefinitionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn canonical_root(&self) -> Option<PathBuf> {
        match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => Some(root),
            Err(e) => {
                log::warn!(
                    "Definitions directory {} is not accessible: {}",
                    self.root.display(),
                    e
                );
                None
            }
        }
    }
}

/// Normalise a client-supplied reference into a relative, forward-slash path.
///
/// Purely lexical: `..` segments, drive prefixes and empty references are
/// rejected before anything touches the filesystem.
pub fn sanitize_reference(reference: &str) -> Result<String, AppError> {
    let normalized = reference.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(AppError::InvalidReference(format!(
                    "'{}' contains a parent-directory segment",
                    reference
                )))
            }
            s if has_illegal_character(s) => {
                return Err(AppError::InvalidReference(format!(
                    "'{}' contains an illegal character",
                    reference
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(AppError::InvalidReference(
            "definition reference is empty".to_string(),
        ));
    }
    Ok(segments.join("/"))
}

fn has_illegal_character(segment: &str) -> bool {
    segment.contains(':') || segment.contains('\0')
}

/// Whether a directory entry name survives [`sanitize_reference`] unchanged.
/// Backslashes would be read back as separators, so they are excluded too.
fn is_addressable_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains('\\') && !has_illegal_character(name)
}

/// Relative paths to try for a sanitised reference, in preference order
pub fn candidate_paths(sanitized: &str) -> Vec<String> {
    if has_definition_extension(sanitized) {
        vec![sanitized.to_string()]
    } else {
        DEFINITION_EXTENSIONS
            .iter()
            .map(|ext| format!("{}.{}", sanitized, ext))
            .collect()
    }
}

#[async_trait::async_trait]
impl DefinitionStore for FsDefinitionStore {
    async fn resolve(&self, reference: &str) -> Result<DefinitionRecord, AppError> {
        let sanitized = sanitize_reference(reference)?;
        let root = self
            .canonical_root()
            .await
            .ok_or_else(|| AppError::NotFound(sanitized.clone()))?;

        for candidate in candidate_paths(&sanitized) {
            let path = root.join(&candidate);
            let is_file = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta.is_file(),
                Err(_) => false,
            };
            if !is_file {
                continue;
            }

            // Symlinks may point anywhere; only accept targets inside the root.
            let canonical = tokio::fs::canonicalize(&path).await?;
            if !canonical.starts_with(&root) {
                log::warn!(
                    "Rejected definition '{}': resolves outside {}",
                    candidate,
                    root.display()
                );
                return Err(AppError::NotFound(sanitized));
            }
            return Ok(DefinitionRecord::new(candidate, canonical));
        }

        Err(AppError::NotFound(sanitized))
    }

    async fn list(&self) -> Result<Vec<DefinitionRecord>, AppError> {
        let Some(root) = self.canonical_root().await else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    log::warn!("Skipping non UTF-8 file name in {}", dir.display());
                    continue;
                };
                if !is_addressable_name(file_name) {
                    log::warn!(
                        "Skipping '{}' in {}: name cannot be used as a definition reference",
                        file_name,
                        dir.display()
                    );
                    continue;
                }
                let id = if prefix.is_empty() {
                    file_name.to_string()
                } else {
                    format!("{}/{}", prefix, file_name)
                };

                // file_type() does not follow symlinks, so linked
                // directories are never descended into.
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push((entry.path(), id));
                } else if file_type.is_file() && has_definition_extension(&id) {
                    records.push(DefinitionRecord::new(id, entry.path()));
                }
            }
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
