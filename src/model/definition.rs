use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File extensions recognised as definitions, in resolution preference order
pub const DEFINITION_EXTENSIONS: [&str; 2] = ["gh", "ghx"];

/// A definition file located under the definitions directory.
///
/// `id` is the path relative to that directory, forward-slash separated and
/// including the extension (`beams/truss.gh`), so every id maps to exactly
/// one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing)]
    pub absolute_path: PathBuf,
}

impl DefinitionRecord {
    pub fn new(id: String, absolute_path: PathBuf) -> Self {
        let name = absolute_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone());
        Self {
            name,
            id,
            absolute_path,
        }
    }
}

/// A resolved definition together with its file contents
#[derive(Debug, Clone)]
pub struct DefinitionSource {
    pub record: DefinitionRecord,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`
    pub content_hash: String,
}

impl DefinitionSource {
    pub fn new(record: DefinitionRecord, bytes: Vec<u8>) -> Self {
        let content_hash = content_hash(&bytes);
        Self {
            record,
            bytes,
            content_hash,
        }
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// True when `path` ends in one of the definition extensions (case-insensitive)
pub fn has_definition_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !stem.ends_with('/') => DEFINITION_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        _ => false,
    }
}
