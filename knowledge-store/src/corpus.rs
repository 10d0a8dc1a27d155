//! Corpus data model and loader.
//!
//! The corpus is a single JSON array of curated knowledge entries.
//! Each entry becomes exactly one vector record, keyed by its `id`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StoreError;

/// One curated knowledge entry as stored in the corpus file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Opaque unique identifier, stable across runs. Doubles as the
    /// vector-store key, which makes re-ingestion idempotent.
    pub id: String,
    /// Short classification label.
    pub category: String,
    /// Free-text description.
    pub content: String,
}

impl CorpusEntry {
    /// Text submitted to the embedding provider for this entry.
    ///
    /// The format is fixed; changing it would shift the embedding
    /// space away from previously ingested records.
    pub fn embedding_text(&self) -> String {
        format!("Category: {}\nInfo: {}", self.category, self.content)
    }

    /// Metadata carried alongside the vector for later retrieval.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            id: self.id.clone(),
            category: self.category.clone(),
        }
    }
}

/// Compact per-record metadata stored in the vector payload and
/// returned with every search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub id: String,
    pub category: String,
}

/// Reads the corpus file strictly.
///
/// # Errors
/// - [`StoreError::Io`] if the file cannot be opened or read.
/// - [`StoreError::Parse`] if the content is not a valid entry array.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<CorpusEntry>, StoreError> {
    info!("Reading corpus file: {:?}", path.as_ref());

    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let entries: Vec<CorpusEntry> = serde_json::from_reader(reader)?;

    debug!("Loaded {} corpus entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedding_text_has_fixed_shape() {
        let entry = CorpusEntry {
            id: "vg_001".into(),
            category: "Biography".into(),
            content: "Vincent was born in 1853.".into(),
        };
        assert_eq!(
            entry.embedding_text(),
            "Category: Biography\nInfo: Vincent was born in 1853."
        );
    }

    #[test]
    fn loads_entries_from_json_array() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"id":"a","category":"Art","content":"Sunflowers"}},
                {{"id":"b","category":"Life","content":"Arles"}}]"#
        )
        .unwrap();

        let entries = load_corpus(f.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[1].metadata().category, "Life");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_corpus("/nonexistent/corpus.json").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = load_corpus(f.path()).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
