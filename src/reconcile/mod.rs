// dbinventory — Reconcile Module
//
// Bulk import and export of groups, tags and hosts as JSON.

mod document;
mod reconciler;

use std::path::Path;

pub use document::{Document, GroupRecord, HostRecord, Record, TagRecord};
pub use reconciler::{Counts, ImportSummary, Reconciler};

use crate::error::InventoryError;

/// Read an import document from disk.
pub fn load_document(path: &Path) -> Result<Document, InventoryError> {
    if !path.is_file() {
        return Err(InventoryError::Config(format!(
            "Import file '{}' does not exist.",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let document = serde_json::from_str(&text)?;
    tracing::debug!(path = %path.display(), "Import document loaded");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_document(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(InventoryError::Config(_))));
    }

    #[test]
    fn test_load_invalid_json_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_document(&path), Err(InventoryError::Json(_))));
    }

    #[test]
    fn test_load_document_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        std::fs::write(&path, r#"{"groups": [{"name": "env", "type": "select"}]}"#).unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.groups.len(), 1);
        assert!(doc.hosts.is_empty());
    }
}
