use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read inventory file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed XML: {message}")]
    Unbalanced { message: String },

    #[error("document has no Inventory element under <{root}>")]
    MissingInventory { root: String },
}

impl InventoryError {
    /// True for every failure caused by the document content rather than by
    /// locating or reading the file.
    pub fn is_malformed(&self) -> bool {
        !matches!(
            self,
            InventoryError::NotFound { .. } | InventoryError::Read { .. }
        )
    }
}
