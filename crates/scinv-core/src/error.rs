use scinv_parser::InventoryError;
use thiserror::Error;

use crate::output::OutputError;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Inventory could not be loaded: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Report could not be written: {0}")]
    Output(#[from] OutputError),
}

impl RunError {
    /// True when the input document itself is unusable (as opposed to
    /// missing or unreadable).
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, RunError::Inventory(err) if err.is_malformed())
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
