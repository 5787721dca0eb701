pub mod config;
pub mod error;
pub mod flatten;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod schema;

pub use config::{ConfigError, ReportConfig};
pub use error::RunError;
pub use flatten::{
    flatten, flatten_with, Diagnostic, FlattenOptions, FlattenReport, Flattener, ReferenceKind,
};
pub use index::{build_equipment_index, EquipmentIndex};
pub use output::{header_for, write_csv, write_csv_to, OutputError};
pub use pipeline::{run, RunSummary};
pub use record::{FlatRecord, StreamPath};
