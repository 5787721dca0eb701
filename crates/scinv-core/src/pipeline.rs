use std::path::{Path, PathBuf};

use scinv_parser::parse_inventory_file;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::Result;
use crate::flatten::{flatten_with, Diagnostic};
use crate::index::build_equipment_index;
use crate::output::write_csv;
use crate::record::FlatRecord;

/// What a completed run found and where it wrote the report.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sensors_declared: usize,
    pub dataloggers_declared: usize,
    pub responses_declared: usize,
    pub sensors_referenced: usize,
    pub dataloggers_referenced: usize,
    pub streams: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub output_path: PathBuf,
}

/// Parse, index, flatten and write. The output file is only touched once the
/// inventory has been parsed successfully.
pub fn run(inventory_path: &Path, config: &ReportConfig) -> Result<RunSummary> {
    let inventory = parse_inventory_file(inventory_path)?;
    let index = build_equipment_index(&inventory);

    let mut flattener = flatten_with(&inventory, &index, config.flatten_options());
    let records: Vec<FlatRecord> = flattener.by_ref().collect();
    let report = flattener.into_report();

    let output_path = config.output_path();
    write_csv(&records, &output_path)?;

    info!(
        streams = report.streams,
        unresolved = report.unresolved_count(),
        output = %output_path.display(),
        "inventory flattened"
    );

    Ok(RunSummary {
        sensors_declared: index.sensor_count(),
        dataloggers_declared: index.datalogger_count(),
        responses_declared: index.response_count(),
        sensors_referenced: report.sensors_referenced.len(),
        dataloggers_referenced: report.dataloggers_referenced.len(),
        streams: report.streams,
        diagnostics: report.diagnostics,
        output_path,
    })
}
