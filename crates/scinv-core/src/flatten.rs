use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use scinv_parser::{
    Datalogger, Inventory, Network, Response, ResponseParameters, Sensor, SensorLocation, Station,
    Stream, Validity,
};
use tracing::{debug, warn};

use crate::index::EquipmentIndex;
use crate::record::{FlatRecord, StreamPath};
use crate::schema::{self, ResponseColumns};

pub const DEFAULT_COMMENT_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Sensor,
    Datalogger,
    SensorResponse,
    FilterStage,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Sensor => "sensor",
            ReferenceKind::Datalogger => "datalogger",
            ReferenceKind::SensorResponse => "sensor response",
            ReferenceKind::FilterStage => "filter stage",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identifier that did not resolve while flattening `stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ReferenceKind,
    pub identifier: String,
    pub stream: StreamPath,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved {} '{}' referenced by stream {}",
            self.kind, self.identifier, self.stream
        )
    }
}

/// Counters gathered while the flattener is drained. They describe the run and
/// never influence record content.
#[derive(Debug, Clone, Default)]
pub struct FlattenReport {
    pub streams: usize,
    pub sensors_referenced: BTreeSet<String>,
    pub dataloggers_referenced: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FlattenReport {
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics.len()
    }
}

#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub comment_separator: String,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            comment_separator: DEFAULT_COMMENT_SEPARATOR.to_string(),
        }
    }
}

#[derive(Clone, Copy)]
struct StreamContext<'a> {
    network: &'a Network,
    station: &'a Station,
    location: &'a SensorLocation,
    stream: &'a Stream,
}

/// Lazy, single-pass sequence of one record per stream in document order.
pub struct Flattener<'a> {
    streams: Box<dyn Iterator<Item = StreamContext<'a>> + 'a>,
    index: &'a EquipmentIndex<'a>,
    options: FlattenOptions,
    report: FlattenReport,
}

pub fn flatten<'a>(inventory: &'a Inventory, index: &'a EquipmentIndex<'a>) -> Flattener<'a> {
    flatten_with(inventory, index, FlattenOptions::default())
}

pub fn flatten_with<'a>(
    inventory: &'a Inventory,
    index: &'a EquipmentIndex<'a>,
    options: FlattenOptions,
) -> Flattener<'a> {
    let streams = inventory.networks.iter().flat_map(|network| {
        network.stations.iter().flat_map(move |station| {
            station.locations.iter().flat_map(move |location| {
                location.streams.iter().map(move |stream| StreamContext {
                    network,
                    station,
                    location,
                    stream,
                })
            })
        })
    });

    Flattener {
        streams: Box::new(streams),
        index,
        options,
        report: FlattenReport::default(),
    }
}

impl<'a> Iterator for Flattener<'a> {
    type Item = FlatRecord;

    fn next(&mut self) -> Option<FlatRecord> {
        let context = self.streams.next()?;
        Some(self.build_record(context))
    }
}

impl<'a> Flattener<'a> {
    pub fn report(&self) -> &FlattenReport {
        &self.report
    }

    pub fn into_report(self) -> FlattenReport {
        self.report
    }

    fn build_record(&mut self, context: StreamContext<'a>) -> FlatRecord {
        let StreamContext {
            network,
            station,
            location,
            stream,
        } = context;
        let path = StreamPath {
            network: network.code.clone(),
            station: station.code.clone(),
            location: location.code.clone(),
            stream: stream.code.clone(),
        };

        let mut record = FlatRecord::new();
        record.set(schema::NETWORK, path.network.as_str());
        record.set(schema::STATION, path.station.as_str());
        record.set(schema::LOCATION, path.location.as_str());
        record.set(schema::CHANNEL, path.stream.as_str());

        copy_network(&mut record, network);
        copy_station(&mut record, station);
        copy_location(&mut record, location);
        copy_stream(&mut record, stream, &self.options);
        copy_effective_validity(
            &mut record,
            [
                &network.validity,
                &station.validity,
                &location.validity,
                &stream.validity,
            ],
            &path,
        );

        let sensor = self.resolve_sensor(&mut record, stream, &path);
        if sensor.is_none() {
            clear_columns(&mut record, schema::SENSOR_COLUMNS);
        }
        let datalogger = self.resolve_datalogger(&mut record, stream, &path);
        if datalogger.is_none() {
            clear_columns(&mut record, schema::DATALOGGER_COLUMNS);
        }

        record.set_opt(
            schema::SENSOR_SERIAL_NUMBER,
            stream
                .sensor_serial_number
                .as_deref()
                .or_else(|| sensor.and_then(|s| s.serial_number.as_deref())),
        );
        record.set_opt(
            schema::DATALOGGER_SERIAL_NUMBER,
            stream
                .datalogger_serial_number
                .as_deref()
                .or_else(|| datalogger.and_then(|d| d.serial_number.as_deref())),
        );

        self.report.streams += 1;
        record
    }

    fn resolve_sensor(
        &mut self,
        record: &mut FlatRecord,
        stream: &Stream,
        path: &StreamPath,
    ) -> Option<&'a Sensor> {
        let index = self.index;
        let id = stream.sensor.as_deref().filter(|id| !id.is_empty())?;
        let Some(sensor) = index.sensor(id) else {
            self.unresolved(ReferenceKind::Sensor, id, path);
            return None;
        };

        self.report.sensors_referenced.insert(id.to_string());
        copy_sensor(record, sensor);

        if let Some(response_id) = sensor.response.as_deref().filter(|id| !id.is_empty()) {
            match index.response(response_id) {
                Some(response) => {
                    copy_response(record, &schema::SENSOR_RESPONSE_COLUMNS, response)
                }
                None => self.unresolved(ReferenceKind::SensorResponse, response_id, path),
            }
        }

        Some(sensor)
    }

    fn resolve_datalogger(
        &mut self,
        record: &mut FlatRecord,
        stream: &Stream,
        path: &StreamPath,
    ) -> Option<&'a Datalogger> {
        let index = self.index;
        let id = stream.datalogger.as_deref().filter(|id| !id.is_empty())?;
        let Some(datalogger) = index.datalogger(id) else {
            self.unresolved(ReferenceKind::Datalogger, id, path);
            return None;
        };

        self.report.dataloggers_referenced.insert(id.to_string());
        copy_datalogger(record, datalogger);
        self.resolve_decimation(record, datalogger, stream, path);

        Some(datalogger)
    }

    /// Copies the decimation matching the stream's sample rate together with a
    /// summary of its filter stages.
    fn resolve_decimation(
        &mut self,
        record: &mut FlatRecord,
        datalogger: &Datalogger,
        stream: &Stream,
        path: &StreamPath,
    ) {
        let index = self.index;
        let Some(rate) = stream.sample_rate() else {
            return;
        };
        let Some(decimation) = datalogger.decimation_for(rate) else {
            debug!(
                stream = %path,
                datalogger = %datalogger.public_id,
                sample_rate = rate.hertz(),
                "no decimation matches stream sample rate"
            );
            return;
        };

        let mut kinds = Vec::new();
        let mut gain = Some(1.0_f64);
        let mut total_factor: u64 = 1;
        let mut final_stage: Option<&Response> = None;

        for stage_id in decimation.stages() {
            match index.response(stage_id) {
                Some(response) => {
                    kinds.push(response.kind().as_str());
                    gain = gain.zip(response.gain_value()).map(|(acc, g)| acc * g);
                    if let Some(factor) = response.decimation_factor() {
                        total_factor = total_factor.saturating_mul(factor);
                    }
                    final_stage = Some(response);
                }
                None => {
                    kinds.push("unresolved");
                    gain = None;
                    final_stage = None;
                    self.unresolved(ReferenceKind::FilterStage, stage_id, path);
                }
            }
        }

        let stage_count = kinds.len();
        record.set(schema::DECIMATION_SAMPLE_RATE, format_number(rate.hertz()));
        record.set(
            schema::DECIMATION_ANALOGUE_CHAIN,
            decimation.analogue_filter_chain.join(" "),
        );
        record.set(
            schema::DECIMATION_DIGITAL_CHAIN,
            decimation.digital_filter_chain.join(" "),
        );
        record.set(schema::DECIMATION_STAGE_COUNT, stage_count.to_string());
        record.set(schema::DECIMATION_STAGE_KINDS, kinds.join(";"));
        record.set(
            schema::DECIMATION_STAGE_GAIN,
            gain.filter(|_| stage_count > 0)
                .map(format_number)
                .unwrap_or_default(),
        );
        record.set(schema::DECIMATION_TOTAL_FACTOR, total_factor.to_string());

        if let Some(response) = final_stage {
            copy_response(record, &schema::DATALOGGER_RESPONSE_COLUMNS, response);
        }
    }

    fn unresolved(&mut self, kind: ReferenceKind, identifier: &str, path: &StreamPath) {
        let diagnostic = Diagnostic {
            kind,
            identifier: identifier.to_string(),
            stream: path.clone(),
        };
        debug!(%diagnostic, "reference did not resolve");
        self.report.diagnostics.push(diagnostic);
    }
}

/// Equipment that did not resolve still gets its column group, left empty.
fn clear_columns(record: &mut FlatRecord, columns: &[&'static str]) {
    for &column in columns {
        record.set(column, "");
    }
}

fn copy_network(record: &mut FlatRecord, network: &Network) {
    record.set_opt(schema::NETWORK_DESCRIPTION, network.description.as_deref());
    record.set_opt(schema::NETWORK_TYPE, network.network_type.as_deref());
    record.set_opt(schema::NETWORK_REGION, network.region.as_deref());
    copy_validity(
        record,
        &network.validity,
        schema::NETWORK_START,
        schema::NETWORK_END,
    );
}

fn copy_station(record: &mut FlatRecord, station: &Station) {
    record.set_opt(schema::STATION_DESCRIPTION, station.description.as_deref());
    record.set_opt(schema::STATION_LATITUDE, station.latitude.as_deref());
    record.set_opt(schema::STATION_LONGITUDE, station.longitude.as_deref());
    record.set_opt(schema::STATION_ELEVATION, station.elevation.as_deref());
    record.set_opt(schema::STATION_PLACE, station.place.as_deref());
    record.set_opt(schema::STATION_COUNTRY, station.country.as_deref());
    copy_validity(
        record,
        &station.validity,
        schema::STATION_START,
        schema::STATION_END,
    );
}

fn copy_location(record: &mut FlatRecord, location: &SensorLocation) {
    record.set_opt(schema::LATITUDE, location.latitude.as_deref());
    record.set_opt(schema::LONGITUDE, location.longitude.as_deref());
    record.set_opt(schema::ELEVATION, location.elevation.as_deref());
    copy_validity(
        record,
        &location.validity,
        schema::LOCATION_START,
        schema::LOCATION_END,
    );
}

fn copy_stream(record: &mut FlatRecord, stream: &Stream, options: &FlattenOptions) {
    copy_validity(
        record,
        &stream.validity,
        schema::STREAM_START,
        schema::STREAM_END,
    );
    record.set_opt(schema::DEPTH, stream.depth.as_deref());
    record.set_opt(schema::AZIMUTH, stream.azimuth.as_deref());
    record.set_opt(schema::DIP, stream.dip.as_deref());
    record.set_opt(
        schema::SAMPLE_RATE_NUMERATOR,
        stream.sample_rate_numerator.as_deref(),
    );
    record.set_opt(
        schema::SAMPLE_RATE_DENOMINATOR,
        stream.sample_rate_denominator.as_deref(),
    );
    record.set(
        schema::SAMPLE_RATE,
        stream
            .sample_rate()
            .map(|rate| format_number(rate.hertz()))
            .unwrap_or_default(),
    );
    record.set_opt(schema::GAIN, stream.gain.as_deref());
    record.set_opt(schema::GAIN_FREQUENCY, stream.gain_frequency.as_deref());
    record.set_opt(schema::GAIN_UNIT, stream.gain_unit.as_deref());
    record.set_opt(schema::FORMAT, stream.format.as_deref());
    record.set_opt(schema::FLAGS, stream.flags.as_deref());
    record.set_opt(schema::RESTRICTED, stream.restricted.as_deref());
    record.set_opt(schema::SHARED, stream.shared.as_deref());
    record.set_opt(schema::SENSOR_CHANNEL, stream.sensor_channel.as_deref());
    record.set_opt(
        schema::DATALOGGER_CHANNEL,
        stream.datalogger_channel.as_deref(),
    );
    record.set_opt(
        schema::CLOCK_SERIAL_NUMBER,
        stream.clock_serial_number.as_deref(),
    );
    record.set_opt(schema::SENSOR_ID, stream.sensor.as_deref());
    record.set_opt(schema::DATALOGGER_ID, stream.datalogger.as_deref());
    record.set_opt(
        schema::SENSOR_SERIAL_NUMBER_STREAM,
        stream.sensor_serial_number.as_deref(),
    );
    record.set_opt(
        schema::DATALOGGER_SERIAL_NUMBER_STREAM,
        stream.datalogger_serial_number.as_deref(),
    );
    record.set(
        schema::STREAM_COMMENTS,
        stream.comments.join(&options.comment_separator),
    );
}

fn copy_validity(
    record: &mut FlatRecord,
    validity: &Validity,
    start_column: &'static str,
    end_column: &'static str,
) {
    record.set_opt(start_column, validity.start.as_ref().map(|ts| ts.raw()));
    record.set_opt(end_column, validity.end.as_ref().map(|ts| ts.raw()));
}

/// Intersection of the ancestor and stream validity intervals.
fn copy_effective_validity(record: &mut FlatRecord, chain: [&Validity; 4], path: &StreamPath) {
    let start = chain.iter().filter_map(|v| v.start_instant()).max();
    let end = chain.iter().filter_map(|v| v.end_instant()).min();

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            warn!(stream = %path, %start, %end, "stream validity does not overlap its ancestors");
        }
    }

    record.set(
        schema::EFFECTIVE_START,
        start.map(format_instant).unwrap_or_default(),
    );
    record.set(
        schema::EFFECTIVE_END,
        end.map(format_instant).unwrap_or_default(),
    );
}

fn copy_sensor(record: &mut FlatRecord, sensor: &Sensor) {
    record.set_opt(schema::SENSOR_NAME, sensor.name.as_deref());
    record.set_opt(schema::SENSOR_DESCRIPTION, sensor.description.as_deref());
    record.set_opt(schema::SENSOR_MANUFACTURER, sensor.manufacturer.as_deref());
    record.set_opt(schema::SENSOR_MODEL, sensor.model.as_deref());
    record.set_opt(schema::SENSOR_TYPE, sensor.sensor_type.as_deref());
    record.set_opt(schema::SENSOR_UNIT, sensor.unit.as_deref());
    record.set_opt(schema::SENSOR_REMARK, sensor.remark.as_deref());
    record.set_opt(
        schema::SENSOR_SERIAL_NUMBER_EQUIPMENT,
        sensor.serial_number.as_deref(),
    );
    record.set_opt(schema::SENSOR_RESPONSE, sensor.response.as_deref());
}

fn copy_datalogger(record: &mut FlatRecord, datalogger: &Datalogger) {
    record.set_opt(schema::DATALOGGER_NAME, datalogger.name.as_deref());
    record.set_opt(
        schema::DATALOGGER_DESCRIPTION,
        datalogger.description.as_deref(),
    );
    record.set_opt(
        schema::DATALOGGER_MANUFACTURER,
        datalogger.manufacturer.as_deref(),
    );
    record.set_opt(schema::DATALOGGER_MODEL, datalogger.model.as_deref());
    record.set_opt(schema::DATALOGGER_TYPE, datalogger.datalogger_type.as_deref());
    record.set_opt(schema::DATALOGGER_REMARK, datalogger.remark.as_deref());
    record.set_opt(schema::DATALOGGER_GAIN, datalogger.gain.as_deref());
    record.set_opt(
        schema::DATALOGGER_MAX_CLOCK_DRIFT,
        datalogger.max_clock_drift.as_deref(),
    );
    record.set_opt(
        schema::DATALOGGER_CLOCK_MODEL,
        datalogger.clock_model.as_deref(),
    );
    record.set_opt(
        schema::DATALOGGER_SERIAL_NUMBER_EQUIPMENT,
        datalogger.serial_number.as_deref(),
    );

    let decimation_info = if datalogger.decimations.is_empty() {
        String::new()
    } else {
        match serde_json::to_string(&datalogger.decimations) {
            Ok(json) => json,
            Err(err) => {
                warn!(datalogger = %datalogger.public_id, error = %err, "failed to serialize decimations");
                String::new()
            }
        }
    };
    record.set(schema::DECIMATION_INFO, decimation_info);
}

fn copy_response(record: &mut FlatRecord, columns: &ResponseColumns, response: &Response) {
    record.set(columns.kind, response.kind().as_str());
    record.set_opt(columns.name, response.name.as_deref());
    record.set_opt(columns.gain, response.gain.as_deref());
    record.set_opt(columns.gain_frequency, response.gain_frequency.as_deref());

    match &response.parameters {
        ResponseParameters::Paz(paz) => {
            record.set_opt(columns.paz_type, paz.transfer_function_type.as_deref());
            record.set_opt(
                columns.normalization_factor,
                paz.normalization_factor.as_deref(),
            );
            record.set_opt(
                columns.normalization_frequency,
                paz.normalization_frequency.as_deref(),
            );
            record.set(columns.number_of_poles, paz.pole_count().to_string());
            record.set(columns.number_of_zeros, paz.zero_count().to_string());
        }
        ResponseParameters::Fir(fir) => {
            record.set_opt(columns.decimation_factor, fir.decimation_factor.as_deref());
            record.set_opt(columns.delay, fir.delay.as_deref());
            record.set_opt(columns.correction, fir.correction.as_deref());
            record.set_opt(columns.symmetry, fir.symmetry.as_deref());
            record.set(
                columns.number_of_coefficients,
                fir.coefficient_count().to_string(),
            );
        }
        ResponseParameters::Iir(iir) => {
            record.set_opt(columns.iir_type, iir.transfer_function_type.as_deref());
            record.set_opt(columns.decimation_factor, iir.decimation_factor.as_deref());
            record.set_opt(columns.delay, iir.delay.as_deref());
            record.set_opt(columns.correction, iir.correction.as_deref());
            record.set(
                columns.number_of_numerators,
                iir.numerator_count().to_string(),
            );
            record.set(
                columns.number_of_denominators,
                iir.denominator_count().to_string(),
            );
        }
        ResponseParameters::Polynomial(poly) => {
            record.set_opt(columns.frequency_unit, poly.frequency_unit.as_deref());
            record.set_opt(
                columns.approximation_type,
                poly.approximation_type.as_deref(),
            );
            record.set_opt(
                columns.approximation_lower_bound,
                poly.approximation_lower_bound.as_deref(),
            );
            record.set_opt(
                columns.approximation_upper_bound,
                poly.approximation_upper_bound.as_deref(),
            );
            record.set_opt(
                columns.approximation_error,
                poly.approximation_error.as_deref(),
            );
            record.set(
                columns.number_of_coefficients,
                poly.coefficient_count().to_string(),
            );
        }
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn format_number(value: f64) -> String {
    value.to_string()
}
