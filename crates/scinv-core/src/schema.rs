//! Canonical CSV column layout.
//!
//! Columns are grouped by the entity that supplies them. Identity, ancestor,
//! stream and equipment groups are set on every record (equipment left empty
//! when the reference does not resolve). Decimation and response groups only
//! appear when resolved, and response groups only carry the columns of their
//! kind.

pub const NETWORK: &str = "network";
pub const STATION: &str = "station";
pub const LOCATION: &str = "location";
pub const CHANNEL: &str = "channel";

pub const IDENTITY_COLUMNS: &[&str] = &[NETWORK, STATION, LOCATION, CHANNEL];

pub const NETWORK_DESCRIPTION: &str = "network_description";
pub const NETWORK_TYPE: &str = "network_type";
pub const NETWORK_REGION: &str = "network_region";
pub const NETWORK_START: &str = "network_start";
pub const NETWORK_END: &str = "network_end";

pub const NETWORK_COLUMNS: &[&str] = &[
    NETWORK_DESCRIPTION,
    NETWORK_TYPE,
    NETWORK_REGION,
    NETWORK_START,
    NETWORK_END,
];

pub const STATION_DESCRIPTION: &str = "station_description";
pub const STATION_LATITUDE: &str = "station_latitude";
pub const STATION_LONGITUDE: &str = "station_longitude";
pub const STATION_ELEVATION: &str = "station_elevation";
pub const STATION_PLACE: &str = "station_place";
pub const STATION_COUNTRY: &str = "station_country";
pub const STATION_START: &str = "station_start";
pub const STATION_END: &str = "station_end";

pub const STATION_COLUMNS: &[&str] = &[
    STATION_DESCRIPTION,
    STATION_LATITUDE,
    STATION_LONGITUDE,
    STATION_ELEVATION,
    STATION_PLACE,
    STATION_COUNTRY,
    STATION_START,
    STATION_END,
];

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const ELEVATION: &str = "elevation";
pub const LOCATION_START: &str = "location_start";
pub const LOCATION_END: &str = "location_end";

pub const LOCATION_COLUMNS: &[&str] = &[
    LATITUDE,
    LONGITUDE,
    ELEVATION,
    LOCATION_START,
    LOCATION_END,
];

pub const STREAM_START: &str = "stream_start";
pub const STREAM_END: &str = "stream_end";
pub const EFFECTIVE_START: &str = "effective_start";
pub const EFFECTIVE_END: &str = "effective_end";
pub const DEPTH: &str = "depth";
pub const AZIMUTH: &str = "azimuth";
pub const DIP: &str = "dip";
pub const SAMPLE_RATE_NUMERATOR: &str = "sample_rate_numerator";
pub const SAMPLE_RATE_DENOMINATOR: &str = "sample_rate_denominator";
pub const SAMPLE_RATE: &str = "sample_rate";
pub const GAIN: &str = "gain";
pub const GAIN_FREQUENCY: &str = "gain_frequency";
pub const GAIN_UNIT: &str = "gain_unit";
pub const FORMAT: &str = "format";
pub const FLAGS: &str = "flags";
pub const RESTRICTED: &str = "restricted";
pub const SHARED: &str = "shared";
pub const SENSOR_CHANNEL: &str = "sensor_channel";
pub const DATALOGGER_CHANNEL: &str = "datalogger_channel";
pub const CLOCK_SERIAL_NUMBER: &str = "clock_serial_number";
pub const SENSOR_ID: &str = "sensor_id";
pub const DATALOGGER_ID: &str = "datalogger_id";
pub const SENSOR_SERIAL_NUMBER_STREAM: &str = "sensor_serial_number_stream";
pub const DATALOGGER_SERIAL_NUMBER_STREAM: &str = "datalogger_serial_number_stream";
pub const SENSOR_SERIAL_NUMBER: &str = "sensor_serial_number";
pub const DATALOGGER_SERIAL_NUMBER: &str = "datalogger_serial_number";
pub const STREAM_COMMENTS: &str = "stream_comments";

pub const STREAM_COLUMNS: &[&str] = &[
    STREAM_START,
    STREAM_END,
    EFFECTIVE_START,
    EFFECTIVE_END,
    DEPTH,
    AZIMUTH,
    DIP,
    SAMPLE_RATE_NUMERATOR,
    SAMPLE_RATE_DENOMINATOR,
    SAMPLE_RATE,
    GAIN,
    GAIN_FREQUENCY,
    GAIN_UNIT,
    FORMAT,
    FLAGS,
    RESTRICTED,
    SHARED,
    SENSOR_CHANNEL,
    DATALOGGER_CHANNEL,
    CLOCK_SERIAL_NUMBER,
    SENSOR_ID,
    DATALOGGER_ID,
    SENSOR_SERIAL_NUMBER_STREAM,
    DATALOGGER_SERIAL_NUMBER_STREAM,
    SENSOR_SERIAL_NUMBER,
    DATALOGGER_SERIAL_NUMBER,
    STREAM_COMMENTS,
];

pub const SENSOR_NAME: &str = "sensor_name";
pub const SENSOR_DESCRIPTION: &str = "sensor_description";
pub const SENSOR_MANUFACTURER: &str = "sensor_manufacturer";
pub const SENSOR_MODEL: &str = "sensor_model";
pub const SENSOR_TYPE: &str = "sensor_type";
pub const SENSOR_UNIT: &str = "sensor_unit";
pub const SENSOR_REMARK: &str = "sensor_remark";
pub const SENSOR_SERIAL_NUMBER_EQUIPMENT: &str = "sensor_serial_number_equipment";
pub const SENSOR_RESPONSE: &str = "sensor_response";

pub const SENSOR_COLUMNS: &[&str] = &[
    SENSOR_NAME,
    SENSOR_DESCRIPTION,
    SENSOR_MANUFACTURER,
    SENSOR_MODEL,
    SENSOR_TYPE,
    SENSOR_UNIT,
    SENSOR_REMARK,
    SENSOR_SERIAL_NUMBER_EQUIPMENT,
    SENSOR_RESPONSE,
];

pub const DATALOGGER_NAME: &str = "datalogger_name";
pub const DATALOGGER_DESCRIPTION: &str = "datalogger_description";
pub const DATALOGGER_MANUFACTURER: &str = "datalogger_manufacturer";
pub const DATALOGGER_MODEL: &str = "datalogger_model";
pub const DATALOGGER_TYPE: &str = "datalogger_type";
pub const DATALOGGER_REMARK: &str = "datalogger_remark";
pub const DATALOGGER_GAIN: &str = "datalogger_gain";
pub const DATALOGGER_MAX_CLOCK_DRIFT: &str = "datalogger_max_clock_drift";
pub const DATALOGGER_CLOCK_MODEL: &str = "datalogger_clock_model";
pub const DATALOGGER_SERIAL_NUMBER_EQUIPMENT: &str = "datalogger_serial_number_equipment";
pub const DECIMATION_INFO: &str = "decimation_info";

pub const DATALOGGER_COLUMNS: &[&str] = &[
    DATALOGGER_NAME,
    DATALOGGER_DESCRIPTION,
    DATALOGGER_MANUFACTURER,
    DATALOGGER_MODEL,
    DATALOGGER_TYPE,
    DATALOGGER_REMARK,
    DATALOGGER_GAIN,
    DATALOGGER_MAX_CLOCK_DRIFT,
    DATALOGGER_CLOCK_MODEL,
    DATALOGGER_SERIAL_NUMBER_EQUIPMENT,
    DECIMATION_INFO,
];

pub const DECIMATION_SAMPLE_RATE: &str = "decimation_sample_rate";
pub const DECIMATION_ANALOGUE_CHAIN: &str = "decimation_analogue_filter_chain";
pub const DECIMATION_DIGITAL_CHAIN: &str = "decimation_digital_filter_chain";
pub const DECIMATION_STAGE_COUNT: &str = "decimation_stage_count";
pub const DECIMATION_STAGE_KINDS: &str = "decimation_stage_kinds";
pub const DECIMATION_STAGE_GAIN: &str = "decimation_stage_gain";
pub const DECIMATION_TOTAL_FACTOR: &str = "decimation_total_factor";

pub const DECIMATION_COLUMNS: &[&str] = &[
    DECIMATION_SAMPLE_RATE,
    DECIMATION_ANALOGUE_CHAIN,
    DECIMATION_DIGITAL_CHAIN,
    DECIMATION_STAGE_COUNT,
    DECIMATION_STAGE_KINDS,
    DECIMATION_STAGE_GAIN,
    DECIMATION_TOTAL_FACTOR,
];

/// Column names for one resolved response, shared by the sensor response and
/// the final datalogger filter stage.
#[derive(Debug, Clone, Copy)]
pub struct ResponseColumns {
    pub kind: &'static str,
    pub name: &'static str,
    pub gain: &'static str,
    pub gain_frequency: &'static str,
    pub paz_type: &'static str,
    pub normalization_factor: &'static str,
    pub normalization_frequency: &'static str,
    pub number_of_poles: &'static str,
    pub number_of_zeros: &'static str,
    pub decimation_factor: &'static str,
    pub delay: &'static str,
    pub correction: &'static str,
    pub symmetry: &'static str,
    pub number_of_coefficients: &'static str,
    pub iir_type: &'static str,
    pub number_of_numerators: &'static str,
    pub number_of_denominators: &'static str,
    pub frequency_unit: &'static str,
    pub approximation_type: &'static str,
    pub approximation_lower_bound: &'static str,
    pub approximation_upper_bound: &'static str,
    pub approximation_error: &'static str,
}

impl ResponseColumns {
    pub fn all(&self) -> [&'static str; 22] {
        [
            self.kind,
            self.name,
            self.gain,
            self.gain_frequency,
            self.paz_type,
            self.normalization_factor,
            self.normalization_frequency,
            self.number_of_poles,
            self.number_of_zeros,
            self.decimation_factor,
            self.delay,
            self.correction,
            self.symmetry,
            self.number_of_coefficients,
            self.iir_type,
            self.number_of_numerators,
            self.number_of_denominators,
            self.frequency_unit,
            self.approximation_type,
            self.approximation_lower_bound,
            self.approximation_upper_bound,
            self.approximation_error,
        ]
    }
}

macro_rules! response_columns {
    ($prefix:literal) => {
        ResponseColumns {
            kind: concat!($prefix, "_kind"),
            name: concat!($prefix, "_name"),
            gain: concat!($prefix, "_gain"),
            gain_frequency: concat!($prefix, "_gain_frequency"),
            paz_type: concat!($prefix, "_paz_type"),
            normalization_factor: concat!($prefix, "_normalization_factor"),
            normalization_frequency: concat!($prefix, "_normalization_frequency"),
            number_of_poles: concat!($prefix, "_number_of_poles"),
            number_of_zeros: concat!($prefix, "_number_of_zeros"),
            decimation_factor: concat!($prefix, "_decimation_factor"),
            delay: concat!($prefix, "_delay"),
            correction: concat!($prefix, "_correction"),
            symmetry: concat!($prefix, "_symmetry"),
            number_of_coefficients: concat!($prefix, "_number_of_coefficients"),
            iir_type: concat!($prefix, "_iir_type"),
            number_of_numerators: concat!($prefix, "_number_of_numerators"),
            number_of_denominators: concat!($prefix, "_number_of_denominators"),
            frequency_unit: concat!($prefix, "_frequency_unit"),
            approximation_type: concat!($prefix, "_approximation_type"),
            approximation_lower_bound: concat!($prefix, "_approximation_lower_bound"),
            approximation_upper_bound: concat!($prefix, "_approximation_upper_bound"),
            approximation_error: concat!($prefix, "_approximation_error"),
        }
    };
}

pub const SENSOR_RESPONSE_COLUMNS: ResponseColumns = response_columns!("sensor_response");
pub const DATALOGGER_RESPONSE_COLUMNS: ResponseColumns = response_columns!("datalogger_response");

/// Columns present on every record, in canonical order.
pub fn always_present_columns() -> impl Iterator<Item = &'static str> {
    IDENTITY_COLUMNS
        .iter()
        .chain(NETWORK_COLUMNS)
        .chain(STATION_COLUMNS)
        .chain(LOCATION_COLUMNS)
        .chain(STREAM_COLUMNS)
        .chain(SENSOR_COLUMNS)
        .chain(DATALOGGER_COLUMNS)
        .copied()
}

/// Every known column in canonical order.
pub fn canonical_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = IDENTITY_COLUMNS
        .iter()
        .chain(NETWORK_COLUMNS)
        .chain(STATION_COLUMNS)
        .chain(LOCATION_COLUMNS)
        .chain(STREAM_COLUMNS)
        .chain(SENSOR_COLUMNS)
        .copied()
        .collect();
    columns.extend(SENSOR_RESPONSE_COLUMNS.all());
    columns.extend_from_slice(DATALOGGER_COLUMNS);
    columns.extend_from_slice(DECIMATION_COLUMNS);
    columns.extend(DATALOGGER_RESPONSE_COLUMNS.all());
    columns
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn canonical_columns_are_unique() {
        let columns = canonical_columns();
        let unique: HashSet<&str> = columns.iter().copied().collect();
        assert_eq!(unique.len(), columns.len());
    }

    #[test]
    fn always_present_columns_follow_canonical_order() {
        let always: HashSet<&str> = always_present_columns().collect();
        let filtered: Vec<&str> = canonical_columns()
            .into_iter()
            .filter(|column| always.contains(column))
            .collect();
        assert_eq!(filtered, always_present_columns().collect::<Vec<_>>());
    }

    #[test]
    fn identity_columns_lead() {
        let columns = canonical_columns();
        assert_eq!(&columns[..4], IDENTITY_COLUMNS);
    }
}
