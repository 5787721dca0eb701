use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::InventoryError;
use crate::model::{
    Datalogger, Decimation, Inventory, Network, ResponseKind, Sensor, SensorLocation, Station,
    Stream, Timestamp, Validity,
};
use crate::responses::parse_response;
use crate::xml::{parse_document, XmlElement};

const INVENTORY: &str = "Inventory";

/// Reads and parses the inventory document at `path`.
pub fn parse_inventory_file(path: impl AsRef<Path>) -> Result<Inventory, InventoryError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => InventoryError::NotFound {
            path: path.to_path_buf(),
        },
        _ => InventoryError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    debug!(path = %path.display(), bytes = content.len(), "read inventory document");
    parse_inventory_str(&content)
}

pub fn parse_inventory_str(content: &str) -> Result<Inventory, InventoryError> {
    let document = parse_document(content)?;

    let inventory = if document.name == INVENTORY {
        &document
    } else {
        document
            .child(INVENTORY)
            .ok_or_else(|| InventoryError::MissingInventory {
                root: document.name.clone(),
            })?
    };

    let mut parsed = Inventory {
        schema_version: document.owned_value("version"),
        ..Inventory::default()
    };

    for element in &inventory.children {
        match element.name.as_str() {
            "sensor" => parsed.sensors.push(parse_sensor(element)),
            "datalogger" => parsed.dataloggers.push(parse_datalogger(element)),
            "network" => parsed.networks.push(parse_network(element)),
            other => {
                if let Some(kind) = ResponseKind::from_element_name(other) {
                    parsed.responses.push(parse_response(element, kind));
                }
            }
        }
    }

    debug!(
        networks = parsed.networks.len(),
        sensors = parsed.sensors.len(),
        dataloggers = parsed.dataloggers.len(),
        responses = parsed.responses.len(),
        streams = parsed.stream_count(),
        "parsed inventory"
    );

    Ok(parsed)
}

pub(crate) fn public_id(element: &XmlElement) -> String {
    element.owned_value("publicID").unwrap_or_default()
}

fn code(element: &XmlElement) -> String {
    element.owned_value("code").unwrap_or_default()
}

fn validity(element: &XmlElement) -> Validity {
    Validity {
        start: timestamp(element, "start"),
        end: timestamp(element, "end"),
    }
}

fn timestamp(element: &XmlElement, field: &str) -> Option<Timestamp> {
    let raw = element.value(field)?;
    let parsed = Timestamp::parse(raw);
    if parsed.instant().is_none() {
        warn!(
            element = %element.name,
            code = element.value("code").unwrap_or_default(),
            field,
            value = raw,
            "unrecognized timestamp; keeping raw text"
        );
    }
    Some(parsed)
}

fn parse_sensor(element: &XmlElement) -> Sensor {
    Sensor {
        public_id: public_id(element),
        name: element.owned_value("name"),
        description: element.owned_value("description"),
        manufacturer: element.owned_value("manufacturer"),
        model: element.owned_value("model"),
        sensor_type: element.owned_value("type"),
        unit: element.owned_value("unit"),
        remark: element.owned_value("remark"),
        serial_number: element.owned_value("serialNumber"),
        response: element.owned_value("response"),
    }
}

fn parse_datalogger(element: &XmlElement) -> Datalogger {
    Datalogger {
        public_id: public_id(element),
        name: element.owned_value("name"),
        description: element.owned_value("description"),
        manufacturer: element
            .owned_value("digitizerManufacturer")
            .or_else(|| element.owned_value("manufacturer")),
        model: element
            .owned_value("digitizerModel")
            .or_else(|| element.owned_value("model")),
        datalogger_type: element.owned_value("type"),
        remark: element.owned_value("remark"),
        serial_number: element.owned_value("serialNumber"),
        gain: element.owned_value("gain"),
        max_clock_drift: element.owned_value("maxClockDrift"),
        clock_model: element.owned_value("clockModel"),
        decimations: element
            .children_named("decimation")
            .map(parse_decimation)
            .collect(),
    }
}

fn parse_decimation(element: &XmlElement) -> Decimation {
    Decimation {
        sample_rate_numerator: element.owned_value("sampleRateNumerator"),
        sample_rate_denominator: element.owned_value("sampleRateDenominator"),
        analogue_filter_chain: filter_chain(element, "analogueFilterChain"),
        digital_filter_chain: filter_chain(element, "digitalFilterChain"),
    }
}

fn filter_chain(element: &XmlElement, field: &str) -> Vec<String> {
    element
        .value(field)
        .map(|chain| chain.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn parse_network(element: &XmlElement) -> Network {
    let code = code(element);
    let stations = element
        .children_named("station")
        .map(|station| parse_station(station, &code))
        .collect();

    Network {
        description: element.owned_value("description"),
        region: element.owned_value("region"),
        network_type: element.owned_value("type"),
        validity: validity(element),
        stations,
        code,
    }
}

fn parse_station(element: &XmlElement, network_code: &str) -> Station {
    Station {
        code: code(element),
        network_code: network_code.to_string(),
        description: element.owned_value("description"),
        latitude: element.owned_value("latitude"),
        longitude: element.owned_value("longitude"),
        elevation: element.owned_value("elevation"),
        place: element.owned_value("place"),
        country: element.owned_value("country"),
        validity: validity(element),
        locations: element
            .children_named("sensorLocation")
            .map(parse_location)
            .collect(),
    }
}

fn parse_location(element: &XmlElement) -> SensorLocation {
    SensorLocation {
        code: code(element),
        latitude: element.owned_value("latitude"),
        longitude: element.owned_value("longitude"),
        elevation: element.owned_value("elevation"),
        validity: validity(element),
        streams: element.children_named("stream").map(parse_stream).collect(),
    }
}

fn parse_stream(element: &XmlElement) -> Stream {
    Stream {
        code: code(element),
        validity: validity(element),
        depth: element.owned_value("depth"),
        azimuth: element.owned_value("azimuth"),
        dip: element.owned_value("dip"),
        gain: element.owned_value("gain"),
        gain_frequency: element.owned_value("gainFrequency"),
        gain_unit: element.owned_value("gainUnit"),
        format: element.owned_value("format"),
        flags: element.owned_value("flags"),
        restricted: element.owned_value("restricted"),
        shared: element.owned_value("shared"),
        sensor: element.owned_value("sensor"),
        datalogger: element.owned_value("datalogger"),
        sensor_serial_number: element.owned_value("sensorSerialNumber"),
        datalogger_serial_number: element.owned_value("dataloggerSerialNumber"),
        sensor_channel: element.owned_value("sensorChannel"),
        datalogger_channel: element.owned_value("dataloggerChannel"),
        clock_serial_number: element.owned_value("clockSerialNumber"),
        sample_rate_numerator: element.owned_value("sampleRateNumerator"),
        sample_rate_denominator: element.owned_value("sampleRateDenominator"),
        comments: element
            .children_named("comment")
            .filter_map(|comment| comment.owned_value("text"))
            .collect(),
    }
}
