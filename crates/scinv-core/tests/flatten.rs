use std::path::PathBuf;

use scinv_core::{build_equipment_index, flatten, schema, FlatRecord, ReferenceKind};
use scinv_parser::{parse_inventory_file, Decimation, Inventory};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../scinv-parser/tests/data")
        .join(name)
}

fn load(name: &str) -> Inventory {
    parse_inventory_file(fixture_path(name)).expect("parse failed")
}

fn find<'r>(records: &'r [FlatRecord], path: [&str; 4]) -> &'r FlatRecord {
    records
        .iter()
        .find(|record| {
            record.get(schema::NETWORK) == Some(path[0])
                && record.get(schema::STATION) == Some(path[1])
                && record.get(schema::LOCATION) == Some(path[2])
                && record.get(schema::CHANNEL) == Some(path[3])
        })
        .unwrap_or_else(|| panic!("no record for {}", path.join("/")))
}

#[test]
fn emits_one_record_per_stream() {
    for name in ["single_stream.xml", "multi_network.xml", "empty_inventory.xml"] {
        let inventory = load(name);
        let index = build_equipment_index(&inventory);
        let mut flattener = flatten(&inventory, &index);
        let records: Vec<FlatRecord> = flattener.by_ref().collect();

        assert_eq!(records.len(), inventory.stream_count(), "fixture {name}");
        assert_eq!(flattener.report().streams, inventory.stream_count());
    }
}

#[test]
fn single_stream_resolves_all_equipment() {
    let inventory = load("single_stream.xml");
    let index = build_equipment_index(&inventory);
    let mut flattener = flatten(&inventory, &index);
    let records: Vec<FlatRecord> = flattener.by_ref().collect();
    let report = flattener.into_report();

    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.get(schema::NETWORK), Some("XX"));
    assert_eq!(record.get(schema::STATION), Some("AAA"));
    assert_eq!(record.get(schema::LOCATION), Some("00"));
    assert_eq!(record.get(schema::CHANNEL), Some("BHZ"));

    assert_eq!(record.get(schema::SENSOR_NAME), Some("STS-2"));
    assert_eq!(record.get(schema::SENSOR_MANUFACTURER), Some("Streckeisen"));
    assert_eq!(record.get(schema::SENSOR_MODEL), Some("STS-2"));
    assert_eq!(record.get(schema::SENSOR_TYPE), Some("VBB"));
    assert_eq!(record.get(schema::SENSOR_SERIAL_NUMBER_EQUIPMENT), Some("49321"));
    assert_eq!(record.get(schema::SENSOR_SERIAL_NUMBER), Some("49321"));

    assert_eq!(record.get(schema::DATALOGGER_MANUFACTURER), Some("Quanterra"));
    assert_eq!(record.get(schema::DATALOGGER_MODEL), Some("Q330"));
    assert_eq!(record.get(schema::DATALOGGER_SERIAL_NUMBER), Some("5071"));
    assert_eq!(record.get(schema::DATALOGGER_MAX_CLOCK_DRIFT), Some("0.0001"));
    assert_eq!(record.get(schema::DATALOGGER_CLOCK_MODEL), Some("GPS"));

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.sensors_referenced.len(), 1);
    assert_eq!(report.dataloggers_referenced.len(), 1);
}

#[test]
fn stream_columns_and_derived_values() {
    let inventory = load("single_stream.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();
    let record = &records[0];

    assert_eq!(record.get(schema::SAMPLE_RATE), Some("20"));
    assert_eq!(record.get(schema::DIP), Some("-90"));
    assert_eq!(record.get(schema::GAIN), Some("6.2915e+08"));
    assert_eq!(
        record.get(schema::STREAM_COMMENTS),
        Some("vault re-leveled; GPS replaced")
    );
    assert_eq!(record.get(schema::STREAM_START), Some("2010-06-01T00:00:00.0000Z"));
    assert_eq!(record.get(schema::STREAM_END), Some(""));
    assert_eq!(record.get(schema::EFFECTIVE_START), Some("2010-06-01T00:00:00Z"));
    assert_eq!(record.get(schema::EFFECTIVE_END), Some("2020-01-01T00:00:00Z"));
}

#[test]
fn sensor_response_columns_follow_response_kind() {
    let inventory = load("single_stream.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();
    let record = &records[0];
    let columns = schema::SENSOR_RESPONSE_COLUMNS;

    assert_eq!(record.get(columns.kind), Some("PAZ"));
    assert_eq!(record.get(columns.gain), Some("1500"));
    assert_eq!(record.get(columns.number_of_poles), Some("3"));
    assert_eq!(record.get(columns.number_of_zeros), Some("2"));
    assert_eq!(record.get(columns.normalization_factor), Some("3.48e+17"));
    assert!(!record.contains(columns.number_of_coefficients));
    assert!(!record.contains(columns.approximation_type));
}

#[test]
fn decimation_matching_stream_rate_is_summarized() {
    let inventory = load("single_stream.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();
    let record = &records[0];

    assert_eq!(record.get(schema::DECIMATION_SAMPLE_RATE), Some("20"));
    assert_eq!(record.get(schema::DECIMATION_ANALOGUE_CHAIN), Some("PAZ_PREAMP"));
    assert_eq!(record.get(schema::DECIMATION_DIGITAL_CHAIN), Some("FIR1 FIR2"));
    assert_eq!(record.get(schema::DECIMATION_STAGE_COUNT), Some("3"));
    assert_eq!(record.get(schema::DECIMATION_STAGE_KINDS), Some("PAZ;FIR;FIR"));
    assert_eq!(record.get(schema::DECIMATION_STAGE_GAIN), Some("2"));
    assert_eq!(record.get(schema::DECIMATION_TOTAL_FACTOR), Some("10"));

    let columns = schema::DATALOGGER_RESPONSE_COLUMNS;
    assert_eq!(record.get(columns.kind), Some("FIR"));
    assert_eq!(record.get(columns.name), Some("Q330 FIR stage 2"));
    assert_eq!(record.get(columns.decimation_factor), Some("2"));
    assert_eq!(record.get(columns.number_of_coefficients), Some("3"));
    assert_eq!(record.get(columns.symmetry), Some("B"));

    let info = record.get(schema::DECIMATION_INFO).expect("decimation info");
    let decimations: Vec<Decimation> = serde_json::from_str(info).expect("valid json");
    assert_eq!(decimations.len(), 2);
    assert_eq!(decimations[1].digital_filter_chain, vec!["FIR1", "FIR2"]);
}

#[test]
fn unresolved_sensor_leaves_sensor_columns_empty() {
    let inventory = load("unresolved_sensor.xml");
    let index = build_equipment_index(&inventory);
    let mut flattener = flatten(&inventory, &index);
    let records: Vec<FlatRecord> = flattener.by_ref().collect();
    let report = flattener.into_report();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    for column in schema::SENSOR_COLUMNS {
        assert_eq!(record.get(column), Some(""), "{column} should be present and empty");
    }
    assert!(!record.contains(schema::SENSOR_RESPONSE_COLUMNS.kind));
    assert_eq!(record.get(schema::SENSOR_ID), Some("SENS_MISSING"));
    assert_eq!(record.get(schema::SENSOR_SERIAL_NUMBER), Some(""));
    assert_eq!(record.get(schema::DATALOGGER_MODEL), Some("Q330"));

    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, ReferenceKind::Sensor);
    assert_eq!(diagnostic.identifier, "SENS_MISSING");
    assert_eq!(diagnostic.stream.to_string(), "XX/AAA/00/BHZ");
    assert!(report.sensors_referenced.is_empty());
}

#[test]
fn duplicate_sensor_resolves_to_last_declaration() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    let record = find(&records, ["GE", "S1", "", "HHZ"]);
    assert_eq!(record.get(schema::SENSOR_MODEL), Some("NEW"));
    assert_eq!(record.get(schema::SENSOR_NAME), Some("second declaration"));
    assert_eq!(record.get(schema::SENSOR_TYPE), Some("BB"));
}

#[test]
fn ancestor_columns_are_shared_across_siblings() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    let station_rows: Vec<&FlatRecord> = records
        .iter()
        .filter(|r| r.get(schema::NETWORK) == Some("GE") && r.get(schema::STATION) == Some("S1"))
        .collect();
    assert_eq!(station_rows.len(), 3);
    for row in &station_rows {
        assert_eq!(row.get(schema::NETWORK_DESCRIPTION), Some("GEOFON"));
        assert_eq!(row.get(schema::STATION_LATITUDE), Some("10.0"));
        assert_eq!(row.get(schema::STATION_END), Some("2030-01-01T00:00:00Z"));
    }

    let hhz = find(&records, ["GE", "S1", "", "HHZ"]);
    let lhz = find(&records, ["GE", "S1", "10", "LHZ"]);
    assert_eq!(hhz.get(schema::LATITUDE), Some("10.001"));
    assert_eq!(lhz.get(schema::LATITUDE), Some(""));
    assert_eq!(lhz.get(schema::LOCATION_START), Some("2005-01-01T00:00:00Z"));
}

#[test]
fn records_follow_document_order() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let order: Vec<String> = flatten(&inventory, &index)
        .map(|r| {
            format!(
                "{}/{}/{}/{}",
                r.get(schema::NETWORK).unwrap_or_default(),
                r.get(schema::STATION).unwrap_or_default(),
                r.get(schema::LOCATION).unwrap_or_default(),
                r.get(schema::CHANNEL).unwrap_or_default()
            )
        })
        .collect();

    assert_eq!(
        order,
        vec![
            "GE/S1//HHZ",
            "GE/S1//HDF",
            "GE/S1/10/LHZ",
            "YY/S2/00/BHZ",
            "YY/S2/00/BHE"
        ]
    );
}

#[test]
fn stream_serial_numbers_take_precedence() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    let hhz = find(&records, ["GE", "S1", "", "HHZ"]);
    assert_eq!(hhz.get(schema::SENSOR_SERIAL_NUMBER_STREAM), Some("STREAM-SN"));
    assert_eq!(hhz.get(schema::SENSOR_SERIAL_NUMBER_EQUIPMENT), Some("EQ-SN"));
    assert_eq!(hhz.get(schema::SENSOR_SERIAL_NUMBER), Some("STREAM-SN"));
    assert_eq!(hhz.get(schema::DATALOGGER_SERIAL_NUMBER), Some("DL-EQ-SN"));

    let bhe = find(&records, ["YY", "S2", "00", "BHE"]);
    assert_eq!(bhe.get(schema::DATALOGGER_SERIAL_NUMBER), Some("DL-STREAM-SN"));
}

#[test]
fn polynomial_and_iir_responses_use_their_own_columns() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();
    let columns = schema::SENSOR_RESPONSE_COLUMNS;

    let hdf = find(&records, ["GE", "S1", "", "HDF"]);
    assert_eq!(hdf.get(columns.kind), Some("Polynomial"));
    assert_eq!(hdf.get(columns.approximation_type), Some("M"));
    assert_eq!(hdf.get(columns.approximation_upper_bound), Some("1100"));
    assert_eq!(hdf.get(columns.number_of_coefficients), Some("2"));
    assert!(!hdf.contains(columns.number_of_poles));

    let lhz = find(&records, ["GE", "S1", "10", "LHZ"]);
    assert_eq!(lhz.get(columns.kind), Some("IIR"));
    assert_eq!(lhz.get(columns.iir_type), Some("D"));
    assert_eq!(lhz.get(columns.number_of_numerators), Some("3"));
    assert_eq!(lhz.get(columns.number_of_denominators), Some("2"));
    assert!(!lhz.contains(columns.approximation_type));
}

#[test]
fn decimation_rates_compare_as_reduced_fractions() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    let hhz = find(&records, ["GE", "S1", "", "HHZ"]);
    assert_eq!(hhz.get(schema::DECIMATION_STAGE_KINDS), Some("FIR;IIR"));
    assert_eq!(hhz.get(schema::DECIMATION_STAGE_GAIN), Some("0.5"));
    assert_eq!(hhz.get(schema::DECIMATION_TOTAL_FACTOR), Some("4"));
    assert_eq!(
        hhz.get(schema::DATALOGGER_RESPONSE_COLUMNS.kind),
        Some("IIR")
    );

    let hdf = find(&records, ["GE", "S1", "", "HDF"]);
    assert!(hdf.contains(schema::DATALOGGER_MODEL));
    assert!(!hdf.contains(schema::DECIMATION_STAGE_KINDS));
}

#[test]
fn unresolved_filter_stage_is_reported() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    let bhz = find(&records, ["YY", "S2", "00", "BHZ"]);
    assert_eq!(bhz.get(schema::DECIMATION_STAGE_KINDS), Some("FIR;unresolved"));
    assert_eq!(bhz.get(schema::DECIMATION_STAGE_GAIN), Some(""));
    assert!(!bhz.contains(schema::DATALOGGER_RESPONSE_COLUMNS.kind));
    assert_eq!(bhz.get(schema::SENSOR_ID), Some(""));
    assert_eq!(bhz.get(schema::SENSOR_MODEL), Some(""));
    assert!(!bhz.contains(schema::SENSOR_RESPONSE_COLUMNS.kind));
}

#[test]
fn diagnostics_are_collected_in_document_order() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let mut flattener = flatten(&inventory, &index);
    let records: Vec<FlatRecord> = flattener.by_ref().collect();
    let report = flattener.into_report();

    assert_eq!(records.len(), 5);

    let summary: Vec<(ReferenceKind, &str, String)> = report
        .diagnostics
        .iter()
        .map(|d| (d.kind, d.identifier.as_str(), d.stream.to_string()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ReferenceKind::Datalogger, "DL_MISSING", "GE/S1/10/LHZ".to_string()),
            (ReferenceKind::FilterStage, "FIR_MISSING", "YY/S2/00/BHZ".to_string()),
            (ReferenceKind::SensorResponse, "RESP_MISSING", "YY/S2/00/BHE".to_string()),
            (ReferenceKind::FilterStage, "FIR_MISSING", "YY/S2/00/BHE".to_string()),
        ]
    );

    let lhz = find(&records, ["GE", "S1", "10", "LHZ"]);
    for column in schema::DATALOGGER_COLUMNS {
        assert_eq!(lhz.get(column), Some(""), "{column} should be present and empty");
    }
    assert!(!lhz.contains(schema::DECIMATION_STAGE_KINDS));
    assert_eq!(lhz.get(schema::DATALOGGER_ID), Some("DL_MISSING"));

    assert_eq!(report.sensors_referenced.len(), 4);
    assert_eq!(report.dataloggers_referenced.len(), 1);
}

#[test]
fn flattener_is_lazy() {
    let inventory = load("multi_network.xml");
    let index = build_equipment_index(&inventory);
    let mut flattener = flatten(&inventory, &index);

    let first_two: Vec<FlatRecord> = flattener.by_ref().take(2).collect();
    assert_eq!(first_two.len(), 2);
    assert_eq!(flattener.report().streams, 2);
    assert!(flattener.report().diagnostics.is_empty());

    assert_eq!(flattener.by_ref().count(), 3);
    assert!(flattener.next().is_none());
}

#[test]
fn unparseable_response_values_keep_the_stream() {
    let inventory = load("bad_response_values.xml");
    let index = build_equipment_index(&inventory);
    let records: Vec<FlatRecord> = flatten(&inventory, &index).collect();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    let sensor_response = schema::SENSOR_RESPONSE_COLUMNS;
    assert_eq!(record.get(sensor_response.kind), Some("PAZ"));
    assert_eq!(record.get(sensor_response.number_of_poles), Some("2"));

    let stage = schema::DATALOGGER_RESPONSE_COLUMNS;
    assert_eq!(record.get(stage.name), Some("damaged FIR"));
    assert_eq!(record.get(stage.number_of_coefficients), Some("1"));
    assert_eq!(record.get(schema::DECIMATION_TOTAL_FACTOR), Some("2"));
}
