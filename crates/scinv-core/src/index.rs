use std::collections::HashMap;

use scinv_parser::{Datalogger, Inventory, Response, Sensor};
use tracing::debug;

/// Identifier lookups over the equipment declared at the top of an inventory.
/// Definitions stay owned by the inventory; the index only borrows them.
#[derive(Debug, Default)]
pub struct EquipmentIndex<'a> {
    sensors: HashMap<&'a str, &'a Sensor>,
    dataloggers: HashMap<&'a str, &'a Datalogger>,
    responses: HashMap<&'a str, &'a Response>,
    redeclared: usize,
}

impl<'a> EquipmentIndex<'a> {
    pub fn sensor(&self, id: &str) -> Option<&'a Sensor> {
        self.sensors.get(id).copied()
    }

    pub fn datalogger(&self, id: &str) -> Option<&'a Datalogger> {
        self.dataloggers.get(id).copied()
    }

    pub fn response(&self, id: &str) -> Option<&'a Response> {
        self.responses.get(id).copied()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn datalogger_count(&self) -> usize {
        self.dataloggers.len()
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    /// Number of declarations that replaced an earlier one with the same id.
    pub fn redeclared(&self) -> usize {
        self.redeclared
    }
}

/// Indexes sensors, dataloggers and responses by public id. A later
/// declaration with an id already seen replaces the earlier one.
pub fn build_equipment_index(inventory: &Inventory) -> EquipmentIndex<'_> {
    let mut index = EquipmentIndex::default();

    for sensor in &inventory.sensors {
        if index.sensors.insert(&sensor.public_id, sensor).is_some() {
            debug!(id = %sensor.public_id, "sensor redeclared; keeping later definition");
            index.redeclared += 1;
        }
    }

    for datalogger in &inventory.dataloggers {
        if index
            .dataloggers
            .insert(&datalogger.public_id, datalogger)
            .is_some()
        {
            debug!(id = %datalogger.public_id, "datalogger redeclared; keeping later definition");
            index.redeclared += 1;
        }
    }

    for response in &inventory.responses {
        if index
            .responses
            .insert(&response.public_id, response)
            .is_some()
        {
            debug!(id = %response.public_id, kind = %response.kind(), "response redeclared; keeping later definition");
            index.redeclared += 1;
        }
    }

    debug!(
        sensors = index.sensor_count(),
        dataloggers = index.datalogger_count(),
        responses = index.response_count(),
        redeclared = index.redeclared,
        "built equipment index"
    );

    index
}
