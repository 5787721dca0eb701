pub mod errors;
pub mod inventory;
pub mod model;
mod responses;
pub mod xml;

pub use errors::InventoryError;
pub use inventory::{parse_inventory_file, parse_inventory_str};
pub use model::{
    Complex, Datalogger, Decimation, FirParameters, IirParameters, Inventory, Network,
    PazParameters, PolynomialParameters, Response, ResponseKind, ResponseParameters, SampleRate,
    Sensor, SensorLocation, Station, Stream, Timestamp, Validity,
};
