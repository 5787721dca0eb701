use std::collections::BTreeMap;
use std::fmt;

/// Network/station/location/stream codes identifying one leaf stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamPath {
    pub network: String,
    pub station: String,
    pub location: String,
    pub stream: String,
}

impl fmt::Display for StreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.network, self.station, self.location, self.stream
        )
    }
}

/// One denormalized row. A column that is present but has no value holds an
/// empty string; an absent column was never populated for this row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    values: BTreeMap<&'static str, String>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<String>) {
        self.values.insert(column, value.into());
    }

    pub fn set_opt(&mut self, column: &'static str, value: Option<&str>) {
        self.set(column, value.unwrap_or_default());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}
