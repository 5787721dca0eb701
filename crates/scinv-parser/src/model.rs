use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validity timestamp as written in the document, plus its UTC instant when
/// the text could be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: Option<DateTime<Utc>>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let instant = parse_instant(&raw);
        Self { raw, instant }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.instant
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Start/end pair; an absent end means the interval is still open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl Validity {
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start.as_ref().and_then(Timestamp::instant)
    }

    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end.as_ref().and_then(Timestamp::instant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleRate {
    pub numerator: u64,
    pub denominator: u64,
}

impl SampleRate {
    pub fn from_parts(numerator: Option<&str>, denominator: Option<&str>) -> Option<Self> {
        let numerator = numerator?.trim().parse::<u64>().ok()?;
        let denominator = denominator?.trim().parse::<u64>().ok()?;
        (denominator != 0).then_some(Self {
            numerator,
            denominator,
        })
    }

    pub fn reduced(&self) -> Self {
        let divisor = gcd(self.numerator, self.denominator).max(1);
        Self {
            numerator: self.numerator / divisor,
            denominator: self.denominator / divisor,
        }
    }

    pub fn hertz(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub schema_version: Option<String>,
    pub sensors: Vec<Sensor>,
    pub dataloggers: Vec<Datalogger>,
    pub responses: Vec<Response>,
    pub networks: Vec<Network>,
}

impl Inventory {
    pub fn stream_count(&self) -> usize {
        self.networks
            .iter()
            .flat_map(|network| &network.stations)
            .flat_map(|station| &station.locations)
            .map(|location| location.streams.len())
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    pub code: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub network_type: Option<String>,
    pub validity: Validity,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Default)]
pub struct Station {
    pub code: String,
    pub network_code: String,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub elevation: Option<String>,
    pub place: Option<String>,
    pub country: Option<String>,
    pub validity: Validity,
    pub locations: Vec<SensorLocation>,
}

#[derive(Debug, Clone, Default)]
pub struct SensorLocation {
    pub code: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub elevation: Option<String>,
    pub validity: Validity,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, Default)]
pub struct Stream {
    pub code: String,
    pub validity: Validity,
    pub depth: Option<String>,
    pub azimuth: Option<String>,
    pub dip: Option<String>,
    pub gain: Option<String>,
    pub gain_frequency: Option<String>,
    pub gain_unit: Option<String>,
    pub format: Option<String>,
    pub flags: Option<String>,
    pub restricted: Option<String>,
    pub shared: Option<String>,
    pub sensor: Option<String>,
    pub datalogger: Option<String>,
    pub sensor_serial_number: Option<String>,
    pub datalogger_serial_number: Option<String>,
    pub sensor_channel: Option<String>,
    pub datalogger_channel: Option<String>,
    pub clock_serial_number: Option<String>,
    pub sample_rate_numerator: Option<String>,
    pub sample_rate_denominator: Option<String>,
    pub comments: Vec<String>,
}

impl Stream {
    pub fn sample_rate(&self) -> Option<SampleRate> {
        SampleRate::from_parts(
            self.sample_rate_numerator.as_deref(),
            self.sample_rate_denominator.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sensor {
    pub public_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sensor_type: Option<String>,
    pub unit: Option<String>,
    pub remark: Option<String>,
    pub serial_number: Option<String>,
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Datalogger {
    pub public_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub datalogger_type: Option<String>,
    pub remark: Option<String>,
    pub serial_number: Option<String>,
    pub gain: Option<String>,
    pub max_clock_drift: Option<String>,
    pub clock_model: Option<String>,
    pub decimations: Vec<Decimation>,
}

impl Datalogger {
    /// The decimation producing `rate`, compared as reduced fractions.
    pub fn decimation_for(&self, rate: SampleRate) -> Option<&Decimation> {
        let wanted = rate.reduced();
        self.decimations
            .iter()
            .find(|decimation| decimation.sample_rate().map(|r| r.reduced()) == Some(wanted))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decimation {
    pub sample_rate_numerator: Option<String>,
    pub sample_rate_denominator: Option<String>,
    pub analogue_filter_chain: Vec<String>,
    pub digital_filter_chain: Vec<String>,
}

impl Decimation {
    pub fn sample_rate(&self) -> Option<SampleRate> {
        SampleRate::from_parts(
            self.sample_rate_numerator.as_deref(),
            self.sample_rate_denominator.as_deref(),
        )
    }

    /// Analogue stages followed by digital stages.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.analogue_filter_chain
            .iter()
            .chain(&self.digital_filter_chain)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Paz,
    Fir,
    Iir,
    Polynomial,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 4] = [
        ResponseKind::Paz,
        ResponseKind::Fir,
        ResponseKind::Iir,
        ResponseKind::Polynomial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Paz => "PAZ",
            ResponseKind::Fir => "FIR",
            ResponseKind::Iir => "IIR",
            ResponseKind::Polynomial => "Polynomial",
        }
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            ResponseKind::Paz => "responsePAZ",
            ResponseKind::Fir => "responseFIR",
            ResponseKind::Iir => "responseIIR",
            ResponseKind::Polynomial => "responsePolynomial",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.element_name() == name)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub real: f64,
    pub imaginary: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub public_id: String,
    pub name: Option<String>,
    pub gain: Option<String>,
    pub gain_frequency: Option<String>,
    pub parameters: ResponseParameters,
}

impl Response {
    pub fn kind(&self) -> ResponseKind {
        match self.parameters {
            ResponseParameters::Paz(_) => ResponseKind::Paz,
            ResponseParameters::Fir(_) => ResponseKind::Fir,
            ResponseParameters::Iir(_) => ResponseKind::Iir,
            ResponseParameters::Polynomial(_) => ResponseKind::Polynomial,
        }
    }

    pub fn gain_value(&self) -> Option<f64> {
        self.gain.as_deref()?.trim().parse().ok()
    }

    /// Decimation factor of FIR and IIR stages; other kinds do not decimate.
    pub fn decimation_factor(&self) -> Option<u64> {
        let raw = match &self.parameters {
            ResponseParameters::Fir(fir) => fir.decimation_factor.as_deref(),
            ResponseParameters::Iir(iir) => iir.decimation_factor.as_deref(),
            _ => None,
        };
        raw?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseParameters {
    Paz(PazParameters),
    Fir(FirParameters),
    Iir(IirParameters),
    Polynomial(PolynomialParameters),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PazParameters {
    pub transfer_function_type: Option<String>,
    pub normalization_factor: Option<String>,
    pub normalization_frequency: Option<String>,
    pub number_of_poles: Option<usize>,
    pub number_of_zeros: Option<usize>,
    pub poles: Vec<Complex>,
    pub zeros: Vec<Complex>,
}

impl PazParameters {
    pub fn pole_count(&self) -> usize {
        self.number_of_poles.unwrap_or(self.poles.len())
    }

    pub fn zero_count(&self) -> usize {
        self.number_of_zeros.unwrap_or(self.zeros.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirParameters {
    pub decimation_factor: Option<String>,
    pub delay: Option<String>,
    pub correction: Option<String>,
    pub symmetry: Option<String>,
    pub number_of_coefficients: Option<usize>,
    pub coefficients: Vec<f64>,
}

impl FirParameters {
    pub fn coefficient_count(&self) -> usize {
        self.number_of_coefficients.unwrap_or(self.coefficients.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IirParameters {
    pub transfer_function_type: Option<String>,
    pub decimation_factor: Option<String>,
    pub delay: Option<String>,
    pub correction: Option<String>,
    pub number_of_numerators: Option<usize>,
    pub number_of_denominators: Option<usize>,
    pub numerators: Vec<f64>,
    pub denominators: Vec<f64>,
}

impl IirParameters {
    pub fn numerator_count(&self) -> usize {
        self.number_of_numerators.unwrap_or(self.numerators.len())
    }

    pub fn denominator_count(&self) -> usize {
        self.number_of_denominators
            .unwrap_or(self.denominators.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolynomialParameters {
    pub frequency_unit: Option<String>,
    pub approximation_type: Option<String>,
    pub approximation_lower_bound: Option<String>,
    pub approximation_upper_bound: Option<String>,
    pub approximation_error: Option<String>,
    pub number_of_coefficients: Option<usize>,
    pub coefficients: Vec<f64>,
}

impl PolynomialParameters {
    pub fn coefficient_count(&self) -> usize {
        self.number_of_coefficients.unwrap_or(self.coefficients.len())
    }
}
