use tracing::warn;

use crate::inventory::public_id;
use crate::model::{
    Complex, FirParameters, IirParameters, PazParameters, PolynomialParameters, Response,
    ResponseKind, ResponseParameters,
};
use crate::xml::XmlElement;

/// Counts and list tokens that do not parse are logged at `warn` and left out.
pub(crate) fn parse_response(element: &XmlElement, kind: ResponseKind) -> Response {
    let public_id = public_id(element);
    let field = Field {
        element,
        kind,
        public_id: &public_id,
    };

    let parameters = match kind {
        ResponseKind::Paz => ResponseParameters::Paz(PazParameters {
            transfer_function_type: element.owned_value("type"),
            normalization_factor: element.owned_value("normalizationFactor"),
            normalization_frequency: element.owned_value("normalizationFrequency"),
            number_of_poles: field.count("numberOfPoles"),
            number_of_zeros: field.count("numberOfZeros"),
            poles: field.complexes("poles"),
            zeros: field.complexes("zeros"),
        }),
        ResponseKind::Fir => ResponseParameters::Fir(FirParameters {
            decimation_factor: element.owned_value("decimationFactor"),
            delay: element.owned_value("delay"),
            correction: element.owned_value("correction"),
            symmetry: element.owned_value("symmetry"),
            number_of_coefficients: field.count("numberOfCoefficients"),
            coefficients: field.floats("coefficients"),
        }),
        ResponseKind::Iir => ResponseParameters::Iir(IirParameters {
            transfer_function_type: element.owned_value("type"),
            decimation_factor: element.owned_value("decimationFactor"),
            delay: element.owned_value("delay"),
            correction: element.owned_value("correction"),
            number_of_numerators: field.count("numberOfNumerators"),
            number_of_denominators: field.count("numberOfDenominators"),
            numerators: field.floats("numerators"),
            denominators: field.floats("denominators"),
        }),
        ResponseKind::Polynomial => ResponseParameters::Polynomial(PolynomialParameters {
            frequency_unit: element.owned_value("frequencyUnit"),
            approximation_type: element.owned_value("approximationType"),
            approximation_lower_bound: element.owned_value("approximationLowerBound"),
            approximation_upper_bound: element.owned_value("approximationUpperBound"),
            approximation_error: element.owned_value("approximationError"),
            number_of_coefficients: field.count("numberOfCoefficients"),
            coefficients: field.floats("coefficients"),
        }),
    };

    Response {
        name: element.owned_value("name"),
        gain: element.owned_value("gain"),
        gain_frequency: element.owned_value("gainFrequency"),
        parameters,
        public_id,
    }
}

struct Field<'a> {
    element: &'a XmlElement,
    kind: ResponseKind,
    public_id: &'a str,
}

impl Field<'_> {
    fn skip(&self, name: &str, token: &str, reason: &str) {
        warn!(
            element = self.kind.element_name(),
            public_id = self.public_id,
            field = name,
            token,
            reason,
            "ignoring unparseable response value"
        );
    }

    fn count(&self, name: &str) -> Option<usize> {
        let raw = self.element.value(name)?;
        match raw.parse::<usize>() {
            Ok(value) => Some(value),
            Err(err) => {
                self.skip(name, raw, &err.to_string());
                None
            }
        }
    }

    fn floats(&self, name: &str) -> Vec<f64> {
        let Some(raw) = self.element.value(name) else {
            return Vec::new();
        };

        raw.split_whitespace()
            .filter_map(|token| match token.parse::<f64>() {
                Ok(value) => Some(value),
                Err(err) => {
                    self.skip(name, token, &err.to_string());
                    None
                }
            })
            .collect()
    }

    /// `(re,im) (re,im) ...` as written for poles and zeros.
    fn complexes(&self, name: &str) -> Vec<Complex> {
        let Some(raw) = self.element.value(name) else {
            return Vec::new();
        };

        raw.split(')')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .filter_map(|piece| match parse_complex(piece) {
                Ok(value) => Some(value),
                Err(reason) => {
                    self.skip(name, piece, reason);
                    None
                }
            })
            .collect()
    }
}

fn parse_complex(piece: &str) -> Result<Complex, &'static str> {
    let inner = piece
        .strip_prefix('(')
        .ok_or("expected '(' before complex value")?;
    let (real, imaginary) = inner
        .split_once(',')
        .ok_or("expected 'real,imaginary' pair")?;
    let real = real.trim().parse::<f64>().map_err(|_| "invalid real part")?;
    let imaginary = imaginary
        .trim()
        .parse::<f64>()
        .map_err(|_| "invalid imaginary part")?;
    Ok(Complex { real, imaginary })
}
