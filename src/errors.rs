use std::error;
use std::fmt;

/// Errors raised while loading or validating a parameter document.
///
/// Any of these is fatal at load time: the engine refuses construction on
/// invalid input and never starts a run on bad data.
#[derive(Debug)]
pub enum ParamsError {
    /// A required table was empty.
    EmptyTable(&'static str),
    /// A rate table contained a negative value.
    NegativeRate {
        table: &'static str,
        index: usize,
        value: f64,
    },
    /// Natural and fishing mortality tables differ in length.
    MortalityLengthMismatch { natural: usize, fishing: usize },
    /// A migration matrix does not match the configured number of locations.
    DimensionMismatch {
        age: usize,
        expected: usize,
        found: usize,
    },
    /// A migration matrix row does not sum to 1 within tolerance.
    NonStochasticRow { age: usize, row: usize, sum: f64 },
    /// Recruitment coefficient was negative.
    InvalidRecruitment(f64),
    /// Finite overdispersion parameter k must be positive.
    InvalidOverdispersion(f64),
    /// The parameter document could not be parsed.
    Parse(String),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTable(name) => write!(f, "Empty table: {name}"),
            Self::NegativeRate {
                table,
                index,
                value,
            } => {
                write!(f, "Negative rate in {table}[{index}]: {value}")
            }
            Self::MortalityLengthMismatch { natural, fishing } => {
                write!(
                    f,
                    "Mortality table length mismatch: natural has {natural}, fishing has {fishing}"
                )
            }
            Self::DimensionMismatch {
                age,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Migration matrix for age {age} has dimension {found} (expected {expected})"
                )
            }
            Self::NonStochasticRow { age, row, sum } => {
                write!(
                    f,
                    "Migration matrix for age {age}, row {row} sums to {sum} (expected 1)"
                )
            }
            Self::InvalidRecruitment(value) => {
                write!(f, "Recruitment coefficient must be non-negative: {value}")
            }
            Self::InvalidOverdispersion(value) => {
                write!(f, "Overdispersion parameter k must be positive: {value}")
            }
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl error::Error for ParamsError {}

impl From<serde_json::Error> for ParamsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {e}"))
    }
}

impl From<std::io::Error> for ParamsError {
    fn from(e: std::io::Error) -> Self {
        Self::Parse(format!("IO error: {e}"))
    }
}
