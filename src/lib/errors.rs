use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize)]
pub enum Error {
    InvalidInputPath(String),
    InvalidInputFile(String),
    InputReadFailure,
    InvalidJson(JsonError),
    ObservationIntegrity(IntegrityError),
    UnimplementedStrategy(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub description: String,
    pub category: String,
    pub line: usize,
    pub column: usize,
}

/// The combined dataset must hold exactly one latest record per
/// (aggregation level, fips) pair; any other count is a fault in the
/// dataset itself, not a missing observation.
#[derive(Debug, Serialize, Deserialize)]
pub struct IntegrityError {
    pub fips: String,
    pub aggregation_level: String,
    pub n_records: usize,
}

impl From<serde_json::error::Error> for Error {
    fn from(e: serde_json::error::Error) -> Self {
        Self::InvalidJson(JsonError {
            description: format!("{}", e),
            category: format!("{:?}", e.classify()),
            line: e.line(),
            column: e.column(),
        })
    }
}
