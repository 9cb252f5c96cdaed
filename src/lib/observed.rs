use indoc::indoc;
use serde::{Serialize, Deserialize};

use crate::errors::{Error, IntegrityError};

const LATEST_SQL: &str = indoc!("
    SELECT current_hospitalized, current_icu FROM Latest
    WHERE aggregation_level = ? AND fips = ?;
");

/// Geographic granularity of a record in the combined dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationLevel {
    State,
    County,
}

impl AggregationLevel {
    // Two-character fips codes are states; everything else is assumed
    // to be a county. The dataset follows the same convention.
    pub fn for_fips(fips: &str) -> AggregationLevel {
        if fips.len() == 2 {
            AggregationLevel::State
        }
        else {
            AggregationLevel::County
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationLevel::State => "state",
            AggregationLevel::County => "county",
        }
    }
}

/// The latest observed hospitalization counts for one geographic entity.
/// Either field may be absent for a perfectly valid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedLatest {
    pub current_hospitalized: Option<f64>,
    pub current_icu: Option<f64>,
}

impl ObservedLatest {
    /// The dataset encodes absence inconsistently as SQL NULL in some
    /// vintages and as a floating-point NaN in others. Collapse both to
    /// `None` so policy code only ever branches on one kind of missing.
    pub fn normalized(&self) -> ObservedLatest {
        ObservedLatest {
            current_hospitalized: drop_nan(self.current_hospitalized),
            current_icu: drop_nan(self.current_icu),
        }
    }
}

fn drop_nan(value: Option<f64>) -> Option<f64> {
    match value {
        Some(x) if x.is_nan() => None,
        other => other,
    }
}

/// Fetch the single latest observation record for a fips code, at the
/// aggregation level implied by the code. Exactly one record must match:
/// zero or several means the dataset itself is inconsistent, which is
/// surfaced as an error rather than resolved by picking one.
pub fn get_latest_observed(
    conn: &rusqlite::Connection, fips: &str
) -> Result<ObservedLatest, Error> {
    let level = AggregationLevel::for_fips(fips);

    let mut statement = conn.prepare(LATEST_SQL).unwrap();
    let mut records: Vec<ObservedLatest> = statement.query_map(
        rusqlite::params![level.as_str(), fips],
        |row| {
            Ok(ObservedLatest {
                current_hospitalized: row.get(0)?,
                current_icu: row.get(1)?,
            })
        }
    ).unwrap().map(|r| r.unwrap()).collect();

    if records.len() != 1 {
        return Err(Error::ObservationIntegrity(IntegrityError {
            fips: fips.into(),
            aggregation_level: level.as_str().into(),
            n_records: records.len(),
        }));
    }

    Ok(records.remove(0))
}
