use log::warn;
use serde::{Serialize, Deserialize};

use crate::observed::ObservedLatest;

pub const UNITY_SCALING_FACTOR: f64 = 1.0;

/// Multiplicative factors converting model hospitalization counts to the
/// scale of the latest observed counts. The ratio counterpart of the
/// additive shim: multiply the model series instead of shifting it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactors {
    pub hospitalized: f64,
    pub icu: f64,
}

impl ConversionFactors {
    fn unity() -> ConversionFactors {
        ConversionFactors {
            hospitalized: UNITY_SCALING_FACTOR,
            icu: UNITY_SCALING_FACTOR,
        }
    }
}

/// Factors to convert model hospitalization and model ICU numbers to match
/// the most current observed values for a state.
///
/// In the model, acute and ICU hospitalization are disjoint compartments;
/// their sum is the comparable for observed total hospitalized. Missing or
/// zero observed values degrade to unity factors, so applying the result
/// is always safe.
pub fn model_to_observed_conversion_factors(
    model_acute_ts: &[f64],
    model_icu_ts: &[f64],
    idx: usize,
    observed_latest: &ObservedLatest,
) -> ConversionFactors {
    let observed = observed_latest.normalized();
    let model_acute = model_acute_ts[idx];
    let model_icu = model_icu_ts[idx];
    let model_heads_in_beds = model_acute + model_icu;

    let observed_hospitalized = match observed.current_hospitalized {
        None => {
            // No observed data available. Best we can do is pass unity.
            return ConversionFactors::unity();
        },
        Some(x) if x == 0.0 => {
            warn!("observed hospitalized was 0, cannot scale model outputs to latest observed");
            return ConversionFactors::unity();
        },
        Some(x) => x,
    };

    if model_heads_in_beds == 0.0 {
        warn!("model has no hospitalized individuals, cannot scale to latest observed");
        return ConversionFactors::unity();
    }

    let hospitalized_factor = observed_hospitalized / model_heads_in_beds;

    let icu_factor = match observed.current_icu {
        None => {
            // Observed hospitalizations but no observed ICU: scale ICU the
            // same as general hospitalization.
            hospitalized_factor
        },
        Some(x) if x == 0.0 => {
            warn!("observed ICU was 0, falling back on hospitalization factor");
            hospitalized_factor
        },
        Some(_) if model_icu == 0.0 => {
            warn!("model ICU is empty, falling back on hospitalization factor");
            hospitalized_factor
        },
        Some(observed_icu) => {
            // Impose the location-specific ICU ratio instead of the
            // model-derived one.
            observed_icu / model_icu
        },
    };

    ConversionFactors {
        hospitalized: hospitalized_factor,
        icu: icu_factor,
    }
}
