use log::info;
use serde::{Serialize, Deserialize};

use crate::errors::Error;
use crate::observed::ObservedLatest;

/// Additive corrections for the two hospitalization compartments. Adding
/// each shim to the corresponding model series makes the series pass
/// through the latest observed value at the alignment index.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShimResult {
    pub acute_shim: f64,
    pub icu_shim: f64,
}

/// How to reconcile model-projected hospitalization counts with the latest
/// observed counts for the same geographic entity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShimStrategy {
    /// Correct each compartment independently from its own observation,
    /// with no cross-compartment reasoning.
    Strict,
    /// Apportion the total hospitalization error across compartments by
    /// their share of the model total, then let a directly observed ICU
    /// count override its apportioned share.
    IntraLevel,
    /// Estimate a county's shim from its state's observed-to-model ratio
    /// when the county has no direct observations. Not implemented.
    InterLevel,
}

pub const DEFAULT_STRATEGY: ShimStrategy = ShimStrategy::IntraLevel;

/// Shim model outputs s.t. the latest observed value matches the model's
/// value at the alignment index, using the default strategy.
pub fn shim_model_to_observations(
    model_acute_ts: &[f64],
    model_icu_ts: &[f64],
    idx: usize,
    observed_latest: &ObservedLatest,
) -> Result<ShimResult, Error> {
    DEFAULT_STRATEGY.apply(model_acute_ts, model_icu_ts, idx, observed_latest)
}

impl ShimStrategy {
    /// `idx` must be a valid index into both series.
    pub fn apply(
        self,
        model_acute_ts: &[f64],
        model_icu_ts: &[f64],
        idx: usize,
        observed_latest: &ObservedLatest,
    ) -> Result<ShimResult, Error> {
        match self {
            ShimStrategy::Strict => {
                Ok(strict_match_model_to_observed(
                    model_acute_ts, model_icu_ts, idx, observed_latest
                ))
            },
            ShimStrategy::IntraLevel => {
                Ok(intralevel_match_model_to_observed(
                    model_acute_ts, model_icu_ts, idx, observed_latest
                ))
            },
            ShimStrategy::InterLevel => {
                Err(Error::UnimplementedStrategy("inter-level shim".into()))
            },
        }
    }
}

// The combined dataset still reports 0 in places where a value is actually
// missing. Until its promise of NULL/NaN for absent counts holds, an exact
// 0 is treated the same as an absent value.
fn known_nonzero(value: Option<f64>) -> Option<f64> {
    match value {
        Some(x) if x == 0.0 => None,
        other => other,
    }
}

/// Most strict: only shift a compartment if its own current value is
/// available.
fn strict_match_model_to_observed(
    model_acute_ts: &[f64],
    model_icu_ts: &[f64],
    idx: usize,
    observed_latest: &ObservedLatest,
) -> ShimResult {
    let observed = observed_latest.normalized();

    // The dataset reports total hospitalized, not acute; acute is only
    // derivable when both total and ICU are present.
    let observed_acute = match (observed.current_hospitalized, observed.current_icu) {
        (Some(total), Some(icu)) => Some(total - icu),
        _ => None,
    };

    let acute_shim = match known_nonzero(observed_acute) {
        Some(acute) => acute - model_acute_ts[idx],
        None => 0.0,
    };
    let icu_shim = match known_nonzero(observed.current_icu) {
        Some(icu) => icu - model_icu_ts[idx],
        None => 0.0,
    };

    info!(
        "strict shim applied: acute_shim={} icu_shim={}",
        acute_shim.round(),
        icu_shim.round(),
    );

    ShimResult { acute_shim, icu_shim }
}

/// Reconcile both compartments against the observed total for the entity's
/// own aggregation level, then let a directly observed ICU count override
/// its apportioned share. Does not estimate county from state data.
fn intralevel_match_model_to_observed(
    model_acute_ts: &[f64],
    model_icu_ts: &[f64],
    idx: usize,
    observed_latest: &ObservedLatest,
) -> ShimResult {
    let observed = observed_latest.normalized();
    let model_acute = model_acute_ts[idx];
    let model_icu = model_icu_ts[idx];
    let model_total = model_acute + model_icu;

    let (acute_shim, icu_shim) = match known_nonzero(observed.current_hospitalized) {
        // Without a usable observed total there is nothing to reconcile
        // against; the ICU override below is skipped as well.
        None => (0.0, 0.0),
        // An empty model gives no basis for apportioning the error.
        Some(_) if model_total == 0.0 => (0.0, 0.0),
        Some(observed_total) => {
            // Apportion the tracking error between observed and model
            // totals by each compartment's share of the model total.
            let total_error = observed_total - model_total;
            let acute_shim = total_error * (model_acute / model_total);
            let mut icu_shim = total_error * (model_icu / model_total);

            // A directly observed ICU count beats the apportioned estimate.
            if let Some(observed_icu) = known_nonzero(observed.current_icu) {
                icu_shim = observed_icu - model_icu;
            }

            (acute_shim, icu_shim)
        },
    };

    info!(
        "intra-level shim applied: \
         observed_hospitalized={:?} observed_icu={:?} \
         acute_shim={} icu_shim={} \
         model_acute={} model_icu={} model_total={}",
        observed.current_hospitalized,
        observed.current_icu,
        acute_shim.round(),
        icu_shim.round(),
        model_acute.round(),
        model_icu.round(),
        model_total.round(),
    );

    ShimResult { acute_shim, icu_shim }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(
        current_hospitalized: Option<f64>, current_icu: Option<f64>
    ) -> ObservedLatest {
        ObservedLatest { current_hospitalized, current_icu }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}", expected, actual
        );
    }

    #[test]
    fn test_intralevel_apportionment_with_icu_override() {
        let result = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), Some(30.0))
        ).unwrap();

        // Total error of 30 splits 25/5 by compartment weight; the direct
        // ICU observation then replaces the apportioned 5 with 30 - 20.
        assert_close(result.acute_shim, 25.0);
        assert_close(result.icu_shim, 10.0);
    }

    #[test]
    fn test_intralevel_apportionment_conserves_total_error() {
        let result = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), None)
        ).unwrap();

        assert_close(result.acute_shim, 25.0);
        assert_close(result.icu_shim, 5.0);
        assert_close(result.acute_shim + result.icu_shim, 150.0 - 120.0);
    }

    #[test]
    fn test_intralevel_unknown_total_short_circuits() {
        // No usable total means no reconciliation at all, even though an
        // ICU observation is present.
        let result = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &observed(None, Some(30.0))
        ).unwrap();

        assert_eq!(result, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_intralevel_zero_total_is_treated_as_missing() {
        let result = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &observed(Some(0.0), Some(30.0))
        ).unwrap();

        assert_eq!(result, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_intralevel_nan_total_behaves_like_absent() {
        let result = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &observed(Some(std::f64::NAN), Some(30.0))
        ).unwrap();

        assert_eq!(result, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_intralevel_zero_tracking_error() {
        let result = ShimStrategy::IntraLevel.apply(
            &[50.0], &[50.0], 0, &observed(Some(100.0), None)
        ).unwrap();

        assert_close(result.acute_shim, 0.0);
        assert_close(result.icu_shim, 0.0);
    }

    #[test]
    fn test_intralevel_zero_model_total_yields_zero_shims() {
        let result = ShimStrategy::IntraLevel.apply(
            &[0.0], &[0.0], 0, &observed(Some(150.0), Some(30.0))
        ).unwrap();

        assert_eq!(result, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_intralevel_uses_alignment_index() {
        let result = ShimStrategy::IntraLevel.apply(
            &[10.0, 50.0, 75.0], &[10.0, 10.0, 25.0], 2,
            &observed(Some(120.0), None)
        ).unwrap();

        // model_total = 100 at idx 2, error = 20, split 75/25.
        assert_close(result.acute_shim, 15.0);
        assert_close(result.icu_shim, 5.0);
    }

    #[test]
    fn test_strict_exact_corrections() {
        let result = ShimStrategy::Strict.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), Some(30.0))
        ).unwrap();

        // observed acute = 150 - 30 = 120
        assert_eq!(result.acute_shim, 20.0);
        assert_eq!(result.icu_shim, 10.0);
    }

    #[test]
    fn test_strict_round_trip_reproduces_observed_values() {
        let model_acute = [80.0, 100.0];
        let model_icu = [15.0, 20.0];
        let obs = observed(Some(150.0), Some(30.0));
        let result = ShimStrategy::Strict.apply(
            &model_acute, &model_icu, 1, &obs
        ).unwrap();

        assert_eq!(model_acute[1] + result.acute_shim, 150.0 - 30.0);
        assert_eq!(model_icu[1] + result.icu_shim, 30.0);
    }

    #[test]
    fn test_strict_unknown_icu_blocks_derived_acute() {
        // Acute is total minus ICU, so an unknown ICU makes acute unknown
        // too, even with a known total.
        let result = ShimStrategy::Strict.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), None)
        ).unwrap();

        assert_eq!(result, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_strict_zero_derived_acute_is_treated_as_missing() {
        let result = ShimStrategy::Strict.apply(
            &[100.0], &[20.0], 0, &observed(Some(30.0), Some(30.0))
        ).unwrap();

        assert_eq!(result.acute_shim, 0.0);
        assert_eq!(result.icu_shim, 10.0);
    }

    #[test]
    fn test_strict_zero_observed_icu_is_treated_as_missing() {
        let result = ShimStrategy::Strict.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), Some(0.0))
        ).unwrap();

        // derived acute = 150 - 0 = 150 is a real observation; the ICU
        // zero is a placeholder.
        assert_eq!(result.acute_shim, 50.0);
        assert_eq!(result.icu_shim, 0.0);
    }

    #[test]
    fn test_strict_shims_are_compartment_independent() {
        let obs = observed(Some(150.0), Some(30.0));
        let a = ShimStrategy::Strict.apply(&[100.0], &[20.0], 0, &obs).unwrap();
        let b = ShimStrategy::Strict.apply(&[100.0], &[90.0], 0, &obs).unwrap();

        // Changing the ICU projection must not move the acute shim.
        assert_eq!(a.acute_shim, b.acute_shim);
    }

    #[test]
    fn test_strategies_diverge_on_zero_observed_total() {
        // Strict derives acute = 0 - 30 = -30 and proceeds; intra-level
        // treats the zero total as missing and does nothing. Both are
        // intended behavior.
        let obs = observed(Some(0.0), Some(30.0));

        let strict = ShimStrategy::Strict.apply(
            &[100.0], &[20.0], 0, &obs
        ).unwrap();
        assert_eq!(strict.acute_shim, -130.0);
        assert_eq!(strict.icu_shim, 10.0);

        let intra = ShimStrategy::IntraLevel.apply(
            &[100.0], &[20.0], 0, &obs
        ).unwrap();
        assert_eq!(intra, ShimResult { acute_shim: 0.0, icu_shim: 0.0 });
    }

    #[test]
    fn test_interlevel_is_unimplemented() {
        match ShimStrategy::InterLevel.apply(
            &[100.0], &[20.0], 0, &observed(Some(150.0), Some(30.0))
        ) {
            Err(Error::UnimplementedStrategy(_)) => {},
            other => panic!("expected unimplemented strategy, got {:?}", other),
        }
    }

    #[test]
    fn test_default_strategy_is_intralevel() {
        let result = shim_model_to_observations(
            &[100.0], &[20.0], 0, &observed(Some(150.0), Some(30.0))
        ).unwrap();

        assert_close(result.acute_shim, 25.0);
        assert_close(result.icu_shim, 10.0);
    }
}
