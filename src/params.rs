//! Vital-rate parameter document and its validated, derived form.
//!
//! `VitalRates` is the serializable document consumed once at construction;
//! `Params` is the immutable object the engine holds for its lifetime, with
//! the derived survival table and the per-age categorical migration
//! distributions precomputed. Validation happens in `Params::new` and is
//! fatal: the engine never starts a run on bad data.

use crate::errors::ParamsError;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Tolerance used when checking that migration rows are stochastic.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Raw parameter document, as read from (and written to) JSON.
///
/// Mortality tables are per age-quarter; `weight_for_age` is per age; one
/// row-stochastic L x L migration matrix per age. Writing and re-reading a
/// document yields a structurally equal one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRates {
    /// Mortality due to natural causes, per age-quarter
    pub natural_mortality: Vec<f64>,
    /// Mortality due to fishing activities, per age-quarter
    pub fishing_mortality: Vec<f64>,
    /// Body weight per age, used for recruitment means
    pub weight_for_age: Vec<f64>,
    /// One transition matrix per age; rows are origins, columns destinations
    pub migration_matrices: Vec<Vec<Vec<f64>>>,
    /// Scales weight-at-age into a mean recruitment count
    pub recruitment_coef: f64,
    /// Negative-binomial overdispersion k; absent means pure Poisson
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdispersion: Option<f64>,
}

impl Default for VitalRates {
    /// A small four-location, four-age parameter set suitable for smoke runs.
    fn default() -> Self {
        let quarterly = |annual: f64| annual / 4.0;
        let natural: Vec<f64> = [0.6, 0.4, 0.3, 0.25]
            .iter()
            .flat_map(|&m| std::iter::repeat_n(quarterly(m), 4))
            .collect();
        let fishing: Vec<f64> = [0.1, 0.2, 0.25, 0.25]
            .iter()
            .flat_map(|&m| std::iter::repeat_n(quarterly(m), 4))
            .collect();
        let matrix = |stay: f64| -> Vec<Vec<f64>> {
            let spill = (1.0 - stay) / 3.0;
            (0..4)
                .map(|origin| {
                    (0..4)
                        .map(|dest| if dest == origin { stay } else { spill })
                        .collect()
                })
                .collect()
        };
        Self {
            natural_mortality: natural,
            fishing_mortality: fishing,
            weight_for_age: vec![0.5, 10.0, 30.0, 60.0],
            migration_matrices: vec![matrix(0.7), matrix(0.55), matrix(0.4), matrix(0.4)],
            recruitment_coef: 0.1,
            overdispersion: None,
        }
    }
}

/// Validated vital rates shared read-only by all individuals.
#[derive(Debug)]
pub struct Params {
    rates: VitalRates,
    /// exp(-(natural + fishing)) per age-quarter
    survival: Vec<f64>,
    /// Categorical destination distribution per age per origin
    migration: Vec<Vec<WeightedIndex<f64>>>,
    num_locations: usize,
    num_breeding_places: usize,
}

impl Params {
    /// Validate a parameter document and derive the lookup tables.
    pub fn new(rates: VitalRates) -> Result<Self, ParamsError> {
        Self::validate(&rates)?;

        let survival: Vec<f64> = rates
            .natural_mortality
            .iter()
            .zip(&rates.fishing_mortality)
            .map(|(n, f)| (-n - f).exp())
            .collect();

        let num_locations = rates.migration_matrices[0].len();
        let mut migration = Vec::with_capacity(rates.migration_matrices.len());
        for (age, matrix) in rates.migration_matrices.iter().enumerate() {
            let mut rows = Vec::with_capacity(matrix.len());
            for (row, weights) in matrix.iter().enumerate() {
                let dist = WeightedIndex::new(weights.iter().copied()).map_err(|_| {
                    ParamsError::NonStochasticRow {
                        age,
                        row,
                        sum: weights.iter().sum(),
                    }
                })?;
                rows.push(dist);
            }
            migration.push(rows);
        }

        Ok(Self {
            rates,
            survival,
            migration,
            num_locations,
            num_breeding_places: 2.min(num_locations),
        })
    }

    /// Load a parameter document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ParamsError> {
        let rates: VitalRates = serde_json::from_str(json)?;
        Self::new(rates)
    }

    /// Load a parameter document from a reader.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ParamsError> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Self::from_json_str(&buf)
    }

    /// Serialize the underlying document back to JSON.
    pub fn to_json_string(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string_pretty(&self.rates)?)
    }

    fn validate(rates: &VitalRates) -> Result<(), ParamsError> {
        let tables = [
            ("natural_mortality", &rates.natural_mortality),
            ("fishing_mortality", &rates.fishing_mortality),
            ("weight_for_age", &rates.weight_for_age),
        ];
        for (name, table) in tables {
            if table.is_empty() {
                return Err(ParamsError::EmptyTable(name));
            }
            for (index, &value) in table.iter().enumerate() {
                if !(value >= 0.0) {
                    return Err(ParamsError::NegativeRate {
                        table: name,
                        index,
                        value,
                    });
                }
            }
        }
        if rates.natural_mortality.len() != rates.fishing_mortality.len() {
            return Err(ParamsError::MortalityLengthMismatch {
                natural: rates.natural_mortality.len(),
                fishing: rates.fishing_mortality.len(),
            });
        }
        if rates.migration_matrices.is_empty() || rates.migration_matrices[0].is_empty() {
            return Err(ParamsError::EmptyTable("migration_matrices"));
        }
        let num_locations = rates.migration_matrices[0].len();
        for (age, matrix) in rates.migration_matrices.iter().enumerate() {
            if matrix.len() != num_locations {
                return Err(ParamsError::DimensionMismatch {
                    age,
                    expected: num_locations,
                    found: matrix.len(),
                });
            }
            for (row, weights) in matrix.iter().enumerate() {
                if weights.len() != num_locations {
                    return Err(ParamsError::DimensionMismatch {
                        age,
                        expected: num_locations,
                        found: weights.len(),
                    });
                }
                if weights.iter().any(|&w| !(w >= 0.0)) {
                    return Err(ParamsError::NonStochasticRow {
                        age,
                        row,
                        sum: weights.iter().sum(),
                    });
                }
                let sum: f64 = weights.iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(ParamsError::NonStochasticRow { age, row, sum });
                }
            }
        }
        if !(rates.recruitment_coef >= 0.0) {
            return Err(ParamsError::InvalidRecruitment(rates.recruitment_coef));
        }
        if let Some(k) = rates.overdispersion {
            if !(k > 0.0) {
                return Err(ParamsError::InvalidOverdispersion(k));
            }
        }
        Ok(())
    }

    /// Borrow the raw document (for re-serialization).
    pub fn rates(&self) -> &VitalRates {
        &self.rates
    }

    /// Survival probability for an age-quarter index, clamping to the last
    /// tabulated value beyond the end of the table.
    pub fn survival_at(&self, index: usize) -> f64 {
        self.survival[index.min(self.survival.len() - 1)]
    }

    /// Weight at age, clamping to the last tabulated value.
    pub fn weight_at(&self, age: usize) -> f64 {
        self.rates.weight_for_age[age.min(self.rates.weight_for_age.len() - 1)]
    }

    /// Migration destination distribution for (age, origin), clamping age to
    /// the last tabulated matrix.
    pub fn migration_row(&self, age: usize, origin: usize) -> &WeightedIndex<f64> {
        &self.migration[age.min(self.migration.len() - 1)][origin]
    }

    pub fn recruitment_coef(&self) -> f64 {
        self.rates.recruitment_coef
    }

    /// Overdispersion k, or `None` for pure Poisson recruitment.
    pub fn overdispersion(&self) -> Option<f64> {
        self.rates.overdispersion
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    /// Locations eligible for reproduction and sampling, conventionally the
    /// first indices.
    pub fn num_breeding_places(&self) -> usize {
        self.num_breeding_places
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates_validate() {
        let params = Params::new(VitalRates::default()).unwrap();
        assert_eq!(params.num_locations(), 4);
        assert_eq!(params.num_breeding_places(), 2);
    }

    #[test]
    fn test_survival_derivation_and_bounds() {
        let params = Params::new(VitalRates::default()).unwrap();
        for index in 0..32 {
            let p = params.survival_at(index);
            assert!((0.0..=1.0).contains(&p), "survival out of range: {p}");
        }
        let rates = params.rates();
        let expected = (-rates.natural_mortality[0] - rates.fishing_mortality[0]).exp();
        assert_eq!(params.survival_at(0), expected);
    }

    #[test]
    fn test_clamping_beyond_tables() {
        let params = Params::new(VitalRates::default()).unwrap();
        let last = params.rates().weight_for_age.len() - 1;
        assert_eq!(params.weight_at(100), params.rates().weight_for_age[last]);
        assert_eq!(params.survival_at(1000), params.survival_at(15));
        // ages far past the last matrix reuse the last matrix
        let _ = params.migration_row(99, 0);
    }

    #[test]
    fn test_negative_mortality_rejected() {
        let mut rates = VitalRates::default();
        rates.natural_mortality[3] = -0.1;
        assert!(matches!(
            Params::new(rates),
            Err(ParamsError::NegativeRate { .. })
        ));
    }

    #[test]
    fn test_mortality_length_mismatch_rejected() {
        let mut rates = VitalRates::default();
        rates.fishing_mortality.pop();
        assert!(matches!(
            Params::new(rates),
            Err(ParamsError::MortalityLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_non_stochastic_row_rejected() {
        let mut rates = VitalRates::default();
        rates.migration_matrices[1][2][0] += 0.5;
        let err = Params::new(rates).unwrap_err();
        match err {
            ParamsError::NonStochasticRow { age, row, .. } => {
                assert_eq!((age, row), (1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut rates = VitalRates::default();
        rates.migration_matrices[0][1].pop();
        assert!(matches!(
            Params::new(rates),
            Err(ParamsError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_overdispersion_rejected() {
        let mut rates = VitalRates::default();
        rates.overdispersion = Some(0.0);
        assert!(matches!(
            Params::new(rates),
            Err(ParamsError::InvalidOverdispersion(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let params = Params::new(VitalRates::default()).unwrap();
        let json = params.to_json_string().unwrap();
        let reloaded = Params::from_json_str(&json).unwrap();
        assert_eq!(params.rates(), reloaded.rates());
    }
}
