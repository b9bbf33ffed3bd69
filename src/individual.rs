//! Per-individual state and stochastic rules.
//!
//! An `Individual` is created once, either as a founder or by reproduction,
//! and its identity fields never change afterwards. Only `location` mutates,
//! and only while the individual is held in a live cohort; once it leaves the
//! cohort (archived, or surviving only as an ancestor of later generations)
//! it is frozen and read concurrently by any number of holders.

use crate::params::Params;
use rand::distr::Distribution;
use rand::Rng;
use rand_distr::{Gamma, Poisson};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Biological sex, fixed at birth by a fair coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

/// A single organism.
///
/// Parent references are shared (`Arc`), so an individual stays alive as long
/// as its cohort, any child, or the sample archive still refers to it. An
/// individual without parent references is a founder (generation 0).
#[derive(Debug)]
pub struct Individual {
    id: u32,
    father: Option<Arc<Individual>>,
    mother: Option<Arc<Individual>>,
    birth_year: u32,
    sex: Sex,
    /// Current habitat patch in `[0, L)`. Relaxed atomics let the migration
    /// phase update locations through the shared handles held by the cohort.
    location: AtomicU32,
}

impl Individual {
    /// Create a founder with no parents.
    pub fn founder(id: u32, birth_year: u32, location: u32, sex: Sex) -> Self {
        Self {
            id,
            father: None,
            mother: None,
            birth_year,
            sex,
            location: AtomicU32::new(location),
        }
    }

    /// Create an offspring of two parents, placed at the mother's location.
    pub fn born(
        id: u32,
        father: &Arc<Individual>,
        mother: &Arc<Individual>,
        year: u32,
        sex: Sex,
    ) -> Self {
        Self {
            id,
            father: Some(Arc::clone(father)),
            mother: Some(Arc::clone(mother)),
            birth_year: year,
            sex,
            location: AtomicU32::new(mother.location()),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn father(&self) -> Option<&Arc<Individual>> {
        self.father.as_ref()
    }

    #[inline]
    pub fn mother(&self) -> Option<&Arc<Individual>> {
        self.mother.as_ref()
    }

    #[inline]
    pub fn birth_year(&self) -> u32 {
        self.birth_year
    }

    #[inline]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    #[inline]
    pub fn location(&self) -> u32 {
        self.location.load(Ordering::Relaxed)
    }

    /// Whether this individual has no parent references (generation 0).
    pub fn is_founder(&self) -> bool {
        self.father.is_none() && self.mother.is_none()
    }

    /// Age in whole years at `year`.
    #[inline]
    pub fn age(&self, year: u32) -> u32 {
        year - self.birth_year
    }

    /// Body weight at `year`, from the clamped weight-at-age table.
    pub fn weight(&self, year: u32, params: &Params) -> f64 {
        params.weight_at(self.age(year) as usize)
    }

    /// Evaluate survival through one quarter of `year`.
    ///
    /// The age-quarter index is `4 * age + quarter`; beyond the tabulated
    /// range the last survival value applies.
    pub fn survives<R: Rng + ?Sized>(
        &self,
        year: u32,
        quarter: u32,
        params: &Params,
        rng: &mut R,
    ) -> bool {
        let index = (4 * self.age(year) + quarter) as usize;
        rng.random::<f64>() < params.survival_at(index)
    }

    /// Number of offspring produced in one reproduction cycle.
    ///
    /// The mean is `recruitment_coef * weight_at_age`. With a finite
    /// overdispersion k the count is negative-binomial, realised as the
    /// Gamma-Poisson mixture; without it, pure Poisson (the k to infinity
    /// limit). A non-positive mean yields zero.
    pub fn recruitment_count<R: Rng + ?Sized>(
        &self,
        year: u32,
        params: &Params,
        rng: &mut R,
    ) -> u32 {
        let mean = params.recruitment_coef() * self.weight(year, params);
        let lambda = match params.overdispersion() {
            Some(k) => match Gamma::new(k, mean / k) {
                Ok(gamma) => gamma.sample(rng),
                Err(_) => return 0,
            },
            None => mean,
        };
        match Poisson::new(lambda) {
            Ok(poisson) => poisson.sample(rng) as u32,
            Err(_) => 0,
        }
    }

    /// Draw a destination from the migration matrix row for (age, location)
    /// and move there. Ages beyond the last tabulated matrix reuse it.
    pub fn migrate<R: Rng + ?Sized>(&self, year: u32, params: &Params, rng: &mut R) {
        let row = params.migration_row(self.age(year) as usize, self.location() as usize);
        let destination = row.sample(rng) as u32;
        self.location.store(destination, Ordering::Relaxed);
    }

    /// Whether the current location belongs to the breeding subset.
    pub fn is_in_breeding_place(&self, params: &Params) -> bool {
        (self.location() as usize) < params.num_breeding_places()
    }
}
