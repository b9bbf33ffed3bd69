//! Population engine: cohorts, the yearly step sequence, and sampling.
//!
//! The engine owns the live cohorts (one per sex) and drives the fixed
//! yearly order reproduce -> survive x4 -> sample -> migrate. The order is
//! part of the reproducibility contract: all stochastic phases draw from one
//! logical seeded stream, so for a fixed seed two runs produce identical
//! archives and demography tables. The quarterly survival and migration
//! phases are per-individual independent and run in parallel; each
//! individual draws from its own sub-stream seeded serially by the master
//! RNG, so the result does not depend on thread count.

use crate::genealogy::SampleArchive;
use crate::individual::{Individual, Sex};
use crate::params::Params;
use crate::report::{DemographyRecord, FamilyRecord};
use rand::seq::index;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// How many individuals to move into the archive at a sampling event.
#[derive(Debug, Clone)]
pub enum SamplingScheme {
    /// Capture `round(rate * stratum size)` adults per breeding location;
    /// juveniles at twice the adult quota (differential sampling effort).
    Rate(f64),
    /// Explicit per-location counts for adults and juveniles.
    Counts {
        adults: Vec<usize>,
        juveniles: Vec<usize>,
    },
}

impl SamplingScheme {
    /// (adult, juvenile) quotas for a location, given the adult stratum size.
    fn quotas(&self, location: usize, adult_stratum: usize) -> (usize, usize) {
        match self {
            Self::Rate(rate) => {
                let adult = (rate * adult_stratum as f64).round() as usize;
                (adult, 2 * adult)
            }
            Self::Counts { adults, juveniles } => (
                adults.get(location).copied().unwrap_or(0),
                juveniles.get(location).copied().unwrap_or(0),
            ),
        }
    }
}

/// The live population and everything recorded about it.
#[derive(Debug)]
pub struct Population {
    males: Vec<Arc<Individual>>,
    females: Vec<Arc<Individual>>,
    year: u32,
    next_id: u32,
    params: Arc<Params>,
    rng: Xoshiro256PlusPlus,
    archive: SampleArchive,
    /// (year, season) -> per-location age histogram
    demography: BTreeMap<(u32, u32), Vec<BTreeMap<u32, u32>>>,
}

impl Population {
    /// Create founders split evenly between the sexes, all at location 0.
    pub fn new(initial_size: usize, seed: u64, params: Params) -> Self {
        let params = Arc::new(params);
        let mut next_id = 1u32;
        let half = initial_size / 2;
        let mut males = Vec::with_capacity(half);
        for _ in 0..half {
            males.push(Arc::new(Individual::founder(next_id, 0, 0, Sex::Male)));
            next_id += 1;
        }
        let mut females = Vec::with_capacity(initial_size - half);
        for _ in half..initial_size {
            females.push(Arc::new(Individual::founder(next_id, 0, 0, Sex::Female)));
            next_id += 1;
        }
        Self {
            males,
            females,
            year: 0,
            next_id,
            params,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            archive: SampleArchive::new(),
            demography: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn size(&self) -> usize {
        self.males.len() + self.females.len()
    }

    pub fn males(&self) -> &[Arc<Individual>] {
        &self.males
    }

    pub fn females(&self) -> &[Arc<Individual>] {
        &self.females
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn archive(&self) -> &SampleArchive {
        &self.archive
    }

    /// Advance one simulated year through the full phase sequence,
    /// sampling only when a scheme is supplied.
    pub fn step(&mut self, sampling: Option<&SamplingScheme>) {
        self.year += 1;
        self.reproduce();
        for quarter in 0..4 {
            self.survive(quarter);
            self.append_demography(quarter);
        }
        if let Some(scheme) = sampling {
            self.sample(scheme);
        }
        self.migrate();
    }

    /// Advance `duration` years, sampling during the final
    /// `recording_duration` of them.
    pub fn run(&mut self, duration: u32, recording_duration: u32, scheme: &SamplingScheme) {
        let end = self.year + duration;
        while self.year < end {
            let recording = self.year + 1 + recording_duration > end;
            self.step(recording.then_some(scheme));
        }
    }

    /// Give birth to this year's cohort.
    ///
    /// Each female in a breeding place draws a recruitment count, then mates
    /// with a single father chosen uniformly among the males sharing her
    /// location (a documented simplification). No co-located male, or a zero
    /// count, means zero offspring for her this cycle.
    fn reproduce(&mut self) {
        let year = self.year;
        let mut boys = Vec::new();
        let mut girls = Vec::new();
        {
            let mut males_by_location: Vec<Vec<&Arc<Individual>>> =
                vec![Vec::new(); self.params.num_locations()];
            for male in &self.males {
                males_by_location[male.location() as usize].push(male);
            }
            for mother in &self.females {
                if !mother.is_in_breeding_place(&self.params) {
                    continue;
                }
                let candidates = &males_by_location[mother.location() as usize];
                if candidates.is_empty() {
                    continue;
                }
                let count = mother.recruitment_count(year, &self.params, &mut self.rng);
                if count == 0 {
                    continue;
                }
                let Some(father) = candidates.choose(&mut self.rng) else {
                    continue;
                };
                for _ in 0..count {
                    let sex = if self.rng.random::<f64>() < 0.5 {
                        Sex::Male
                    } else {
                        Sex::Female
                    };
                    let child = Arc::new(Individual::born(self.next_id, father, mother, year, sex));
                    self.next_id += 1;
                    match sex {
                        Sex::Male => boys.push(child),
                        Sex::Female => girls.push(child),
                    }
                }
            }
        }
        self.males.extend(boys);
        self.females.extend(girls);
    }

    /// Remove individuals failing this quarter's survival check.
    fn survive(&mut self, quarter: u32) {
        let year = self.year;
        let seeds: Vec<u64> = (0..self.males.len()).map(|_| self.rng.random()).collect();
        Self::retain_survivors(&mut self.males, &seeds, year, quarter, &self.params);
        let seeds: Vec<u64> = (0..self.females.len()).map(|_| self.rng.random()).collect();
        Self::retain_survivors(&mut self.females, &seeds, year, quarter, &self.params);
    }

    fn retain_survivors(
        cohort: &mut Vec<Arc<Individual>>,
        seeds: &[u64],
        year: u32,
        quarter: u32,
        params: &Params,
    ) {
        let keep: Vec<bool> = cohort
            .par_iter()
            .zip_eq(seeds.par_iter())
            .map(|(individual, &seed)| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                individual.survives(year, quarter, params, &mut rng)
            })
            .collect();
        let mut flags = keep.into_iter();
        cohort.retain(|_| flags.next().unwrap_or(false));
    }

    /// Move every living individual to a drawn destination; no removals.
    fn migrate(&mut self) {
        let year = self.year;
        let seeds: Vec<u64> = (0..self.males.len()).map(|_| self.rng.random()).collect();
        Self::migrate_cohort(&self.males, &seeds, year, &self.params);
        let seeds: Vec<u64> = (0..self.females.len()).map(|_| self.rng.random()).collect();
        Self::migrate_cohort(&self.females, &seeds, year, &self.params);
    }

    fn migrate_cohort(cohort: &[Arc<Individual>], seeds: &[u64], year: u32, params: &Params) {
        cohort
            .par_iter()
            .zip_eq(seeds.par_iter())
            .for_each(|(individual, &seed)| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                individual.migrate(year, params, &mut rng);
            });
    }

    /// Move quota-sized uniform subsets of each eligible stratum into the
    /// archive. Strata are (location, life stage) within each cohort;
    /// juveniles are this year's births. Quotas clamp to the stratum size,
    /// so scarcity never fails a run.
    fn sample(&mut self, scheme: &SamplingScheme) {
        let year = self.year;
        let mut captured = Vec::new();
        Self::sample_cohort(
            &mut self.males,
            &mut self.rng,
            &self.params,
            year,
            scheme,
            &mut captured,
        );
        Self::sample_cohort(
            &mut self.females,
            &mut self.rng,
            &self.params,
            year,
            scheme,
            &mut captured,
        );
        if !captured.is_empty() {
            self.archive.record(year, captured);
        }
    }

    fn sample_cohort(
        cohort: &mut Vec<Arc<Individual>>,
        rng: &mut Xoshiro256PlusPlus,
        params: &Params,
        year: u32,
        scheme: &SamplingScheme,
        captured: &mut Vec<Arc<Individual>>,
    ) {
        let mut chosen = vec![false; cohort.len()];
        for location in 0..params.num_breeding_places() as u32 {
            let mut adults = Vec::new();
            let mut juveniles = Vec::new();
            for (i, individual) in cohort.iter().enumerate() {
                if individual.location() != location {
                    continue;
                }
                if individual.birth_year() == year {
                    juveniles.push(i);
                } else {
                    adults.push(i);
                }
            }
            let (adult_quota, juvenile_quota) = scheme.quotas(location as usize, adults.len());
            for (stratum, quota) in [(&adults, adult_quota), (&juveniles, juvenile_quota)] {
                let take = quota.min(stratum.len());
                if take == 0 {
                    continue;
                }
                for pick in index::sample(rng, stratum.len(), take).iter() {
                    let i = stratum[pick];
                    chosen[i] = true;
                    captured.push(Arc::clone(&cohort[i]));
                }
            }
        }
        let mut flags = chosen.into_iter();
        cohort.retain(|_| !flags.next().unwrap_or(true));
    }

    /// Record the post-survival age histogram per location.
    fn append_demography(&mut self, season: u32) {
        let mut counts: Vec<BTreeMap<u32, u32>> =
            vec![BTreeMap::new(); self.params.num_locations()];
        for individual in self.males.iter().chain(self.females.iter()) {
            *counts[individual.location() as usize]
                .entry(individual.age(self.year))
                .or_insert(0) += 1;
        }
        self.demography.insert((self.year, season), counts);
    }

    /// Flat records for the currently-live population, males then females.
    pub fn live_records(&self) -> Vec<FamilyRecord> {
        self.males
            .iter()
            .chain(self.females.iter())
            .map(|i| FamilyRecord::from_individual(i, None))
            .collect()
    }

    /// Ancestor-closed pedigree of everything in the archive.
    pub fn sample_family(&self) -> Vec<FamilyRecord> {
        self.archive.export_family()
    }

    /// The demography table flattened into records, in (year, season,
    /// location, age) order.
    pub fn demography_records(&self) -> Vec<DemographyRecord> {
        let mut records = Vec::new();
        for (&(year, season), per_location) in &self.demography {
            for (location, ages) in per_location.iter().enumerate() {
                for (&age, &count) in ages {
                    records.push(DemographyRecord {
                        year,
                        season,
                        location: location as u32,
                        age,
                        count,
                    });
                }
            }
        }
        records
    }
}
