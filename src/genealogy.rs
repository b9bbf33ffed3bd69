//! Sample archive and ancestor-closure reconstruction.
//!
//! Sampled individuals are moved out of their cohort and retained here for
//! the lifetime of the simulation. At reporting time the parent references
//! of every archived sample are walked to build the minimal ancestor-closed
//! genealogy: a DAG, not necessarily a tree, since unrelated samples may
//! share ancestors under inbreeding.

use crate::individual::Individual;
use crate::report::FamilyRecord;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Captured individuals keyed by capture year, in capture order.
#[derive(Debug, Default)]
pub struct SampleArchive {
    year_samples: BTreeMap<u32, Vec<Arc<Individual>>>,
}

impl SampleArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sampling event's captures for `year`.
    pub fn record(&mut self, year: u32, individuals: Vec<Arc<Individual>>) {
        self.year_samples.entry(year).or_default().extend(individuals);
    }

    /// Iterate events in year order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Arc<Individual>])> {
        self.year_samples.iter().map(|(y, v)| (*y, v.as_slice()))
    }

    /// Samples captured in a given year, if any.
    pub fn samples_at(&self, year: u32) -> Option<&[Arc<Individual>]> {
        self.year_samples.get(&year).map(|v| v.as_slice())
    }

    /// Total number of archived individuals.
    pub fn len(&self) -> usize {
        self.year_samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.year_samples.is_empty()
    }

    /// Build the full ancestor closure of the archive and emit one record
    /// per distinct individual, sorted by identity for deterministic output.
    pub fn export_family(&self) -> Vec<FamilyRecord> {
        let mut visited: HashMap<u32, Arc<Individual>> = HashMap::new();
        for (_, samples) in self.iter() {
            for individual in samples {
                trace_back(individual, &mut visited);
            }
        }
        let capture_years: HashMap<u32, u32> = self
            .iter()
            .flat_map(|(year, samples)| samples.iter().map(move |i| (i.id(), year)))
            .collect();
        let mut records: Vec<FamilyRecord> = visited
            .values()
            .map(|i| FamilyRecord::from_individual(i, capture_years.get(&i.id()).copied()))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

/// Walk parent references from `individual`, inserting every reachable
/// ancestor into `visited` keyed by id.
///
/// Each individual is visited at most once no matter how many sampled
/// descendants lead to it, so shared ancestors collapse without duplicate
/// work. The walk is an explicit stack rather than recursion, so pedigree
/// depth is bounded only by memory. It terminates because founders have no
/// parent references.
pub fn trace_back(individual: &Arc<Individual>, visited: &mut HashMap<u32, Arc<Individual>>) {
    let mut stack = vec![Arc::clone(individual)];
    while let Some(current) = stack.pop() {
        if visited.insert(current.id(), Arc::clone(&current)).is_some() {
            continue;
        }
        if let Some(father) = current.father() {
            stack.push(Arc::clone(father));
        }
        if let Some(mother) = current.mother() {
            stack.push(Arc::clone(mother));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Sex;

    fn founder(id: u32) -> Arc<Individual> {
        let sex = if id % 2 == 0 { Sex::Female } else { Sex::Male };
        Arc::new(Individual::founder(id, 0, 0, sex))
    }

    fn child(id: u32, father: &Arc<Individual>, mother: &Arc<Individual>, year: u32) -> Arc<Individual> {
        let sex = if id % 2 == 0 { Sex::Female } else { Sex::Male };
        Arc::new(Individual::born(id, father, mother, year, sex))
    }

    /// Five-generation pedigree in which two sampled lineages descend from
    /// the same grandparent pair.
    fn inbred_pedigree() -> (Arc<Individual>, Arc<Individual>, u32) {
        let (f0, m0) = (founder(1), founder(2));
        let (f1, m1) = (child(3, &f0, &m0, 1), child(4, &f0, &m0, 1));
        let (f2, m2) = (child(5, &f1, &m0, 2), child(6, &f1, &m1, 2));
        let (f3, m3) = (child(7, &f2, &m2, 3), child(8, &f2, &m2, 3));
        let a = child(9, &f3, &m3, 4);
        let b = child(10, &f3, &m3, 4);
        (a, b, 10)
    }

    #[test]
    fn test_trace_back_visits_each_ancestor_once() {
        let (a, b, total) = inbred_pedigree();
        let mut visited = HashMap::new();
        trace_back(&a, &mut visited);
        trace_back(&b, &mut visited);
        // all ten individuals, shared ancestors collapsed
        assert_eq!(visited.len(), total as usize);
        assert_eq!(visited.values().filter(|i| i.id() == 1).count(), 1);
    }

    #[test]
    fn test_trace_back_terminates_at_founders() {
        let solo = founder(1);
        let mut visited = HashMap::new();
        trace_back(&solo, &mut visited);
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_export_family_is_ancestor_closed() {
        let (a, b, _) = inbred_pedigree();
        let mut archive = SampleArchive::new();
        archive.record(4, vec![a, b]);
        let records = archive.export_family();
        assert_eq!(records.len(), 10);

        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        for record in &records {
            for parent in [record.father_id, record.mother_id].into_iter().flatten() {
                assert!(ids.contains(&parent), "parent {parent} missing from closure");
            }
        }
        // only the two samples carry a capture year
        let captured: Vec<u32> = records
            .iter()
            .filter(|r| r.capture_year == Some(4))
            .map(|r| r.id)
            .collect();
        assert_eq!(captured, vec![9, 10]);
    }

    #[test]
    fn test_archive_ordering_and_len() {
        let mut archive = SampleArchive::new();
        archive.record(7, vec![founder(1)]);
        archive.record(5, vec![founder(2), founder(3)]);
        assert_eq!(archive.len(), 3);
        let years: Vec<u32> = archive.iter().map(|(y, _)| y).collect();
        assert_eq!(years, vec![5, 7]);
        assert_eq!(archive.samples_at(5).unwrap().len(), 2);
    }
}
