//! # Poptrace
//!
//! An individual-based, age- and sex-structured stochastic population
//! simulator. A population of discrete individuals is subjected to natural
//! and fishing mortality, density-dependent recruitment, seasonal migration
//! among habitat patches, and periodic destructive sampling. Every individual
//! keeps shared references to its parents, so the minimal ancestor-closed
//! genealogy of the sample archive can be reconstructed after a run for
//! downstream coalescent analysis.

pub mod errors;
pub mod genealogy;
pub mod individual;
pub mod params;
pub mod population;
pub mod prelude;
pub mod report;

pub use genealogy::SampleArchive;
pub use individual::{Individual, Sex};
pub use params::{Params, VitalRates};
pub use population::{Population, SamplingScheme};
