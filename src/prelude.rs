//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use poptrace::prelude::*;
//!
//! let params = Params::new(VitalRates::default()).unwrap();
//! let mut pop = Population::new(100, 42, params);
//! pop.run(10, 2, &SamplingScheme::Rate(0.02));
//! let pedigree = pop.sample_family();
//! assert!(pedigree.iter().all(|r| r.capture_year.is_none() || r.birth_year <= 10));
//! ```

pub use crate::errors::ParamsError;
pub use crate::genealogy::{trace_back, SampleArchive};
pub use crate::individual::{Individual, Sex};
pub use crate::params::{Params, VitalRates};
pub use crate::population::{Population, SamplingScheme};
pub use crate::report::{DemographyRecord, FamilyRecord};
