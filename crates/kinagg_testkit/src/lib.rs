//! # kinagg Testkit
//!
//! Test utilities for kinagg.
//!
//! This crate provides:
//! - Record fixtures built fresh per test
//! - Property-based test generators using proptest
//! - Fuzz testing harnesses
//! - Golden envelope vectors for cross-implementation checks
//!
//! ## Usage
//!
//! ```rust
//! use kinagg_core::Deaggregator;
//! use kinagg_testkit::prelude::*;
//!
//! let records = random_records(10);
//! let physical = aggregated_physical_record(&records, "1");
//!
//! let out = Deaggregator::new().deaggregate([physical]).unwrap().into_records();
//! CheckSet::new(&records).verify_all(&out);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use vectors::*;
