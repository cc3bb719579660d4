//! bf-core: shared foundation for beamflow.
//!
//! Contains:
//! - units (uom SI types + constructors for the physical inputs)
//! - numeric (Real + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{BfError, BfResult};
pub use numeric::*;
pub use units::*;
