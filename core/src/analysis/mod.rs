//! Joint reasoning over the frontier: exhaustive enumeration of consistent
//! mine placements and their reduction to facts and risks.

pub use aggregate::*;
pub use enumerate::*;

mod aggregate;
mod enumerate;
