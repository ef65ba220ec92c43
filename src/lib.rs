#![warn(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

// these are not re-exported as they are somewhat niche.
// If the user needs them, they have to be qualified
pub mod load;
pub mod problems;
pub mod register;

// these modules are re-exported as they form the main part of the API
pub mod dmx_value;
mod errors;
mod fixture;
pub mod parse;
pub mod validate;

pub use dmx_value::*;
pub use errors::*;
pub use fixture::*;
pub use parse::*;
pub use validate::*;
