pub mod capability;
pub mod channel;
pub mod fixture;
pub mod key;
pub mod manufacturer;
pub mod matrix;
pub mod meta;
pub mod mode;
pub mod physical;

pub use capability::*;
pub use channel::*;
pub use fixture::*;
pub use key::{Key, KeyError};
pub use manufacturer::*;
pub use matrix::*;
pub use meta::*;
pub use mode::*;
pub use physical::*;
