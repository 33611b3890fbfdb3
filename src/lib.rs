pub use crate::synthesis::builder::{UnifParams, UnifParamsBuilder};
pub use crate::synthesis::{PurifiedLemma, Registration, SygusUnif, Synthesis};

pub mod config;
pub mod error;
pub mod oracle;
pub mod strategy;
pub mod synthesis;
pub mod term;
