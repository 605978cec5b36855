//! docsum-core - Domain types shared by the docsum pipeline stages.

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
