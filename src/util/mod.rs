//! Utility types and functions for the EasyTransfer core.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math re-exports from `glam` and tolerance helpers

mod error;
mod math;

pub use error::*;
pub use math::*;
