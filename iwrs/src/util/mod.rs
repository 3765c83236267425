//! Conversion and naming helpers.

pub(crate) mod utils;
