//! Type definitions and constants.
//!
//! This module contains 802.11 suite selectors, rank factors and other
//! numeric constants shared by the station core.

pub(crate) mod constants;
