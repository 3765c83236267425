//! Public API module.
//!
//! This module contains the high-level user-facing API for the `iwrs` crate.

pub mod bss;
pub mod config;
pub mod models;
pub mod station_manager;
