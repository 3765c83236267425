//! Core internal logic for connection management.
//!
//! This module contains the station state machine together with the
//! catalogue, autoconnect and enrollment pieces it drives.

pub(crate) mod autoconnect;
pub(crate) mod catalogue;
pub(crate) mod link;
pub(crate) mod network;
pub(crate) mod request;
pub(crate) mod security;
pub(crate) mod station;
pub(crate) mod store;
pub(crate) mod wsc;
