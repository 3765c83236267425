//! Event fan-out to subscribers that the core does not know by name.

pub(crate) mod watchlist;
