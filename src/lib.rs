//! tickwatch — watchlist tracker and paper-trading simulator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`]. The periodic quote
//! refresh driver lives in [`scheduler`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod scheduler;
