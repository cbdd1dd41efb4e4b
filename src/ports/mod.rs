//! Port traits for external collaborators.

pub mod advice_port;
pub mod config_port;
pub mod quote_port;
