//! Concrete implementations of the port traits.

pub mod csv_quote_adapter;
pub mod file_config_adapter;
pub mod ma_advice_adapter;
pub mod sim_quote_adapter;
