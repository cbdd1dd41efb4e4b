//! Core domain types and logic.

pub mod advice;
pub mod config;
pub mod error;
pub mod ledger;
pub mod market_clock;
pub mod reconcile;
pub mod replay;
pub mod security;
pub mod tracker;
pub mod watchlist;
