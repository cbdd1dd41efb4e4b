//! Deterministic paper-trading session replay.
//!
//! Drives a [`TrackerState`] through a fixed number of refresh ticks against
//! a quote port, executing scripted orders at their tick. Used by the
//! `replay` command and by tests; the live `watch` loop goes through the
//! scheduler instead.

use chrono::{DateTime, Duration, Utc};

use super::ledger::{TradeOutcome, TradeRecord, TradeSide};
use super::tracker::TrackerState;
use crate::ports::quote_port::QuotePort;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderInstruction {
    /// Zero-based refresh tick at which the order fires.
    pub tick: usize,
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub order: OrderInstruction,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub ticks_run: usize,
    pub quotes_applied: usize,
    pub executed: Vec<TradeRecord>,
    pub rejected: Vec<RejectedOrder>,
}

/// Run `ticks` refresh rounds, executing each order on its tick after that
/// tick's quotes have been applied.
///
/// Order symbols are added to the watchlist up front so their quotes are
/// fetched; an order arriving before the symbol has any quoted price is
/// rejected rather than filled at zero. Provider errors degrade to "no
/// updates this tick".
pub fn run_replay(
    state: &mut TrackerState,
    port: &dyn QuotePort,
    orders: &[OrderInstruction],
    ticks: usize,
    start: DateTime<Utc>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    for order in orders {
        if !state.watchlist.contains(&order.symbol) {
            state.watchlist.toggle(&order.symbol);
        }
    }
    for symbol in state.refresh_symbols() {
        let info = port.resolve_symbol(&symbol).ok().flatten();
        match info {
            Some(info) => state.ensure_security(&info.symbol, &info.name, &info.industry),
            None => state.ensure_security(&symbol, &symbol, "Unknown"),
        };
    }

    for tick in 0..ticks {
        let now = start + Duration::seconds(tick as i64);
        let wanted = state.refresh_symbols();
        let quotes = port.fetch_quotes(&wanted).unwrap_or_default();
        summary.quotes_applied += state.apply_quotes(quotes);

        for order in orders.iter().filter(|order| order.tick == tick) {
            apply_order(state, order, now, &mut summary);
        }
        summary.ticks_run += 1;
    }

    summary
}

fn apply_order(
    state: &mut TrackerState,
    order: &OrderInstruction,
    now: DateTime<Utc>,
    summary: &mut ReplaySummary,
) {
    let has_price = state
        .records
        .get(&order.symbol)
        .is_some_and(|record| record.price > 0.0);
    if !has_price {
        summary.rejected.push(RejectedOrder {
            order: order.clone(),
            reason: "no quote received yet".to_string(),
        });
        return;
    }

    match state.trade(order.side, &order.symbol, order.quantity, now) {
        Some(TradeOutcome::Executed(record)) => summary.executed.push(record),
        Some(TradeOutcome::Rejected(reason)) => summary.rejected.push(RejectedOrder {
            order: order.clone(),
            reason: reason.to_string(),
        }),
        None => summary.rejected.push(RejectedOrder {
            order: order.clone(),
            reason: "unknown symbol".to_string(),
        }),
    }
}
