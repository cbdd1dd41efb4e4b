//! Owned application state: portfolio, watchlist, and the symbol → record
//! registry that quote refreshes are applied to.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::ledger::{execute_trade, Portfolio, TradeOutcome, TradeSide};
use super::reconcile;
use super::security::{SecurityRecord, SymbolQuote};
use super::watchlist::Watchlist;

/// All mutable tracker state, owned by a single caller. No ambient state:
/// the refresh scheduler and the UI both go through this struct's methods.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub portfolio: Portfolio,
    pub watchlist: Watchlist,
    pub records: HashMap<String, SecurityRecord>,
    /// Symbol currently on screen, if any; kept refreshed even when it is
    /// neither watched nor held.
    pub viewed: Option<String>,
}

impl TrackerState {
    pub fn new(portfolio: Portfolio, watchlist: Watchlist) -> Self {
        TrackerState {
            portfolio,
            watchlist,
            records: HashMap::new(),
            viewed: None,
        }
    }

    /// Create the record for a symbol on first observation; later calls
    /// return the existing record untouched.
    pub fn ensure_security(&mut self, symbol: &str, name: &str, industry: &str) -> &mut SecurityRecord {
        self.records
            .entry(symbol.to_string())
            .or_insert_with(|| SecurityRecord::new(symbol, name, industry))
    }

    /// The symbols the next refresh should ask the provider about:
    /// watchlist plus held positions plus the viewed symbol.
    pub fn refresh_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.watchlist.symbols().to_vec();
        for symbol in self.portfolio.holdings.keys() {
            if !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.clone());
            }
        }
        if let Some(viewed) = &self.viewed {
            if !symbols.iter().any(|s| s == viewed) {
                symbols.push(viewed.clone());
            }
        }
        symbols
    }

    /// Whether a refresh result for this symbol is still wanted. Late
    /// results for discarded symbols are dropped by [`apply_quotes`].
    ///
    /// [`apply_quotes`]: TrackerState::apply_quotes
    pub fn is_of_interest(&self, symbol: &str) -> bool {
        self.watchlist.contains(symbol)
            || self.portfolio.has_holding(symbol)
            || self.viewed.as_deref() == Some(symbol)
    }

    /// Merge a batch of quote updates into the registry. Returns how many
    /// updates were applied; updates for unknown or no-longer-interesting
    /// symbols are silently discarded.
    pub fn apply_quotes(&mut self, quotes: Vec<SymbolQuote>) -> usize {
        let mut applied = 0;
        for SymbolQuote { symbol, quote } in quotes {
            if !self.is_of_interest(&symbol) {
                continue;
            }
            let Some(record) = self.records.get_mut(&symbol) else {
                continue;
            };
            reconcile::merge(record, &quote);
            applied += 1;
        }
        applied
    }

    /// Execute a market order against the latest known record for `symbol`.
    /// An unknown symbol behaves like any other rejected precondition:
    /// nothing changes.
    pub fn trade(
        &mut self,
        side: TradeSide,
        symbol: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Option<TradeOutcome> {
        let record = self.records.get(symbol)?;
        Some(execute_trade(&mut self.portfolio, side, record, quantity, now))
    }

    /// Drop records nobody needs anymore (not watched, not held, not viewed).
    pub fn prune_records(&mut self) {
        let keep: Vec<String> = self
            .records
            .keys()
            .filter(|symbol| self.is_of_interest(symbol))
            .cloned()
            .collect();
        self.records.retain(|symbol, _| keep.contains(symbol));
    }

    /// Last known prices for mark-to-market valuation.
    pub fn price_map(&self) -> HashMap<String, f64> {
        self.records
            .iter()
            .filter(|(_, record)| record.price > 0.0)
            .map(|(symbol, record)| (symbol.clone(), record.price))
            .collect()
    }

    pub fn total_equity(&self) -> f64 {
        self.portfolio.total_equity(&self.price_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::security::PartialQuote;
    use chrono::TimeZone;

    fn state_with(symbols: &[&str], capital: f64) -> TrackerState {
        let mut state = TrackerState::new(
            Portfolio::new(capital),
            Watchlist::from_symbols(symbols.iter().copied()),
        );
        for symbol in symbols {
            state.ensure_security(symbol, symbol, "Test");
        }
        state
    }

    fn price_update(price: f64) -> PartialQuote {
        PartialQuote {
            price: Some(price),
            ..PartialQuote::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, 2, 0, 0).unwrap()
    }

    #[test]
    fn ensure_security_creates_once() {
        let mut state = state_with(&[], 100_000.0);
        state.ensure_security("2330", "TSMC", "Semiconductors");
        state.records.get_mut("2330").unwrap().price = 1_080.0;
        state.ensure_security("2330", "renamed", "other");

        let record = &state.records["2330"];
        assert_eq!(record.name, "TSMC");
        assert!((record.price - 1_080.0).abs() < f64::EPSILON);
    }

    #[test]
    fn refresh_symbols_covers_watchlist_holdings_and_viewed() {
        let mut state = state_with(&["2330", "2317"], 1_000_000.0);
        state.ensure_security("2454", "MediaTek", "Semiconductors");
        state.records.get_mut("2454").unwrap().price = 100.0;
        state.trade(TradeSide::Buy, "2454", 10, now());
        state.viewed = Some("3008".to_string());

        let symbols = state.refresh_symbols();
        for expected in ["2330", "2317", "2454", "3008"] {
            assert!(symbols.iter().any(|s| s == expected), "missing {expected}");
        }
        assert_eq!(symbols.len(), 4);
    }

    #[test]
    fn apply_quotes_discards_uninteresting_symbols() {
        let mut state = state_with(&["2330"], 100_000.0);
        // A record left over after the symbol was untracked.
        state.ensure_security("2317", "Hon Hai", "Electronics");

        let applied = state.apply_quotes(vec![
            SymbolQuote {
                symbol: "2330".into(),
                quote: price_update(1_080.0),
            },
            SymbolQuote {
                symbol: "2317".into(),
                quote: price_update(180.0),
            },
        ]);

        assert_eq!(applied, 1);
        assert!((state.records["2330"].price - 1_080.0).abs() < f64::EPSILON);
        assert!((state.records["2317"].price - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn held_symbol_still_receives_quotes_after_untracking() {
        let mut state = state_with(&["2330"], 2_000_000.0);
        state.apply_quotes(vec![SymbolQuote {
            symbol: "2330".into(),
            quote: price_update(1_000.0),
        }]);
        state.trade(TradeSide::Buy, "2330", 100, now());
        state.watchlist.toggle("2330");

        let applied = state.apply_quotes(vec![SymbolQuote {
            symbol: "2330".into(),
            quote: price_update(1_050.0),
        }]);
        assert_eq!(applied, 1);
        assert!((state.records["2330"].price - 1_050.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trade_on_unknown_symbol_is_a_no_op() {
        let mut state = state_with(&[], 100_000.0);
        let before = state.portfolio.clone();
        assert!(state.trade(TradeSide::Buy, "9999", 10, now()).is_none());
        assert_eq!(state.portfolio, before);
    }

    #[test]
    fn prune_drops_only_discarded_records() {
        let mut state = state_with(&["2330"], 2_000_000.0);
        state.ensure_security("2317", "Hon Hai", "Electronics");
        state.ensure_security("2454", "MediaTek", "Semiconductors");
        state.records.get_mut("2454").unwrap().price = 900.0;
        state.trade(TradeSide::Buy, "2454", 10, now());

        state.prune_records();

        assert!(state.records.contains_key("2330")); // watched
        assert!(state.records.contains_key("2454")); // held
        assert!(!state.records.contains_key("2317")); // neither
    }

    #[test]
    fn total_equity_uses_latest_prices() {
        let mut state = state_with(&["2330"], 2_000_000.0);
        state.apply_quotes(vec![SymbolQuote {
            symbol: "2330".into(),
            quote: price_update(1_000.0),
        }]);
        state.trade(TradeSide::Buy, "2330", 1_000, now());
        state.apply_quotes(vec![SymbolQuote {
            symbol: "2330".into(),
            quote: price_update(1_100.0),
        }]);

        assert!((state.total_equity() - 2_100_000.0).abs() < 1e-6);
    }
}
