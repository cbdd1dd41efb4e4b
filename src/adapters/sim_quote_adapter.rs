//! Simulated quote provider.
//!
//! Random-walk quotes over a small built-in symbol table, used when no feed
//! file is given. Occasionally leaves fields absent so downstream merge
//! handling of partial updates gets exercised in live runs too.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::error::TickwatchError;
use crate::domain::security::{PartialQuote, SymbolInfo, SymbolQuote};
use crate::ports::quote_port::QuotePort;

/// Built-in symbol table: (symbol, name, industry, reference price).
const SYMBOL_TABLE: &[(&str, &str, &str, f64)] = &[
    ("2330", "Taiwan Semiconductor", "Semiconductors", 1080.0),
    ("2317", "Hon Hai Precision", "Electronics", 183.5),
    ("2454", "MediaTek", "Semiconductors", 1250.0),
    ("2412", "Chunghwa Telecom", "Telecommunications", 122.0),
    ("2603", "Evergreen Marine", "Shipping", 214.5),
    ("2881", "Fubon Financial", "Financials", 90.1),
    ("3008", "Largan Precision", "Optoelectronics", 2340.0),
    ("1301", "Formosa Plastics", "Plastics", 46.2),
];

/// Maximum per-tick price move (±2%).
const WALK_STEP: f64 = 0.02;

struct SimState {
    rng: StdRng,
    prices: HashMap<String, f64>,
    opens: HashMap<String, f64>,
}

pub struct SimQuoteAdapter {
    state: Mutex<SimState>,
}

impl SimQuoteAdapter {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic construction for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        SimQuoteAdapter {
            state: Mutex::new(SimState {
                rng: StdRng::seed_from_u64(seed),
                prices: HashMap::new(),
                opens: HashMap::new(),
            }),
        }
    }

    fn reference_price(symbol: &str) -> Option<f64> {
        SYMBOL_TABLE
            .iter()
            .find(|(s, _, _, _)| *s == symbol)
            .map(|(_, _, _, price)| *price)
    }
}

impl Default for SimQuoteAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotePort for SimQuoteAdapter {
    fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<SymbolQuote>, TickwatchError> {
        let state = &mut *self.state.lock().expect("sim state poisoned");
        let mut quotes = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            // Unknown symbols simply get no update, mirroring a provider
            // returning fewer entries than requested.
            let Some(reference) = Self::reference_price(symbol) else {
                continue;
            };

            let last = *state.prices.get(symbol).unwrap_or(&reference);
            let step = state.rng.gen_range(-WALK_STEP..=WALK_STEP);
            let price = crate::domain::reconcile::round2(last * (1.0 + step));
            state.prices.insert(symbol.clone(), price);
            let open = *state.opens.entry(symbol.clone()).or_insert(last);

            let change = crate::domain::reconcile::round2(price - open);
            let change_percent = if open > 0.0 {
                crate::domain::reconcile::round2(change / open * 100.0)
            } else {
                0.0
            };

            // Roughly one update in eight arrives price-only.
            let sparse = state.rng.gen_ratio(1, 8);
            let quote = if sparse {
                PartialQuote {
                    price: Some(price),
                    ..PartialQuote::default()
                }
            } else {
                PartialQuote {
                    price: Some(price),
                    change: Some(change),
                    change_percent: Some(change_percent),
                    open: Some(open),
                    high: Some(price.max(open)),
                    low: Some(price.min(open)),
                    volume: Some(state.rng.gen_range(1_000..50_000)),
                }
            };
            quotes.push(SymbolQuote {
                symbol: symbol.clone(),
                quote,
            });
        }

        Ok(quotes)
    }

    fn resolve_symbol(&self, query: &str) -> Result<Option<SymbolInfo>, TickwatchError> {
        let query = query.trim();
        Ok(SYMBOL_TABLE
            .iter()
            .find(|(symbol, name, _, _)| {
                *symbol == query || name.to_lowercase().contains(&query.to_lowercase())
            })
            .map(|(symbol, name, industry, _)| SymbolInfo {
                symbol: symbol.to_string(),
                name: name.to_string(),
                industry: industry.to_string(),
            }))
    }
}
