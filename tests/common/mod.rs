#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use tickwatch::domain::error::TickwatchError;
use tickwatch::domain::ledger::Portfolio;
use tickwatch::domain::security::{PartialQuote, SecurityRecord, SymbolInfo, SymbolQuote};
use tickwatch::domain::tracker::TrackerState;
use tickwatch::domain::watchlist::Watchlist;
use tickwatch::ports::quote_port::QuotePort;

/// Scripted quote provider: hands out one pre-built batch per fetch, then
/// empty batches; can be told to fail every call instead.
pub struct MockQuotePort {
    batches: Mutex<Vec<Vec<SymbolQuote>>>,
    pub known: HashMap<String, SymbolInfo>,
    pub failing: bool,
}

impl MockQuotePort {
    pub fn new() -> Self {
        MockQuotePort {
            batches: Mutex::new(Vec::new()),
            known: HashMap::new(),
            failing: false,
        }
    }

    pub fn with_batch(self, batch: Vec<SymbolQuote>) -> Self {
        self.batches.lock().unwrap().push(batch);
        self
    }

    pub fn with_symbol(mut self, symbol: &str, name: &str, industry: &str) -> Self {
        self.known.insert(
            symbol.to_string(),
            SymbolInfo {
                symbol: symbol.to_string(),
                name: name.to_string(),
                industry: industry.to_string(),
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<SymbolQuote>, TickwatchError> {
        if self.failing {
            return Err(TickwatchError::ProviderUnavailable {
                reason: "mock outage".into(),
            });
        }
        let mut batches = self.batches.lock().unwrap();
        if batches.is_empty() {
            return Ok(Vec::new());
        }
        let batch = batches.remove(0);
        Ok(batch
            .into_iter()
            .filter(|quote| symbols.contains(&quote.symbol))
            .collect())
    }

    fn resolve_symbol(&self, query: &str) -> Result<Option<SymbolInfo>, TickwatchError> {
        Ok(self.known.get(query).cloned())
    }
}

pub fn price_update(price: f64) -> PartialQuote {
    PartialQuote {
        price: Some(price),
        ..PartialQuote::default()
    }
}

pub fn quote(symbol: &str, price: f64) -> SymbolQuote {
    SymbolQuote {
        symbol: symbol.to_string(),
        quote: price_update(price),
    }
}

pub fn full_quote(symbol: &str, price: f64, change: f64, volume: i64) -> SymbolQuote {
    SymbolQuote {
        symbol: symbol.to_string(),
        quote: PartialQuote {
            price: Some(price),
            change: Some(change),
            change_percent: Some(change / (price - change) * 100.0),
            open: None,
            high: None,
            low: None,
            volume: Some(volume),
        },
    }
}

pub fn record_with_price(symbol: &str, price: f64) -> SecurityRecord {
    let mut record = SecurityRecord::new(symbol, symbol, "Test");
    record.price = price;
    record
}

pub fn tracker(capital: f64, watched: &[&str]) -> TrackerState {
    let mut state = TrackerState::new(
        Portfolio::new(capital),
        Watchlist::from_symbols(watched.iter().copied()),
    );
    for symbol in watched {
        state.ensure_security(symbol, symbol, "Test");
    }
    state
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 16, 1, 30, 0).unwrap()
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
