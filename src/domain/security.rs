//! Per-symbol market snapshot and partial quote updates.

use std::collections::VecDeque;

/// Fixed capacity of the rolling price history window.
pub const HISTORY_WINDOW: usize = 30;

/// The mutable per-symbol snapshot: identity, latest market fields, and the
/// derived indicators recomputed on every quote merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRecord {
    pub symbol: String,
    pub name: String,
    pub industry: String,

    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,

    /// Rolling window of recent prices, oldest first, at most
    /// [`HISTORY_WINDOW`] entries.
    pub history: VecDeque<f64>,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    /// Cumulative volume accumulator. Direction-agnostic: every merge adds
    /// the update's volume, down moves included. Not textbook OBV.
    pub obv: i64,
    /// True while `history` still contains the synthesized seed walk rather
    /// than observed prices only.
    pub synthetic_history: bool,
}

impl SecurityRecord {
    /// A freshly observed security: no market data yet, empty history.
    pub fn new(symbol: &str, name: &str, industry: &str) -> Self {
        SecurityRecord {
            symbol: symbol.to_string(),
            name: name.to_string(),
            industry: industry.to_string(),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            volume: 0,
            history: VecDeque::with_capacity(HISTORY_WINDOW),
            ma5: 0.0,
            ma10: 0.0,
            ma20: 0.0,
            obv: 0,
            synthetic_history: false,
        }
    }

    pub fn market_value(&self, quantity: i64) -> f64 {
        quantity as f64 * self.price
    }
}

/// One asynchronously delivered quote update. Every field is optional:
/// absence means "no new information", which is distinct from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialQuote {
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
}

impl PartialQuote {
    pub fn is_empty(&self) -> bool {
        self == &PartialQuote::default()
    }
}

/// A quote update tagged with the symbol it belongs to, as returned by the
/// quote provider in batches.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolQuote {
    pub symbol: String,
    pub quote: PartialQuote,
}

/// Resolution result from the symbol lookup provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: String,
    pub industry: String,
}
