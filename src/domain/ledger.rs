//! Cash-and-holdings ledger with weighted-average cost accounting.
//!
//! Market orders execute atomically against the security's last known price:
//! either every portfolio field changes together or nothing changes. A failed
//! precondition is a rejection, not an error.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::error::TickwatchError;
use super::security::SecurityRecord;

/// Upper bound on an accepted initial capital.
pub const MAX_INITIAL_CAPITAL: f64 = 1e12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// A position in the portfolio. Never exists with `quantity == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    /// Weighted-average per-share cost basis. Recomputed on buys only;
    /// selling leaves the basis of the remaining shares unchanged.
    pub average_cost: f64,
}

impl Holding {
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.average_cost
    }
}

/// Immutable, append-only log entry for one executed trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub id: u64,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: i64,
    pub amount: f64,
    pub executed_at: DateTime<Utc>,
}

/// Why a trade request left the portfolio untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NonPositiveQuantity,
    NoMarketPrice,
    InsufficientCash,
    InsufficientShares,
    NoHolding,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            RejectReason::NonPositiveQuantity => "quantity must be positive",
            RejectReason::NoMarketPrice => "no market price for security",
            RejectReason::InsufficientCash => "insufficient cash",
            RejectReason::InsufficientShares => "insufficient shares held",
            RejectReason::NoHolding => "no holding for symbol",
        };
        write!(f, "{reason}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Executed(TradeRecord),
    Rejected(RejectReason),
}

impl TradeOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, TradeOutcome::Executed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub holdings: HashMap<String, Holding>,
    pub history: Vec<TradeRecord>,
    next_trade_id: u64,
}

impl Portfolio {
    /// A fresh portfolio; the capital must already be validated
    /// (see [`Portfolio::reset`] for the checked entry point).
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            holdings: HashMap::new(),
            history: Vec::new(),
            next_trade_id: 1,
        }
    }

    /// Full replacement with a validated starting balance. Out-of-range
    /// capital is rejected outright, never clamped.
    pub fn reset(new_capital: f64) -> Result<Self, TickwatchError> {
        if !new_capital.is_finite() {
            return Err(TickwatchError::InvalidCapital {
                value: new_capital,
                reason: "capital must be a finite number".into(),
            });
        }
        if new_capital <= 0.0 {
            return Err(TickwatchError::InvalidCapital {
                value: new_capital,
                reason: "capital must be positive".into(),
            });
        }
        if new_capital > MAX_INITIAL_CAPITAL {
            return Err(TickwatchError::InvalidCapital {
                value: new_capital,
                reason: format!("capital exceeds maximum of {MAX_INITIAL_CAPITAL}"),
            });
        }
        Ok(Portfolio::new(new_capital))
    }

    pub fn get_holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn has_holding(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }

    /// Largest quantity a buy at `price` can currently afford.
    pub fn max_affordable(&self, price: f64) -> i64 {
        if price <= 0.0 {
            return 0;
        }
        (self.cash / price).floor() as i64
    }

    /// Mark-to-market value of all holdings off a symbol → price map.
    /// A holding with no quoted price is valued at its cost basis.
    pub fn holdings_value(&self, price_map: &HashMap<String, f64>) -> f64 {
        self.holdings
            .values()
            .map(|holding| {
                let price = price_map
                    .get(&holding.symbol)
                    .copied()
                    .unwrap_or(holding.average_cost);
                holding.quantity as f64 * price
            })
            .sum()
    }

    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        self.cash + self.holdings_value(price_map)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        id
    }
}

/// Execute a market order against the security's current price.
///
/// Preconditions are checked before any mutation; a rejection leaves the
/// portfolio value-identical to its pre-call state. The caller is expected to
/// have already gated the action (e.g. via [`Portfolio::max_affordable`]);
/// enforcement here is the backstop.
pub fn execute_trade(
    portfolio: &mut Portfolio,
    side: TradeSide,
    security: &SecurityRecord,
    quantity: i64,
    now: DateTime<Utc>,
) -> TradeOutcome {
    if quantity <= 0 {
        return TradeOutcome::Rejected(RejectReason::NonPositiveQuantity);
    }
    // A record that has never been merged still carries price 0; executing
    // against it would hand out free shares.
    if !security.price.is_finite() || security.price <= 0.0 {
        return TradeOutcome::Rejected(RejectReason::NoMarketPrice);
    }

    let price = security.price;
    let amount = price * quantity as f64;

    match side {
        TradeSide::Buy => {
            if portfolio.cash < amount {
                return TradeOutcome::Rejected(RejectReason::InsufficientCash);
            }

            portfolio.cash -= amount;
            match portfolio.holdings.get_mut(&security.symbol) {
                Some(holding) => {
                    let old_qty = holding.quantity;
                    let new_qty = old_qty + quantity;
                    holding.average_cost =
                        (holding.average_cost * old_qty as f64 + amount) / new_qty as f64;
                    holding.quantity = new_qty;
                }
                None => {
                    portfolio.holdings.insert(
                        security.symbol.clone(),
                        Holding {
                            symbol: security.symbol.clone(),
                            name: security.name.clone(),
                            quantity,
                            average_cost: price,
                        },
                    );
                }
            }
        }
        TradeSide::Sell => {
            let Some(holding) = portfolio.holdings.get_mut(&security.symbol) else {
                return TradeOutcome::Rejected(RejectReason::NoHolding);
            };
            if holding.quantity < quantity {
                return TradeOutcome::Rejected(RejectReason::InsufficientShares);
            }

            portfolio.cash += amount;
            holding.quantity -= quantity;
            if holding.quantity == 0 {
                portfolio.holdings.remove(&security.symbol);
            }
        }
    }

    let record = TradeRecord {
        id: portfolio.next_id(),
        symbol: security.symbol.clone(),
        side,
        price,
        quantity,
        amount,
        executed_at: now,
    };
    portfolio.history.push(record.clone());
    TradeOutcome::Executed(record)
}
