//! Quote provider port trait.

use crate::domain::error::TickwatchError;
use crate::domain::security::{SymbolInfo, SymbolQuote};

/// External source of market quotes and symbol lookups.
///
/// `fetch_quotes` may return fewer entries than requested; a missing entry
/// means "no update for that symbol". Callers degrade an `Err` to an empty
/// batch so the reconciliation path keeps running on stale data.
pub trait QuotePort {
    fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<SymbolQuote>, TickwatchError>;

    fn resolve_symbol(&self, query: &str) -> Result<Option<SymbolInfo>, TickwatchError>;
}
