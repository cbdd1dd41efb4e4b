//! Tracked-symbol watchlist.

/// An ordered set of tracked symbols, newest first. Membership drives which
/// symbols the refresh cycle asks the quote provider about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Watchlist::default()
    }

    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut watchlist = Watchlist::new();
        for symbol in symbols {
            let symbol = symbol.into();
            if !watchlist.contains(&symbol) {
                watchlist.symbols.push(symbol);
            }
        }
        watchlist
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Remove the symbol if tracked, otherwise prepend it. Never produces a
    /// duplicate; toggling twice restores the previous membership.
    pub fn toggle(&mut self, symbol: &str) {
        if let Some(index) = self.symbols.iter().position(|s| s == symbol) {
            self.symbols.remove(index);
        } else {
            self.symbols.insert(0, symbol.to_string());
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
