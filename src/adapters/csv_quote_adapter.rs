//! CSV quote feed adapter.
//!
//! Replays a recorded quote feed deterministically: each `fetch_quotes` call
//! delivers the next tick's batch. Feed rows are grouped by their tick number;
//! empty cells mean the field was absent from that update.
//!
//! Tick numbers are 1-based and positional: tick `t` is delivered by the
//! `t`-th fetch call, and a tick with no rows delivers an empty batch. A feed
//! starting at tick 2 therefore yields nothing on the first call.
//!
//! Expected columns: `tick,symbol,price,change,change_percent,volume`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crate::domain::error::TickwatchError;
use crate::domain::security::{PartialQuote, SymbolInfo, SymbolQuote};
use crate::ports::quote_port::QuotePort;

#[derive(Debug)]
pub struct CsvQuoteFeed {
    ticks: Vec<Vec<SymbolQuote>>,
    symbols: Vec<String>,
    cursor: Mutex<usize>,
}

impl CsvQuoteFeed {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TickwatchError> {
        let file = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| TickwatchError::FeedParse {
            file: file.clone(),
            reason: e.to_string(),
        })?;
        Self::from_reader(content.as_bytes(), &file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R, file: &str) -> Result<Self, TickwatchError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut batches: BTreeMap<u64, Vec<SymbolQuote>> = BTreeMap::new();
        let mut symbols = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TickwatchError::FeedParse {
                file: file.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;

            let tick: u64 = parse_required(&record, 0, "tick", file)?;
            if tick == 0 {
                return Err(TickwatchError::FeedParse {
                    file: file.to_string(),
                    reason: "tick numbers start at 1".to_string(),
                });
            }
            let symbol = record
                .get(1)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| TickwatchError::FeedParse {
                    file: file.to_string(),
                    reason: "missing symbol column".to_string(),
                })?
                .to_string();

            let quote = PartialQuote {
                price: parse_optional(&record, 2, "price", file)?,
                change: parse_optional(&record, 3, "change", file)?,
                change_percent: parse_optional(&record, 4, "change_percent", file)?,
                open: None,
                high: None,
                low: None,
                volume: parse_optional(&record, 5, "volume", file)?,
            };

            if !symbols.contains(&symbol) {
                symbols.push(symbol.clone());
            }
            batches
                .entry(tick)
                .or_default()
                .push(SymbolQuote { symbol, quote });
        }

        // Tick positions are preserved: a numbering gap becomes an empty
        // batch, not a compacted-away slot.
        let last_tick = batches.keys().max().copied().unwrap_or(0) as usize;
        let mut ticks = vec![Vec::new(); last_tick];
        for (tick, batch) in batches {
            ticks[tick as usize - 1] = batch;
        }

        Ok(CsvQuoteFeed {
            ticks,
            symbols,
            cursor: Mutex::new(0),
        })
    }

    /// Number of tick slots in the feed (the highest tick number seen).
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// Symbols that appear anywhere in the feed, in first-seen order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

fn parse_required<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    file: &str,
) -> Result<T, TickwatchError>
where
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TickwatchError::FeedParse {
            file: file.to_string(),
            reason: format!("missing {column} column"),
        })?;
    raw.parse().map_err(|e| TickwatchError::FeedParse {
        file: file.to_string(),
        reason: format!("invalid {column} value {raw:?}: {e}"),
    })
}

fn parse_optional<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    column: &str,
    file: &str,
) -> Result<Option<T>, TickwatchError>
where
    T::Err: std::fmt::Display,
{
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e| TickwatchError::FeedParse {
            file: file.to_string(),
            reason: format!("invalid {column} value {raw:?}: {e}"),
        }),
    }
}

impl QuotePort for CsvQuoteFeed {
    /// Deliver the next tick batch, filtered to the requested symbols.
    /// An exhausted feed returns empty batches so the caller just sees
    /// "no updates" rather than an error.
    fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<SymbolQuote>, TickwatchError> {
        let mut cursor = self.cursor.lock().expect("feed cursor poisoned");
        let Some(batch) = self.ticks.get(*cursor) else {
            return Ok(Vec::new());
        };
        *cursor += 1;
        Ok(batch
            .iter()
            .filter(|quote| symbols.contains(&quote.symbol))
            .cloned()
            .collect())
    }

    fn resolve_symbol(&self, query: &str) -> Result<Option<SymbolInfo>, TickwatchError> {
        let query = query.trim();
        Ok(self
            .symbols
            .iter()
            .find(|symbol| symbol.as_str() == query)
            .map(|symbol| SymbolInfo {
                symbol: symbol.clone(),
                name: symbol.clone(),
                industry: "Unknown".to_string(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
tick,symbol,price,change,change_percent,volume
1,2330,1080,12,1.12,25000
1,2317,180.5,,,3000
2,2330,1085,,,
3,2330,1090,5,0.46,8000
";

    fn feed() -> CsvQuoteFeed {
        CsvQuoteFeed::from_reader(FEED.as_bytes(), "test.csv").unwrap()
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_rows_by_tick() {
        let feed = feed();
        assert_eq!(feed.tick_count(), 3);
        assert_eq!(feed.symbols(), ["2330", "2317"]);
    }

    #[test]
    fn fetch_advances_one_tick_per_call() {
        let feed = feed();
        let wanted = symbols(&["2330", "2317"]);

        let first = feed.fetch_quotes(&wanted).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].quote.price, Some(1080.0));
        assert_eq!(first[0].quote.volume, Some(25000));

        let second = feed.fetch_quotes(&wanted).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].quote.price, Some(1085.0));
        assert_eq!(second[0].quote.change, None);
        assert_eq!(second[0].quote.volume, None);
    }

    #[test]
    fn empty_cells_mean_absent_not_zero() {
        let feed = feed();
        let batch = feed.fetch_quotes(&symbols(&["2317"])).unwrap();
        assert_eq!(batch.len(), 1);
        let quote = &batch[0].quote;
        assert_eq!(quote.price, Some(180.5));
        assert_eq!(quote.change, None);
        assert_eq!(quote.change_percent, None);
        assert_eq!(quote.volume, Some(3000));
    }

    #[test]
    fn unrequested_symbols_are_filtered_out() {
        let feed = feed();
        let batch = feed.fetch_quotes(&symbols(&["2330"])).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].symbol, "2330");
    }

    #[test]
    fn exhausted_feed_returns_empty_batches() {
        let feed = feed();
        let wanted = symbols(&["2330"]);
        for _ in 0..3 {
            feed.fetch_quotes(&wanted).unwrap();
        }
        assert!(feed.fetch_quotes(&wanted).unwrap().is_empty());
        assert!(feed.fetch_quotes(&wanted).unwrap().is_empty());
    }

    #[test]
    fn leading_tick_gap_delivers_empty_batches_first() {
        let late = "\
tick,symbol,price,change,change_percent,volume
3,2330,1080,,,1000
";
        let feed = CsvQuoteFeed::from_reader(late.as_bytes(), "late.csv").unwrap();
        let wanted = symbols(&["2330"]);

        assert_eq!(feed.tick_count(), 3);
        assert!(feed.fetch_quotes(&wanted).unwrap().is_empty());
        assert!(feed.fetch_quotes(&wanted).unwrap().is_empty());
        let third = feed.fetch_quotes(&wanted).unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].quote.price, Some(1080.0));
    }

    #[test]
    fn interior_tick_gap_is_an_empty_batch() {
        let gappy = "\
tick,symbol,price,change,change_percent,volume
1,2330,1080,,,1000
3,2330,1100,,,2000
";
        let feed = CsvQuoteFeed::from_reader(gappy.as_bytes(), "gappy.csv").unwrap();
        let wanted = symbols(&["2330"]);

        assert_eq!(feed.fetch_quotes(&wanted).unwrap().len(), 1);
        assert!(feed.fetch_quotes(&wanted).unwrap().is_empty());
        assert_eq!(feed.fetch_quotes(&wanted).unwrap().len(), 1);
    }

    #[test]
    fn tick_zero_is_rejected_at_load_time() {
        let bad = "tick,symbol,price,change,change_percent,volume\n0,2330,1080,,,\n";
        let err = CsvQuoteFeed::from_reader(bad.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("start at 1"));
    }

    #[test]
    fn malformed_rows_fail_at_load_time() {
        let bad = "tick,symbol,price,change,change_percent,volume\nx,2330,1080,,,\n";
        let err = CsvQuoteFeed::from_reader(bad.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.to_string().contains("tick"));
    }

    #[test]
    fn resolve_finds_feed_symbols_only() {
        let feed = feed();
        assert!(feed.resolve_symbol("2330").unwrap().is_some());
        assert!(feed.resolve_symbol("9999").unwrap().is_none());
    }
}
