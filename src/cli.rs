//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::csv_quote_adapter::CsvQuoteFeed;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ma_advice_adapter::MaAdviceAdapter;
use crate::adapters::sim_quote_adapter::SimQuoteAdapter;
use crate::domain::advice::Recommendation;
use crate::domain::config::TrackerConfig;
use crate::domain::error::TickwatchError;
use crate::domain::ledger::{Portfolio, TradeSide};
use crate::domain::market_clock::{session_state, EXCHANGE_UTC_OFFSET_MINUTES};
use crate::domain::replay::{run_replay, OrderInstruction};
use crate::domain::security::SecurityRecord;
use crate::domain::tracker::TrackerState;
use crate::domain::watchlist::Watchlist;
use crate::ports::advice_port::AdvicePort;
use crate::ports::quote_port::QuotePort;
use crate::scheduler::{RefreshEvent, RefreshScheduler, SchedulerConfig};

#[derive(Parser, Debug)]
#[command(name = "tickwatch", about = "Watchlist tracker and paper-trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the exchange session state
    Session {
        /// Exchange-local time, "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = EXCHANGE_UTC_OFFSET_MINUTES)]
        utc_offset_minutes: i32,
    },
    /// Look up a symbol through the quote provider
    Resolve {
        query: String,
        #[arg(long)]
        feed: Option<PathBuf>,
    },
    /// Fetch and merge quote updates for one symbol
    Quote {
        symbol: String,
        #[arg(long)]
        feed: Option<PathBuf>,
        /// Number of refresh rounds to merge
        #[arg(long, default_value_t = 1)]
        ticks: usize,
        /// Simulator RNG seed (ignored with --feed)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show a recommendation for one symbol
    Advise {
        symbol: String,
        #[arg(long)]
        feed: Option<PathBuf>,
        #[arg(long, default_value_t = 25)]
        ticks: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Replay a recorded quote feed with scripted orders
    Replay {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        feed: PathBuf,
        #[arg(long)]
        orders: PathBuf,
        /// Refresh rounds to run (default: every feed tick)
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Track the watchlist live on the refresh scheduler
    Watch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        feed: Option<PathBuf>,
        /// Completed refreshes to run before exiting
        #[arg(long, default_value_t = 10)]
        ticks: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Session {
            at,
            utc_offset_minutes,
        } => run_session(at.as_deref(), utc_offset_minutes),
        Command::Resolve { query, feed } => run_resolve(&query, feed.as_deref()),
        Command::Quote {
            symbol,
            feed,
            ticks,
            seed,
        } => run_quote(&symbol, feed.as_deref(), ticks, seed),
        Command::Advise {
            symbol,
            feed,
            ticks,
            seed,
        } => run_advise(&symbol, feed.as_deref(), ticks, seed),
        Command::Replay {
            config,
            feed,
            orders,
            ticks,
        } => run_replay_command(config.as_deref(), &feed, &orders, ticks),
        Command::Watch {
            config,
            feed,
            ticks,
            seed,
        } => run_watch(config.as_deref(), feed.as_deref(), ticks, seed),
    }
}

fn fail(err: &TickwatchError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn load_tracker_config(path: Option<&Path>) -> Result<TrackerConfig, TickwatchError> {
    match path {
        Some(path) => {
            let adapter =
                FileConfigAdapter::from_file(path).map_err(|e| TickwatchError::ConfigParse {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            TrackerConfig::from_config(&adapter)
        }
        None => Ok(TrackerConfig::default()),
    }
}

fn build_port(
    feed: Option<&Path>,
    seed: Option<u64>,
) -> Result<Arc<dyn QuotePort + Send + Sync>, TickwatchError> {
    match feed {
        Some(path) => Ok(Arc::new(CsvQuoteFeed::from_file(path)?)),
        None => Ok(Arc::new(match seed {
            Some(seed) => SimQuoteAdapter::with_seed(seed),
            None => SimQuoteAdapter::new(),
        })),
    }
}

fn run_session(at: Option<&str>, utc_offset_minutes: i32) -> ExitCode {
    let now = match at {
        Some(raw) => match parse_local_time(raw, utc_offset_minutes) {
            Ok(now) => now,
            Err(err) => return fail(&err),
        },
        None => Utc::now(),
    };

    let state = session_state(now, utc_offset_minutes);
    println!("{state}");
    ExitCode::SUCCESS
}

fn parse_local_time(raw: &str, utc_offset_minutes: i32) -> Result<DateTime<Utc>, TickwatchError> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").map_err(|e| {
        TickwatchError::ConfigInvalid {
            section: "cli".to_string(),
            key: "at".to_string(),
            reason: format!("expected YYYY-MM-DD HH:MM: {e}"),
        }
    })?;
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
        TickwatchError::ConfigInvalid {
            section: "cli".to_string(),
            key: "utc_offset_minutes".to_string(),
            reason: "offset out of range".to_string(),
        }
    })?;
    let local = naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| TickwatchError::ConfigInvalid {
            section: "cli".to_string(),
            key: "at".to_string(),
            reason: "ambiguous local time".to_string(),
        })?;
    Ok(local.with_timezone(&Utc))
}

fn run_resolve(query: &str, feed: Option<&Path>) -> ExitCode {
    let port = match build_port(feed, None) {
        Ok(port) => port,
        Err(err) => return fail(&err),
    };
    match port.resolve_symbol(query) {
        Ok(Some(info)) => {
            println!("{}  {}  [{}]", info.symbol, info.name, info.industry);
            ExitCode::SUCCESS
        }
        Ok(None) => fail(&TickwatchError::UnknownSymbol {
            query: query.to_string(),
        }),
        Err(err) => fail(&err),
    }
}

/// Build a record for one symbol by merging `ticks` refresh rounds.
fn build_record(
    port: &dyn QuotePort,
    symbol: &str,
    ticks: usize,
) -> Result<SecurityRecord, TickwatchError> {
    let info = port
        .resolve_symbol(symbol)?
        .ok_or_else(|| TickwatchError::UnknownSymbol {
            query: symbol.to_string(),
        })?;

    let mut record = SecurityRecord::new(&info.symbol, &info.name, &info.industry);
    let wanted = vec![info.symbol.clone()];
    for _ in 0..ticks {
        let quotes = port.fetch_quotes(&wanted).unwrap_or_default();
        for quote in &quotes {
            if quote.symbol == record.symbol {
                crate::domain::reconcile::merge(&mut record, &quote.quote);
            }
        }
    }
    Ok(record)
}

fn print_record(record: &SecurityRecord) {
    println!("{}  {}  [{}]", record.symbol, record.name, record.industry);
    println!(
        "  price {:.2}  change {:+.2} ({:+.2}%)  volume {}",
        record.price, record.change, record.change_percent, record.volume
    );
    println!(
        "  ma5 {:.2}  ma10 {:.2}  ma20 {:.2}  obv {}",
        record.ma5, record.ma10, record.ma20, record.obv
    );
    if record.synthetic_history {
        println!("  (history window contains synthetic seed data)");
    }
}

fn run_quote(symbol: &str, feed: Option<&Path>, ticks: usize, seed: Option<u64>) -> ExitCode {
    let port = match build_port(feed, seed) {
        Ok(port) => port,
        Err(err) => return fail(&err),
    };
    match build_record(port.as_ref(), symbol, ticks.max(1)) {
        Ok(record) => {
            print_record(&record);
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err),
    }
}

fn run_advise(symbol: &str, feed: Option<&Path>, ticks: usize, seed: Option<u64>) -> ExitCode {
    let port = match build_port(feed, seed) {
        Ok(port) => port,
        Err(err) => return fail(&err),
    };
    let record = match build_record(port.as_ref(), symbol, ticks.max(1)) {
        Ok(record) => record,
        Err(err) => return fail(&err),
    };

    let advisor = MaAdviceAdapter::new();
    let recommendation = advisor
        .recommend(&record)
        .unwrap_or_else(|err| Recommendation::neutral(&err.to_string()));

    print_record(&record);
    println!(
        "  {} (confidence {}%)",
        recommendation.action, recommendation.confidence
    );
    println!("  {}", recommendation.summary);
    println!("  technical:   {}", recommendation.technical_note);
    println!("  fundamental: {}", recommendation.fundamental_note);
    ExitCode::SUCCESS
}

fn parse_orders(path: &Path) -> Result<Vec<OrderInstruction>, TickwatchError> {
    let file = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| TickwatchError::FeedParse {
        file: file.clone(),
        reason: e.to_string(),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut orders = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| TickwatchError::FeedParse {
            file: file.clone(),
            reason: format!("CSV parse error: {e}"),
        })?;

        let field = |index: usize, column: &str| -> Result<String, TickwatchError> {
            record
                .get(index)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| TickwatchError::FeedParse {
                    file: file.clone(),
                    reason: format!("missing {column} column"),
                })
        };

        let tick: usize = field(0, "tick")?
            .parse()
            .map_err(|e| TickwatchError::FeedParse {
                file: file.clone(),
                reason: format!("invalid tick value: {e}"),
            })?;
        let side = match field(1, "side")?.to_uppercase().as_str() {
            "BUY" => TradeSide::Buy,
            "SELL" => TradeSide::Sell,
            other => {
                return Err(TickwatchError::FeedParse {
                    file: file.clone(),
                    reason: format!("invalid side {other:?}, expected BUY or SELL"),
                })
            }
        };
        let symbol = field(2, "symbol")?;
        let quantity: i64 = field(3, "quantity")?
            .parse()
            .map_err(|e| TickwatchError::FeedParse {
                file: file.clone(),
                reason: format!("invalid quantity value: {e}"),
            })?;

        orders.push(OrderInstruction {
            tick,
            side,
            symbol,
            quantity,
        });
    }
    Ok(orders)
}

fn build_state(config: &TrackerConfig) -> Result<TrackerState, TickwatchError> {
    let portfolio = Portfolio::reset(config.initial_capital)?;
    let watchlist = Watchlist::from_symbols(config.watchlist.iter().cloned());
    Ok(TrackerState::new(portfolio, watchlist))
}

fn print_portfolio(state: &TrackerState) {
    println!("cash: {:.2}", state.portfolio.cash);
    let mut holdings: Vec<_> = state.portfolio.holdings.values().collect();
    holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    for holding in holdings {
        println!(
            "  {} {}  qty {}  avg cost {:.2}",
            holding.symbol, holding.name, holding.quantity, holding.average_cost
        );
    }
    println!("total equity: {:.2}", state.total_equity());
}

fn run_replay_command(
    config_path: Option<&Path>,
    feed_path: &Path,
    orders_path: &Path,
    ticks: Option<usize>,
) -> ExitCode {
    let config = match load_tracker_config(config_path) {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };
    let feed = match CsvQuoteFeed::from_file(feed_path) {
        Ok(feed) => feed,
        Err(err) => return fail(&err),
    };
    let orders = match parse_orders(orders_path) {
        Ok(orders) => orders,
        Err(err) => return fail(&err),
    };
    let mut state = match build_state(&config) {
        Ok(state) => state,
        Err(err) => return fail(&err),
    };

    let last_order_tick = orders.iter().map(|order| order.tick + 1).max().unwrap_or(0);
    let ticks = ticks.unwrap_or_else(|| feed.tick_count().max(last_order_tick));

    let summary = run_replay(&mut state, &feed, &orders, ticks, Utc::now());

    println!(
        "replayed {} ticks, {} quote updates applied",
        summary.ticks_run, summary.quotes_applied
    );
    for trade in &summary.executed {
        println!(
            "  #{} {} {} x{} @ {:.2} = {:.2}",
            trade.id, trade.side, trade.symbol, trade.quantity, trade.price, trade.amount
        );
    }
    for rejected in &summary.rejected {
        println!(
            "  rejected: {} {} x{} (tick {}): {}",
            rejected.order.side,
            rejected.order.symbol,
            rejected.order.quantity,
            rejected.order.tick,
            rejected.reason
        );
    }
    print_portfolio(&state);
    ExitCode::SUCCESS
}

fn run_watch(
    config_path: Option<&Path>,
    feed_path: Option<&Path>,
    ticks: usize,
    seed: Option<u64>,
) -> ExitCode {
    let config = match load_tracker_config(config_path) {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };
    let port = match build_port(feed_path, seed) {
        Ok(port) => port,
        Err(err) => return fail(&err),
    };
    let mut state = match build_state(&config) {
        Ok(state) => state,
        Err(err) => return fail(&err),
    };
    if state.watchlist.is_empty() {
        eprintln!("warning: empty watchlist, nothing to refresh");
    }
    for symbol in state.refresh_symbols() {
        match port.resolve_symbol(&symbol) {
            Ok(Some(info)) => {
                state.ensure_security(&info.symbol, &info.name, &info.industry);
            }
            _ => {
                state.ensure_security(&symbol, &symbol, "Unknown");
            }
        }
    }

    let symbols = Arc::new(Mutex::new(state.refresh_symbols()));
    let (tx, rx) = mpsc::channel();
    let scheduler = RefreshScheduler::spawn(
        SchedulerConfig {
            interval: Duration::from_millis(config.refresh_interval_ms),
            respect_session: config.respect_session,
            utc_offset_minutes: config.utc_offset_minutes,
        },
        Arc::clone(&port),
        Arc::clone(&symbols),
        tx,
    );

    let mut completed = 0;
    while completed < ticks {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };
        match event {
            RefreshEvent::Completed {
                quotes,
                provider_error,
            } => {
                if let Some(reason) = provider_error {
                    eprintln!("provider error, keeping stale data: {reason}");
                }
                let applied = state.apply_quotes(quotes);
                completed += 1;
                println!("tick {completed}: {applied} updates");
                let mut tracked: Vec<_> = state.records.values().collect();
                tracked.sort_by(|a, b| a.symbol.cmp(&b.symbol));
                for record in tracked {
                    print_record(record);
                }
                *symbols.lock().expect("symbol list poisoned") = state.refresh_symbols();
            }
            RefreshEvent::SkippedClosed { state: session } => {
                println!("market {session}, refresh skipped");
            }
            RefreshEvent::SkippedBusy => {
                println!("refresh still in flight, tick skipped");
            }
        }
    }

    drop(scheduler);
    print_portfolio(&state);
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_local_time_handles_exchange_offset() {
        let utc = parse_local_time("2024-01-16 09:15", EXCHANGE_UTC_OFFSET_MINUTES).unwrap();
        // 09:15 at UTC+8 is 01:15 UTC.
        assert_eq!(utc.to_rfc3339(), "2024-01-16T01:15:00+00:00");
    }

    #[test]
    fn parse_local_time_rejects_garbage() {
        assert!(parse_local_time("yesterday", EXCHANGE_UTC_OFFSET_MINUTES).is_err());
    }

    #[test]
    fn orders_parse_and_validate_side() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick,side,symbol,quantity").unwrap();
        writeln!(file, "0,buy,2330,1000").unwrap();
        writeln!(file, "2,SELL,2330,500").unwrap();

        let orders = parse_orders(file.path()).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, TradeSide::Buy);
        assert_eq!(orders[1].tick, 2);
    }

    #[test]
    fn orders_reject_unknown_side() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick,side,symbol,quantity").unwrap();
        writeln!(file, "0,SHORT,2330,1000").unwrap();

        let err = parse_orders(file.path()).unwrap_err();
        assert!(err.to_string().contains("SHORT"));
    }
}
