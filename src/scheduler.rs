//! Periodic quote refresh driver.
//!
//! A background thread fires refresh ticks at a fixed interval and pushes
//! [`RefreshEvent`]s over an `mpsc` channel to the single owner thread, which
//! is the only place tracker state is mutated. A tick that lands while a
//! refresh is still in flight is skipped, not queued; the in-flight flag is
//! cleared by a drop guard on every exit path, provider failure included.
//! Dropping the scheduler cancels the timer and joins the thread; anything a
//! straggling refresh sends after teardown lands on a closed channel and is
//! discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::market_clock::{session_state, SessionState};
use crate::domain::security::SymbolQuote;
use crate::ports::quote_port::QuotePort;

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// A refresh finished. On provider failure the batch is empty and the
    /// diagnostic is carried alongside; the owner keeps stale records either
    /// way.
    Completed {
        quotes: Vec<SymbolQuote>,
        provider_error: Option<String>,
    },
    /// Tick fired outside the trading session.
    SkippedClosed { state: SessionState },
    /// Tick fired while an earlier refresh was still in flight.
    SkippedBusy,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub respect_session: bool,
    pub utc_offset_minutes: i32,
}

/// Decide what a tick at `now` should do. Pure so the session gating is
/// testable without threads.
pub fn gate_tick(config: &SchedulerConfig, now: DateTime<Utc>) -> Option<SessionState> {
    if !config.respect_session {
        return None;
    }
    match session_state(now, config.utc_offset_minutes) {
        SessionState::Open => None,
        state => Some(state),
    }
}

/// Run one refresh through the overlap guard. Shared by the timer thread and
/// any manual refresh trigger; whoever loses the swap reports a busy skip.
pub fn run_refresh(
    in_flight: &AtomicBool,
    port: &dyn QuotePort,
    symbols: &[String],
    tx: &Sender<RefreshEvent>,
) {
    if in_flight.swap(true, Ordering::SeqCst) {
        let _ = tx.send(RefreshEvent::SkippedBusy);
        return;
    }
    let _clear = ClearOnDrop(in_flight);

    let (quotes, provider_error) = match port.fetch_quotes(symbols) {
        Ok(quotes) => (quotes, None),
        Err(err) => (Vec::new(), Some(err.to_string())),
    };
    let _ = tx.send(RefreshEvent::Completed {
        quotes,
        provider_error,
    });
}

struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct RefreshScheduler {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawn the timer thread. `symbols` is shared with the owner thread so
    /// watchlist changes take effect on the next tick.
    pub fn spawn(
        config: SchedulerConfig,
        port: Arc<dyn QuotePort + Send + Sync>,
        symbols: Arc<Mutex<Vec<String>>>,
        tx: Sender<RefreshEvent>,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let in_flight = AtomicBool::new(false);

        let thread_cancel = Arc::clone(&cancel);
        let handle = std::thread::spawn(move || {
            while !thread_cancel.load(Ordering::SeqCst) {
                sleep_cancellable(config.interval, &thread_cancel);
                if thread_cancel.load(Ordering::SeqCst) {
                    break;
                }

                if let Some(state) = gate_tick(&config, Utc::now()) {
                    if tx.send(RefreshEvent::SkippedClosed { state }).is_err() {
                        break;
                    }
                    continue;
                }

                let wanted = symbols.lock().expect("symbol list poisoned").clone();
                run_refresh(&in_flight, port.as_ref(), &wanted, &tx);
            }
        });

        RefreshScheduler {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Sleep in short slices so cancellation is observed promptly.
fn sleep_cancellable(total: Duration, cancel: &AtomicBool) {
    let slice = Duration::from_millis(10);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(slice);
        std::thread::sleep(step);
        remaining -= step;
    }
}
