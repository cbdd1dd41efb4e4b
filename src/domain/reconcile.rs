//! Quote reconciliation: merging partial updates into a security record.
//!
//! `merge` is total. A degenerate update with every field absent still rolls
//! the history window at the unchanged price, so indicators stay live on a
//! stale feed.

use rand::Rng;

use super::security::{PartialQuote, SecurityRecord, HISTORY_WINDOW};

/// Maximum per-step perturbation of the synthetic seed walk (±2%).
const SEED_WALK_STEP: f64 = 0.02;

/// Round to 2 decimal places, the display precision for prices and averages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Simple moving average over the last `period` history entries, rounded to
/// 2 decimal places; 0 when the history is shorter than `period`.
pub fn moving_average(history: &std::collections::VecDeque<f64>, period: usize) -> f64 {
    if period == 0 || history.len() < period {
        return 0.0;
    }
    let sum: f64 = history.iter().rev().take(period).sum();
    round2(sum / period as f64)
}

/// Merge a partial quote into an existing record, using the thread RNG for
/// the synthetic seed when this is the record's first observation.
pub fn merge(record: &mut SecurityRecord, update: &PartialQuote) {
    merge_with_rng(record, update, &mut rand::thread_rng());
}

/// Merge with an injected RNG so the synthetic seed walk is reproducible.
///
/// Rules, in order:
/// 1. The effective price is the update's price if present, else unchanged.
/// 2. An empty history is seeded with a 30-point backward random walk ending
///    at the effective price and flagged synthetic; otherwise the effective
///    price is appended and the oldest entry dropped (FIFO, capacity 30).
/// 3. ma5/ma10/ma20 are recomputed from the post-update history.
/// 4. change / change_percent / open / high / low replace only when present.
/// 5. volume replaces only when present and nonzero.
/// 6. obv accumulates the update's volume (absent counts as 0). Down moves
///    add too; the simplified accumulator is kept on purpose.
pub fn merge_with_rng<R: Rng>(record: &mut SecurityRecord, update: &PartialQuote, rng: &mut R) {
    let price = update.price.unwrap_or(record.price);
    record.price = price;

    if record.history.is_empty() {
        record.history = seed_history(price, rng);
        record.synthetic_history = true;
    } else {
        record.history.push_back(price);
        while record.history.len() > HISTORY_WINDOW {
            record.history.pop_front();
        }
    }

    record.ma5 = moving_average(&record.history, 5);
    record.ma10 = moving_average(&record.history, 10);
    record.ma20 = moving_average(&record.history, 20);

    if let Some(change) = update.change {
        record.change = change;
    }
    if let Some(change_percent) = update.change_percent {
        record.change_percent = change_percent;
    }
    if let Some(open) = update.open {
        record.open = open;
    }
    if let Some(high) = update.high {
        record.high = high;
    }
    if let Some(low) = update.low {
        record.low = low;
    }
    match update.volume {
        Some(volume) if volume != 0 => record.volume = volume,
        _ => {}
    }

    record.obv += update.volume.unwrap_or(0);
}

/// Synthesize a full backward random walk ending at `price`.
///
/// Presentation seed only: gives a fresh record a plausible-looking chart
/// until real quotes fill the window. Callers can tell it apart from observed
/// history via [`SecurityRecord::synthetic_history`].
fn seed_history<R: Rng>(price: f64, rng: &mut R) -> std::collections::VecDeque<f64> {
    let mut walk = Vec::with_capacity(HISTORY_WINDOW);
    let mut point = price;
    walk.push(point);
    for _ in 1..HISTORY_WINDOW {
        let step = rng.gen_range(-SEED_WALK_STEP..=SEED_WALK_STEP);
        point = round2(point * (1.0 - step));
        walk.push(point);
    }
    walk.reverse();
    walk.into()
}
