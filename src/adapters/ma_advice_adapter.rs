//! Moving-average crossover advice adapter.
//!
//! A deliberately simple stand-in for an external recommendation service:
//! compares the short and long moving averages of the record it is handed.
//! Callers treat the output like any provider response and fall back to
//! [`Recommendation::neutral`] when unavailable.

use crate::domain::advice::{AdviceAction, Recommendation};
use crate::domain::error::TickwatchError;
use crate::domain::security::SecurityRecord;
use crate::ports::advice_port::AdvicePort;

pub struct MaAdviceAdapter;

impl MaAdviceAdapter {
    pub fn new() -> Self {
        MaAdviceAdapter
    }
}

impl Default for MaAdviceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvicePort for MaAdviceAdapter {
    fn recommend(&self, record: &SecurityRecord) -> Result<Recommendation, TickwatchError> {
        if record.ma5 == 0.0 || record.ma20 == 0.0 {
            return Err(TickwatchError::ProviderUnavailable {
                reason: format!("insufficient history for {}", record.symbol),
            });
        }

        let spread = (record.ma5 - record.ma20) / record.ma20 * 100.0;
        let confidence = (spread.abs() * 20.0).min(95.0) as u32;
        let technical = format!(
            "ma5 {:.2} vs ma20 {:.2} ({spread:+.2}%)",
            record.ma5, record.ma20
        );
        let fundamental = format!("{} ({})", record.name, record.industry);

        let recommendation = if spread > 0.5 {
            Recommendation::new(
                AdviceAction::Buy,
                confidence,
                "Short-term average above long-term average",
                &technical,
                &fundamental,
            )
        } else if spread < -0.5 {
            Recommendation::new(
                AdviceAction::Sell,
                confidence,
                "Short-term average below long-term average",
                &technical,
                &fundamental,
            )
        } else {
            Recommendation::new(
                AdviceAction::Hold,
                confidence.max(10),
                "Averages within neutral band",
                &technical,
                &fundamental,
            )
        };
        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_mas(ma5: f64, ma20: f64) -> SecurityRecord {
        let mut record = SecurityRecord::new("2330", "Taiwan Semiconductor", "Semiconductors");
        record.ma5 = ma5;
        record.ma20 = ma20;
        record
    }

    #[test]
    fn short_above_long_is_a_buy() {
        let adapter = MaAdviceAdapter::new();
        let rec = adapter.recommend(&record_with_mas(110.0, 100.0)).unwrap();
        assert_eq!(rec.action, AdviceAction::Buy);
        assert!(rec.confidence > 0);
    }

    #[test]
    fn short_below_long_is_a_sell() {
        let adapter = MaAdviceAdapter::new();
        let rec = adapter.recommend(&record_with_mas(90.0, 100.0)).unwrap();
        assert_eq!(rec.action, AdviceAction::Sell);
    }

    #[test]
    fn narrow_spread_is_a_hold() {
        let adapter = MaAdviceAdapter::new();
        let rec = adapter.recommend(&record_with_mas(100.2, 100.0)).unwrap();
        assert_eq!(rec.action, AdviceAction::Hold);
    }

    #[test]
    fn insufficient_history_is_unavailable() {
        let adapter = MaAdviceAdapter::new();
        let err = adapter.recommend(&record_with_mas(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, TickwatchError::ProviderUnavailable { .. }));
    }
}
