//! Recommendation consumption contract.
//!
//! The decision logic lives behind [`crate::ports::advice_port::AdvicePort`];
//! the core only defines the shape it consumes and the neutral fallback used
//! when the provider is unavailable.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for AdviceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdviceAction::Buy => write!(f, "BUY"),
            AdviceAction::Sell => write!(f, "SELL"),
            AdviceAction::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub action: AdviceAction,
    /// 0..=100, clamped on construction.
    pub confidence: u8,
    pub summary: String,
    pub technical_note: String,
    pub fundamental_note: String,
}

impl Recommendation {
    pub fn new(
        action: AdviceAction,
        confidence: u32,
        summary: &str,
        technical_note: &str,
        fundamental_note: &str,
    ) -> Self {
        Recommendation {
            action,
            confidence: confidence.min(100) as u8,
            summary: summary.to_string(),
            technical_note: technical_note.to_string(),
            fundamental_note: fundamental_note.to_string(),
        }
    }

    /// The substitute shown when the recommendation provider fails: hold,
    /// zero confidence, explanatory text. Never a crash.
    pub fn neutral(reason: &str) -> Self {
        Recommendation::new(
            AdviceAction::Hold,
            0,
            "No recommendation available",
            reason,
            "Recommendation provider unavailable; displaying neutral fallback.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_to_100() {
        let rec = Recommendation::new(AdviceAction::Buy, 250, "s", "t", "f");
        assert_eq!(rec.confidence, 100);
    }

    #[test]
    fn neutral_fallback_is_hold_with_zero_confidence() {
        let rec = Recommendation::neutral("provider timed out");
        assert_eq!(rec.action, AdviceAction::Hold);
        assert_eq!(rec.confidence, 0);
        assert!(rec.technical_note.contains("timed out"));
    }
}
