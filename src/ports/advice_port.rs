//! Recommendation provider port trait.

use crate::domain::advice::Recommendation;
use crate::domain::error::TickwatchError;
use crate::domain::security::SecurityRecord;

/// External recommendation source. Consumes a record snapshot; the core
/// never validates or acts on the result beyond display. On failure the
/// caller substitutes [`Recommendation::neutral`].
pub trait AdvicePort {
    fn recommend(&self, record: &SecurityRecord) -> Result<Recommendation, TickwatchError>;
}
