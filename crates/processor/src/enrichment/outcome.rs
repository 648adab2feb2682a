//! Result of enriching one raw event

use login_pipeline_types::EnrichedEvent;
use thiserror::Error;

/// Why an event produced no output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A required field was absent, null or empty. No state was touched.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Device type outside android/ios. Expected filtering, not a fault.
    #[error("filtered device type '{0}'")]
    FilteredDeviceType(String),

    /// Enrichment failed part way through. State updates made before the
    /// failure are kept.
    #[error("processing fault: {0}")]
    Fault(String),
}

impl DropReason {
    /// Whether the drop should be counted and reported as an error
    pub fn is_error(&self) -> bool {
        !matches!(self, DropReason::FilteredDeviceType(_))
    }
}

/// Outcome of [`EnrichmentEngine::enrich`](super::EnrichmentEngine::enrich)
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    Enriched(EnrichedEvent),
    Dropped(DropReason),
}

impl EnrichmentOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichmentOutcome::Enriched(_))
    }

    pub fn enriched(&self) -> Option<&EnrichedEvent> {
        match self {
            EnrichmentOutcome::Enriched(event) => Some(event),
            EnrichmentOutcome::Dropped(_) => None,
        }
    }

    pub fn into_enriched(self) -> Option<EnrichedEvent> {
        match self {
            EnrichmentOutcome::Enriched(event) => Some(event),
            EnrichmentOutcome::Dropped(_) => None,
        }
    }

    pub fn drop_reason(&self) -> Option<&DropReason> {
        match self {
            EnrichmentOutcome::Enriched(_) => None,
            EnrichmentOutcome::Dropped(reason) => Some(reason),
        }
    }
}
