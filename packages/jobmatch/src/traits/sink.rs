//! Activity event sink.

use tracing::{error, info, warn};

use crate::types::{ActivityEvent, EventKind};

/// Fire-and-forget consumer of activity events.
///
/// Events arrive in causal order; implementations must not reorder or batch
/// them, since the host's activity feed and counters depend on ordering.
pub trait ActivitySink: Send + Sync {
    fn emit(&self, event: ActivityEvent);
}

/// Default sink that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ActivitySink for TracingSink {
    fn emit(&self, event: ActivityEvent) {
        match event.kind {
            EventKind::Error => error!(
                job_title = event.job_title.as_deref(),
                "{}", event.message
            ),
            EventKind::Skip => warn!(
                job_title = event.job_title.as_deref(),
                match_score = event.match_score,
                "{}", event.message
            ),
            _ => info!(
                job_title = event.job_title.as_deref(),
                match_score = event.match_score,
                "{}", event.message
            ),
        }
    }
}
