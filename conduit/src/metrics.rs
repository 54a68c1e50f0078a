//! Metrics definitions for channel coordination.
//!
//! Metrics are recorded through the [`metrics`] facade; installing a recorder is left to
//! the binary embedding this crate.

/// Label for the generator label in metrics.
pub const GENERATOR_LABEL: &str = "generator";

/// Counter for messages handed to a consumer by a generator.
pub const CONDUIT_MESSAGES_EMITTED_TOTAL: &str = "conduit_messages_emitted_total";

/// Counter for messages forwarded by fan-in tasks.
pub const CONDUIT_MESSAGES_FORWARDED_TOTAL: &str = "conduit_messages_forwarded_total";

/// Counter for generators that reached the stopped state.
pub const CONDUIT_GENERATORS_STOPPED_TOTAL: &str = "conduit_generators_stopped_total";

/// Counter for deadline guards that reported a timeout.
pub const CONDUIT_DEADLINE_TIMEOUTS_TOTAL: &str = "conduit_deadline_timeouts_total";
