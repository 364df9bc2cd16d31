//! Metric names used by the store.
//!
//! The runtime only records through the `metrics` facade. Nothing is exported
//! unless the host application installs a recorder; [`describe_metrics`]
//! registers descriptions with whichever recorder is active.

use metrics::{Unit, describe_counter};

/// Metric name constants
pub mod names {
    /// Actions reduced by the store
    pub const ACTIONS_TOTAL: &str = "store.actions.total";
    /// Actions rejected because the store was closed
    pub const ACTIONS_REJECTED: &str = "store.actions.rejected";
    /// Effect results dropped because they arrived after close
    pub const ACTIONS_DISCARDED: &str = "store.actions.discarded";
    /// Effects executed, labelled by `type`
    pub const EFFECTS_EXECUTED: &str = "store.effects.executed";
}

/// Register descriptions for all store metrics
pub fn describe_metrics() {
    describe_counter!(names::ACTIONS_TOTAL, Unit::Count, "Actions reduced by the store");
    describe_counter!(
        names::ACTIONS_REJECTED,
        Unit::Count,
        "Actions rejected because the store was closed"
    );
    describe_counter!(
        names::ACTIONS_DISCARDED,
        Unit::Count,
        "Effect results dropped because they arrived after the store was closed"
    );
    describe_counter!(
        names::EFFECTS_EXECUTED,
        Unit::Count,
        "Effects executed by the store, by effect type"
    );
}
