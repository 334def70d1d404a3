//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod profile;

pub use profile::ProfileState;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles
    type Event;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> &str;

    /// Apply an event to update the aggregate state
    ///
    /// Callers must apply events in strictly increasing order; the aggregate
    /// does not check it.
    fn apply(self, event: &Self::Event) -> Self;

    /// Fold an ordered event sequence onto this state
    fn fold<'a, I>(self, events: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events.into_iter().fold(self, |state, event| state.apply(event))
    }
}
