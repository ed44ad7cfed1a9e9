//! Egress: events describing what each cycle did.

mod events;
mod sinks;

pub use events::{CycleReport, ReadingReport, TelemetryEvent};
pub use sinks::{ChannelSink, NullSink, TelemetrySink, TracingSink};
