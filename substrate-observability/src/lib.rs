//! # substrate-observability
//!
//! Tracing initialisation, span macros for the cycle and its stages, and
//! the telemetry bus that carries cycle reports, safety readings, and
//! lifecycle events to outside consumers.

pub mod telemetry;
pub mod tracing_setup;

pub use telemetry::{
    ChannelSink, CycleReport, NullSink, ReadingReport, TelemetryEvent, TelemetrySink, TracingSink,
};
pub use tracing_setup::init_tracing;
