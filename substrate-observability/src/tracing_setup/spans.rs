//! Span definitions per stage: cycle, mechanism, safety, commit.

/// Create a cycle span.
#[macro_export]
macro_rules! cycle_span {
    ($cycle:expr) => {
        tracing::info_span!("substrate.cycle", cycle = $cycle)
    };
}

/// Create a mechanism span.
#[macro_export]
macro_rules! mechanism_span {
    ($name:expr, $cycle:expr) => {
        tracing::info_span!("substrate.mechanism", mechanism = %$name, cycle = $cycle)
    };
}

/// Create a safety-evaluation span.
#[macro_export]
macro_rules! safety_span {
    ($cycle:expr) => {
        tracing::info_span!("substrate.safety", cycle = $cycle)
    };
}

/// Create a commit span.
#[macro_export]
macro_rules! commit_span {
    ($cycle:expr, $backend:expr) => {
        tracing::info_span!("substrate.commit", cycle = $cycle, backend = %$backend)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const CYCLE: &str = "substrate.cycle";
    pub const MECHANISM: &str = "substrate.mechanism";
    pub const SAFETY: &str = "substrate.safety";
    pub const COMMIT: &str = "substrate.commit";
}
