//! Named defaults for every configuration field.

// Engine
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_STIMULI_PER_CYCLE: usize = 256;

// Activation
pub const DEFAULT_THRESHOLD_FLOOR: f64 = 0.1;
pub const DEFAULT_THRESHOLD_MAD_K: f64 = 2.0;
pub const DEFAULT_SPREAD_FRACTION: f64 = 0.5;
pub const DEFAULT_MAX_STRIDES_PER_NODE: usize = 8;
pub const DEFAULT_MIN_STRIDE_ENERGY: f64 = 1e-6;
pub const DEFAULT_WM_CAPACITY: usize = 7;
pub const DEFAULT_ENTITY_THRESHOLD_MAD_K: f64 = 1.0;
pub const DEFAULT_ENTITY_THRESHOLD_FLOOR: f64 = 1e-3;
pub const DEFAULT_SPILL_HOPS: usize = 1;
pub const DEFAULT_SPILL_DECAY: f64 = 0.25;
pub const DEFAULT_EMBEDDING_TOP_K: usize = 3;
pub const DEFAULT_MIN_COHORT_SIZE: usize = 3;

// Decay
pub const DEFAULT_BASE_ENERGY_DECAY_RATE: f64 = 0.000_02;
pub const DEFAULT_WEIGHT_DECAY_RATE: f64 = 0.000_001;
pub const DEFAULT_WEIGHT_DECAY_EVERY_N_CYCLES: u64 = 10;
pub const DEFAULT_DORMANT_WEIGHT: f64 = 1e-3;

// Learning
pub const DEFAULT_EMA_ALPHA: f64 = 0.1;
pub const DEFAULT_ETA_MIN: f64 = 0.01;
pub const DEFAULT_ETA_MAX: f64 = 0.95;
pub const DEFAULT_FIRST_UPDATE_ETA: f64 = 0.15;
pub const DEFAULT_GLOBAL_SHARE: f64 = 0.2;
pub const DEFAULT_OVERLAY_SHARE: f64 = 0.8;
pub const DEFAULT_OVERLAY_CAP: f64 = 2.0;

// Lifecycle
pub const DEFAULT_FUNCTIONAL_NEUTRAL_EMA: f64 = 0.5;
pub const DEFAULT_MIN_DISSOLUTION_AGE: u64 = 1_000;
pub const DEFAULT_MATURE_AGE: u64 = 100;
pub const DEFAULT_PROMOTION_STREAK: u32 = 10;
pub const DEFAULT_DISSOLUTION_STREAK: u32 = 20;
pub const DEFAULT_PROMOTE_Z: f64 = 1.0;
pub const DEFAULT_DISSOLVE_Z: f64 = 1.5;
pub const DEFAULT_FALLBACK_PROMOTE_QUALITY: f64 = 0.6;
pub const DEFAULT_FALLBACK_DISSOLVE_QUALITY: f64 = 0.2;
pub const DEFAULT_QUALITY_FLOOR: f64 = 0.01;

// Safety
pub const DEFAULT_REPETITION_WINDOW: usize = 5;
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;
pub const DEFAULT_GROWTH_WINDOW_SECS: i64 = 3_600;
pub const DEFAULT_GROWTH_FIT_MIN_SAMPLES: usize = 5;
pub const DEFAULT_GROWTH_FIT_MIN_SPAN_SECS: i64 = 600;
pub const DEFAULT_HUB_MAD_K: f64 = 3.0;
pub const DEFAULT_MECHANISM_WINDOW: usize = 20;
pub const DEFAULT_MECHANISM_MIN_RUNS: usize = 5;

// Storage
pub const DEFAULT_DB_PATH: &str = "substrate.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 1_024;
