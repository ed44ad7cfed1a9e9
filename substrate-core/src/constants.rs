/// Substrate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deltas fed into the reinforcement EMA for each usefulness level.
pub const MARK_VERY_USEFUL: f64 = 3.0;
pub const MARK_USEFUL: f64 = 2.0;
pub const MARK_SOMEWHAT_USEFUL: f64 = 1.0;
pub const MARK_NOT_USEFUL: f64 = -1.0;
pub const MARK_MISLEADING: f64 = -3.0;

/// Maximum hop count accepted by neighbourhood queries.
pub const MAX_NEIGHBORHOOD_HOPS: usize = 16;

/// Maximum batch size for a single backend write.
pub const MAX_COMMIT_BATCH_SIZE: usize = 10_000;

/// Property keys holding JSON blobs.
pub const BLOB_ENTITY_ACTIVATIONS: &str = "entity_activations";
pub const BLOB_ENTITY_EMOTIONS: &str = "entity_emotions";
pub const BLOB_ATTRIBUTES: &str = "attributes";
pub const BLOB_WEIGHT_OVERLAYS: &str = "log_weight_overlays";

/// Property key holding the native vector.
pub const VECTOR_EMBEDDING: &str = "embedding";
pub const VECTOR_CENTROID: &str = "centroid";
