mod codec_error;
mod mechanism_error;
mod safety_error;
mod storage_error;
mod substrate_error;
mod temporal_error;
mod trace_error;

pub use codec_error::CodecError;
pub use mechanism_error::MechanismError;
pub use safety_error::SafetyError;
pub use storage_error::StorageError;
pub use substrate_error::{SubstrateError, SubstrateResult};
pub use temporal_error::TemporalError;
pub use trace_error::TraceError;
